//! 뉴스 소스.
//!
//! 종목 코드마다 유한한 뉴스 스트림을 제공합니다. 소비자는 스트림을 끝까지
//! 읽지 않고 drop해도 되며, 이는 정상적인 조기 종료로 취급됩니다.

mod json_dir;
mod memory;

pub use json_dir::JsonDirectorySource;
pub use memory::InMemorySource;

use async_trait::async_trait;
use futures::stream::BoxStream;

use scorer_core::{NewsItem, ScorerResult, StockCode};

/// 종목 하나의 뉴스 스트림.
///
/// 스트림 중간의 `Err`는 해당 종목의 소스 에러이며, 이후 항목은 분배되지 않습니다.
pub type NewsStream = BoxStream<'static, ScorerResult<NewsItem>>;

/// 뉴스 소스 trait.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// 소스 이름 (로깅용).
    fn name(&self) -> &str;

    /// 종목의 뉴스 스트림을 엽니다.
    ///
    /// # Errors
    /// 소스를 열 수 없으면 해당 종목 범위의 `ScorerError::Source`를 반환합니다.
    async fn fetch(&self, stock_code: &StockCode) -> ScorerResult<NewsStream>;
}
