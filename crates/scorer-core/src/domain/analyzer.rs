//! 뉴스 분석기 trait.

use async_trait::async_trait;

use super::{AnalysisOutcome, NewsItem};

/// 뉴스 한 건을 분석해 결과를 반환하는 분석기.
///
/// 구현체는 재시도와 요청 한도 준수를 내부에서 처리하며, 어떤 경우에도
/// 정확히 하나의 [`AnalysisOutcome`]을 반환해야 합니다. 여러 작업 슬롯에서
/// 동시에 호출될 수 있습니다.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// 뉴스 항목 분석.
    async fn submit(&self, item: &NewsItem) -> AnalysisOutcome;
}
