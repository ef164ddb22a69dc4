//! 메모리 기반 뉴스 소스.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;

use scorer_core::{NewsItem, ScorerResult, StockCode};

use super::{NewsSource, NewsStream};

/// 미리 준비된 항목을 돌려주는 뉴스 소스.
///
/// 등록되지 않은 종목은 빈 스트림을 반환합니다.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    items: HashMap<StockCode, Vec<NewsItem>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목의 항목 목록 설정 (기존 목록 대체).
    pub fn with_items(mut self, stock_code: impl Into<StockCode>, items: Vec<NewsItem>) -> Self {
        self.items.insert(stock_code.into(), items);
        self
    }

    /// 항목 하나 추가.
    pub fn push(&mut self, item: NewsItem) {
        self.items
            .entry(item.stock_code.clone())
            .or_default()
            .push(item);
    }

    /// 등록된 종목의 항목 수.
    pub fn len_of(&self, stock_code: &StockCode) -> usize {
        self.items.get(stock_code).map_or(0, Vec::len)
    }
}

#[async_trait]
impl NewsSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, stock_code: &StockCode) -> ScorerResult<NewsStream> {
        let items = self.items.get(stock_code).cloned().unwrap_or_default();
        Ok(futures::stream::iter(items.into_iter().map(Ok)).boxed())
    }
}
