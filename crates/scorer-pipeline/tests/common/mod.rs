//! 통합 테스트용 가짜 분석기와 소스.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use scorer_core::{
    AnalysisOutcome, Analyzer, FactorScores, FailureKind, NewsItem, ScorerResult, SkipReason,
    StockCode,
};
use scorer_pipeline::{InMemorySource, NewsSource, NewsStream};

type DelayFn = Box<dyn Fn(&NewsItem) -> Duration + Send + Sync>;

/// 동시 실행 수와 제출 순서를 기록하는 가짜 분석기.
pub struct FakeAnalyzer {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    submitted: Mutex<Vec<String>>,
    failing: HashSet<String>,
    delay: DelayFn,
    gate: Option<watch::Receiver<bool>>,
}

impl FakeAnalyzer {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            delay: Box::new(|_| Duration::from_millis(10)),
            gate: None,
        }
    }

    pub fn with_delay(mut self, delay: impl Fn(&NewsItem) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// 지정한 ID는 재시도 소진 실패로 응답.
    pub fn failing(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// 게이트가 열릴 때까지 모든 호출을 붙잡아 둡니다.
    pub fn gated(mut self, gate: watch::Receiver<bool>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    /// 제출된 순서대로 `종목/ID`.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn submit(&self, item: &NewsItem) -> AnalysisOutcome {
        if item.is_blank() {
            return AnalysisOutcome::Skipped {
                reason: SkipReason::EmptyContent,
            };
        }

        self.submitted
            .lock()
            .unwrap()
            .push(format!("{}/{}", item.stock_code, item.id));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }
        tokio::time::sleep((self.delay)(item)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&item.id) {
            AnalysisOutcome::failed(FailureKind::RateLimited, 3, "429 Too Many Requests")
        } else {
            AnalysisOutcome::Success {
                scores: FactorScores::default(),
            }
        }
    }
}

/// `{code}-{i}` ID를 가진 항목 `n`개.
pub fn items(code: &str, n: usize) -> Vec<NewsItem> {
    (0..n)
        .map(|i| {
            NewsItem::new(StockCode::from(code), format!("{}-{}", code, i), "公司公告内容")
                .with_title(format!("新闻 {}", i))
        })
        .collect()
}

pub fn codes(list: &[&str]) -> Vec<StockCode> {
    list.iter().map(|c| StockCode::from(*c)).collect()
}

/// fetch 호출 횟수를 세고, 지정한 종목은 열기나 읽기 도중에 실패하는 소스.
pub struct CountingSource {
    inner: InMemorySource,
    fetches: AtomicUsize,
    broken: HashSet<StockCode>,
    fails_after: HashMap<StockCode, usize>,
}

impl CountingSource {
    pub fn new(inner: InMemorySource) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
            broken: HashSet::new(),
            fails_after: HashMap::new(),
        }
    }

    pub fn broken(mut self, code: &str) -> Self {
        self.broken.insert(StockCode::from(code));
        self
    }

    /// `n`개 항목을 내보낸 뒤 스트림 에러.
    pub fn fails_after(mut self, code: &str, n: usize) -> Self {
        self.fails_after.insert(StockCode::from(code), n);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for CountingSource {
    fn name(&self) -> &str {
        "counting"
    }

    async fn fetch(&self, stock_code: &StockCode) -> ScorerResult<NewsStream> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(stock_code) {
            return Err(scorer_core::ScorerError::source(stock_code, "연결 실패"));
        }
        let inner = self.inner.fetch(stock_code).await?;
        match self.fails_after.get(stock_code) {
            Some(&n) => {
                let error = scorer_core::ScorerError::source(stock_code, "읽기 도중 연결 끊김");
                Ok(inner.take(n).chain(stream::once(async move { Err(error) })).boxed())
            }
            None => Ok(inner),
        }
    }
}
