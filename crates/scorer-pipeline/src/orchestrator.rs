//! 실행 오케스트레이터.
//!
//! 설정된 순서대로 종목마다 뉴스 소스를 열어 분배기에 넘기고, 완료 이벤트를
//! 동시에 집계하여 종목별 리포트를 확정합니다.
//!
//! # 실행 단계
//!
//! ```text
//! Idle ──> Dispatching ──> Draining ──> Finalized
//! ```
//!
//! - `Dispatching`: 항목을 꺼내 제출하는 중
//! - `Draining`: 분배는 끝났고 실행 중인 호출의 완료를 기다리는 중
//! - `Finalized`: 모든 결과가 기록되고 리포트가 확정됨

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use scorer_core::{
    Analyzer, BudgetScope, PipelineConfig, ReportStatus, RunConfig, ScorerError, ScorerResult,
    StockCode, StockReport,
};
use scorer_llm::ApiClient;

use crate::aggregator::ResultAggregator;
use crate::budget::DispatchBudget;
use crate::dispatcher::{DispatchEvent, Dispatcher, SourceEnd};
use crate::source::NewsSource;
use crate::stats::RunStats;

/// 실행 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Dispatching,
    Draining,
    Finalized,
}

/// 종목 하나의 최종 결과.
#[derive(Debug)]
pub struct StockResult {
    pub stock_code: StockCode,
    /// 확정된 리포트, 또는 해당 종목에만 적용되는 에러
    pub report: ScorerResult<StockReport>,
}

/// 실행 결과.
#[derive(Debug)]
pub struct RunReport {
    /// 설정 순서대로 정렬된 종목별 결과
    pub results: Vec<StockResult>,
    pub stats: RunStats,
    /// 취소 신호로 조기 종료되었는지 여부
    pub cancelled: bool,
}

impl RunReport {
    /// 정상 확정된 리포트.
    pub fn reports(&self) -> impl Iterator<Item = &StockReport> {
        self.results.iter().filter_map(|r| r.report.as_ref().ok())
    }

    /// 종목 단위 에러.
    pub fn errors(&self) -> impl Iterator<Item = (&StockCode, &ScorerError)> {
        self.results
            .iter()
            .filter_map(|r| r.report.as_ref().err().map(|e| (&r.stock_code, e)))
    }

    /// 종목 코드로 결과 조회.
    pub fn get(&self, stock_code: &str) -> Option<&StockResult> {
        self.results
            .iter()
            .find(|r| r.stock_code.as_str() == stock_code)
    }
}

/// 실행 오케스트레이터.
pub struct Orchestrator {
    analyzer: Arc<dyn Analyzer>,
    source: Arc<dyn NewsSource>,
    pipeline: PipelineConfig,
    cancel: CancellationToken,
    phase: watch::Sender<RunPhase>,
}

impl Orchestrator {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        source: Arc<dyn NewsSource>,
        pipeline: PipelineConfig,
    ) -> Self {
        let (phase, _) = watch::channel(RunPhase::Idle);
        Self {
            analyzer,
            source,
            pipeline,
            cancel: CancellationToken::new(),
            phase,
        }
    }

    /// 전체 설정으로 오케스트레이터를 구성합니다.
    ///
    /// # Errors
    /// 자격증명 누락 등 설정 에러가 있으면 어떤 작업도 시작하지 않고 `ScorerError::Config`를 반환합니다.
    pub fn from_config(config: &RunConfig, source: Arc<dyn NewsSource>) -> ScorerResult<Self> {
        config.validate()?;
        let client = ApiClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), source, config.pipeline.clone()))
    }

    /// 외부 취소 토큰 사용.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 실행 단계 변화를 구독합니다.
    pub fn subscribe(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> RunPhase {
        *self.phase.borrow()
    }

    fn set_phase(&self, phase: RunPhase) {
        info!(phase = ?phase, "실행 단계 전환");
        self.phase.send_replace(phase);
    }

    /// 전체 실행.
    ///
    /// # Errors
    /// 설정 에러만 반환합니다. 항목 실패나 종목 단위 에러는 [`RunReport`]에 담깁니다.
    pub async fn run(&self) -> ScorerResult<RunReport> {
        self.pipeline.validate()?;
        let limit = self.pipeline.process_limit()?;
        let codes = self.pipeline.unique_codes();
        let started = Instant::now();

        info!(
            source = self.source.name(),
            codes = codes.len(),
            process_num = limit,
            budget_scope = ?self.pipeline.budget_scope,
            concurrency = self.pipeline.concurrency,
            "실행 시작"
        );
        self.set_phase(RunPhase::Dispatching);

        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(
            self.analyzer.clone(),
            self.pipeline.concurrency,
            self.cancel.clone(),
            tx,
        );

        let (dispatched, mut settled) =
            tokio::join!(self.dispatch_all(dispatcher, &codes, limit), collect(rx));

        let results: Vec<StockResult> = codes
            .iter()
            .map(|code| StockResult {
                stock_code: code.clone(),
                report: settled
                    .remove(code)
                    .unwrap_or_else(|| Ok(StockReport::empty(code.clone(), ReportStatus::Cancelled))),
            })
            .collect();

        let mut stats = RunStats {
            codes: codes.len(),
            dispatched,
            elapsed: started.elapsed(),
            ..Default::default()
        };
        for result in &results {
            match &result.report {
                Ok(report) => {
                    stats.succeeded += report.summary.succeeded;
                    stats.failed += report.summary.failed;
                    stats.skipped += report.summary.skipped;
                }
                Err(_) => stats.code_errors += 1,
            }
        }

        self.set_phase(RunPhase::Finalized);

        Ok(RunReport {
            results,
            stats,
            cancelled: self.cancel.is_cancelled(),
        })
    }

    /// 종목 순서대로 분배하고, 끝나면 `Draining`으로 전환합니다.
    async fn dispatch_all(&self, dispatcher: Dispatcher, codes: &[StockCode], limit: usize) -> usize {
        let global = DispatchBudget::new(limit);
        let mut total = 0;

        for code in codes {
            let per_stock;
            let budget = match self.pipeline.budget_scope {
                BudgetScope::Global => &global,
                BudgetScope::PerStock => {
                    per_stock = DispatchBudget::new(limit);
                    &per_stock
                }
            };

            if self.cancel.is_cancelled() {
                dispatcher.close(code, 0, SourceEnd::Finished(ReportStatus::Cancelled));
                continue;
            }
            if budget.is_exhausted() {
                dispatcher.close(code, 0, SourceEnd::Finished(ReportStatus::BudgetCapped));
                continue;
            }

            match self.source.fetch(code).await {
                Ok(stream) => total += dispatcher.dispatch(code, stream, budget).await,
                Err(e) => {
                    warn!(stock_code = %code, error = %e, "뉴스 소스 열기 실패");
                    dispatcher.close(code, 0, SourceEnd::Failed(e));
                }
            }
        }

        drop(dispatcher);
        self.set_phase(RunPhase::Draining);
        total
    }
}

/// 이벤트 채널이 닫힐 때까지 결과를 집계하고, 종목별로 확정 가능해지는 즉시 확정합니다.
async fn collect(
    mut rx: mpsc::UnboundedReceiver<DispatchEvent>,
) -> HashMap<StockCode, ScorerResult<StockReport>> {
    let mut aggregator = ResultAggregator::new();
    let mut closed: HashMap<StockCode, (usize, SourceEnd)> = HashMap::new();
    let mut settled = HashMap::new();

    while let Some(event) = rx.recv().await {
        let code = match event {
            DispatchEvent::Completed(done) => {
                if let Err(e) =
                    aggregator.record(&done.stock_code, done.seq, &done.item, done.outcome)
                {
                    warn!(error = %e, "결과 기록 거부");
                }
                done.stock_code
            }
            DispatchEvent::SourceClosed {
                stock_code,
                dispatched,
                end,
            } => {
                closed.insert(stock_code.clone(), (dispatched, end));
                stock_code
            }
        };

        let ready = closed
            .get(&code)
            .is_some_and(|(dispatched, _)| aggregator.received(&code) >= *dispatched);
        if ready {
            if let Some((_, end)) = closed.remove(&code) {
                let result = settle(&mut aggregator, &code, end);
                settled.insert(code, result);
            }
        }
    }

    // 채널이 닫히면 더 이상 도착할 결과가 없음
    for (code, (_, end)) in closed {
        let result = settle(&mut aggregator, &code, end);
        settled.insert(code, result);
    }

    settled
}

fn settle(
    aggregator: &mut ResultAggregator,
    stock_code: &StockCode,
    end: SourceEnd,
) -> ScorerResult<StockReport> {
    let result = match end {
        SourceEnd::Finished(status) => aggregator.finalize(stock_code, status),
        // 실패 전에 분배된 결과가 있으면 부분 리포트로 보존
        SourceEnd::Failed(err) if aggregator.received(stock_code) > 0 => aggregator
            .finalize(stock_code, ReportStatus::SourceFailed)
            .map(|report| report.with_source_error(err.to_string())),
        SourceEnd::Failed(err) => {
            aggregator.discard(stock_code);
            Err(err)
        }
    };

    match &result {
        Ok(report) if report.status == ReportStatus::SourceFailed => warn!(
            stock_code = %stock_code,
            recorded = report.entries.len(),
            error = report.source_error.as_deref().unwrap_or_default(),
            "뉴스 소스 실패, 부분 리포트 확정"
        ),
        Ok(report) => info!(
            stock_code = %stock_code,
            status = ?report.status,
            succeeded = report.summary.succeeded,
            failed = report.summary.failed,
            skipped = report.summary.skipped,
            "종목 리포트 확정"
        ),
        Err(e) => warn!(stock_code = %stock_code, error = %e, "종목 리포트 확정 실패"),
    }
    result
}
