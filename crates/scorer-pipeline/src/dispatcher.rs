//! 작업 분배기.
//!
//! 뉴스 스트림에서 항목을 하나씩 꺼내 분석기에 제출합니다.
//! - 동시 실행 수는 공유 세마포어로 제한합니다 (슬롯이 비어야 다음 항목을 꺼냄).
//! - PROCESS_NUM 예산이 소진되면 더 이상 항목을 꺼내지 않습니다.
//! - 취소되면 새 항목을 분배하지 않지만, 이미 실행 중인 호출은 끝까지 기다립니다.
//!
//! 완료된 결과는 완료 순서대로 [`DispatchEvent`] 채널에 전달됩니다.

use futures::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use scorer_core::{
    AnalysisOutcome, Analyzer, FailureKind, NewsItem, ReportStatus, ScorerError, StockCode,
};

use crate::budget::DispatchBudget;
use crate::source::NewsStream;

/// 완료된 분석 한 건.
#[derive(Debug)]
pub struct Completion {
    pub stock_code: StockCode,
    /// 종목 내 분배 순번 (0부터)
    pub seq: u64,
    pub item: NewsItem,
    pub outcome: AnalysisOutcome,
}

/// 종목 분배 종료 사유.
#[derive(Debug)]
pub enum SourceEnd {
    /// 정상 종료 (소진/예산 도달/취소)
    Finished(ReportStatus),
    /// 소스 에러 (해당 종목에만 적용)
    Failed(ScorerError),
}

/// 분배기가 집계 측에 보내는 이벤트.
#[derive(Debug)]
pub enum DispatchEvent {
    /// 분석 완료
    Completed(Completion),
    /// 종목 분배 종료. `dispatched`건의 결과가 모두 도착하면 확정할 수 있습니다.
    SourceClosed {
        stock_code: StockCode,
        dispatched: usize,
        end: SourceEnd,
    },
}

/// 작업 분배기.
///
/// 분배기와 실행 중인 작업이 모두 drop되면 이벤트 채널이 닫힙니다.
pub struct Dispatcher {
    analyzer: Arc<dyn Analyzer>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<DispatchEvent>,
}

impl Dispatcher {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        concurrency: usize,
        cancel: CancellationToken,
        events: mpsc::UnboundedSender<DispatchEvent>,
    ) -> Self {
        Self {
            analyzer,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
            events,
        }
    }

    /// 종목 하나의 스트림을 분배하고 분배한 항목 수를 반환합니다.
    ///
    /// 종료 시 [`DispatchEvent::SourceClosed`]를 보냅니다. 스트림은 반환 시 drop됩니다.
    pub async fn dispatch(
        &self,
        stock_code: &StockCode,
        mut stream: NewsStream,
        budget: &DispatchBudget,
    ) -> usize {
        let mut seq: u64 = 0;

        let end = loop {
            if self.cancel.is_cancelled() {
                break SourceEnd::Finished(ReportStatus::Cancelled);
            }
            if budget.is_exhausted() {
                break self.end_at_budget(stock_code, &mut stream).await;
            }

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break SourceEnd::Finished(ReportStatus::Cancelled),
                permit = self.permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break SourceEnd::Finished(ReportStatus::Cancelled),
                },
            };

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break SourceEnd::Finished(ReportStatus::Cancelled),
                next = stream.next() => next,
            };

            let item = match next {
                None => break SourceEnd::Finished(ReportStatus::SourceExhausted),
                Some(Err(e)) => {
                    warn!(stock_code = %stock_code, error = %e, "뉴스 소스 에러, 분배 중단");
                    break SourceEnd::Failed(e);
                }
                Some(Ok(item)) => item,
            };

            if !budget.try_acquire() {
                break SourceEnd::Finished(ReportStatus::BudgetCapped);
            }

            debug!(stock_code = %stock_code, item_id = %item.id, seq, "항목 분배");
            self.spawn(stock_code.clone(), seq, item, permit);
            seq += 1;
        };

        let dispatched = seq as usize;
        info!(
            stock_code = %stock_code,
            dispatched,
            remaining_budget = budget.remaining(),
            end = ?end,
            "종목 분배 종료"
        );
        self.close(stock_code, dispatched, end);
        dispatched
    }

    /// 예산이 소진된 시점에 소스에 남은 항목이 있는지 한 번 더 확인합니다.
    ///
    /// 꺼낸 항목은 분배하지 않고 버립니다.
    async fn end_at_budget(&self, stock_code: &StockCode, stream: &mut NewsStream) -> SourceEnd {
        let next = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return SourceEnd::Finished(ReportStatus::Cancelled),
            next = stream.next() => next,
        };

        match next {
            None => SourceEnd::Finished(ReportStatus::SourceExhausted),
            Some(_) => {
                debug!(stock_code = %stock_code, "예산 소진, 남은 항목 분배 안 함");
                SourceEnd::Finished(ReportStatus::BudgetCapped)
            }
        }
    }

    /// 분배 없이 종목을 닫습니다 (소스를 열지 못했거나 도달하지 않은 종목).
    pub fn close(&self, stock_code: &StockCode, dispatched: usize, end: SourceEnd) {
        let _ = self.events.send(DispatchEvent::SourceClosed {
            stock_code: stock_code.clone(),
            dispatched,
            end,
        });
    }

    fn spawn(&self, stock_code: StockCode, seq: u64, item: NewsItem, permit: OwnedSemaphorePermit) {
        let analyzer = self.analyzer.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(analyzer.submit(&item)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(stock_code = %stock_code, item_id = %item.id, "분석기 패닉");
                    AnalysisOutcome::failed(FailureKind::Transient, 0, "analyzer panicked")
                }
            };
            drop(permit);

            let _ = events.send(DispatchEvent::Completed(Completion {
                stock_code,
                seq,
                item,
                outcome,
            }));
        });
    }
}
