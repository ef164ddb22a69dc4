//! 결과 집계기.
//!
//! 완료 순서와 무관하게 도착한 (항목, 결과) 쌍을 종목별로 모으고, 확정 시
//! 분배 순번 오름차순으로 정렬된 [`StockReport`]를 만듭니다.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error};

use scorer_core::{
    AnalysisOutcome, NewsItem, OutcomeSummary, ReportEntry, ReportStatus, ScorerError,
    ScorerResult, StockCode, StockReport,
};

/// 확정 전 종목별 누적 상태.
#[derive(Debug, Default)]
struct PendingReport {
    stock_name: Option<String>,
    entries: Vec<ReportEntry>,
    seen: HashSet<String>,
    /// 중복 기록을 포함한 전체 수신 건수
    received: usize,
    /// 첫 번째로 발견된 중복 항목 ID
    duplicate: Option<String>,
}

/// 종목별 결과 집계기.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    pending: HashMap<StockCode, PendingReport>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 결과 하나를 기록합니다.
    ///
    /// # Errors
    /// 같은 종목에 같은 항목 ID가 이미 기록되어 있으면 `DuplicateItem`을 반환하고,
    /// 기존 기록은 유지한 채 해당 종목을 정상 확정 불가 상태로 표시합니다.
    pub fn record(
        &mut self,
        stock_code: &StockCode,
        seq: u64,
        item: &NewsItem,
        outcome: AnalysisOutcome,
    ) -> ScorerResult<()> {
        let pending = self.pending.entry(stock_code.clone()).or_default();
        pending.received += 1;

        if !pending.seen.insert(item.id.clone()) {
            error!(stock_code = %stock_code, item_id = %item.id, seq, "중복 항목 기록 시도");
            pending.duplicate.get_or_insert_with(|| item.id.clone());
            return Err(ScorerError::DuplicateItem {
                stock_code: stock_code.clone(),
                item_id: item.id.clone(),
            });
        }

        if pending.stock_name.is_none() {
            pending.stock_name = item.stock_name.clone();
        }

        debug!(stock_code = %stock_code, item_id = %item.id, seq, "결과 기록");
        pending.entries.push(ReportEntry {
            seq,
            item_id: item.id.clone(),
            pub_time: item.pub_time.clone(),
            outcome,
        });
        Ok(())
    }

    /// 종목의 수신 건수 (중복 포함).
    pub fn received(&self, stock_code: &StockCode) -> usize {
        self.pending.get(stock_code).map_or(0, |p| p.received)
    }

    /// 확정하지 않고 종목의 누적 상태를 버립니다.
    pub fn discard(&mut self, stock_code: &StockCode) {
        self.pending.remove(stock_code);
    }

    /// 종목 리포트를 확정합니다. 확정된 종목의 누적 상태는 제거됩니다.
    ///
    /// # Errors
    /// 중복 기록이 있었던 종목은 `DuplicateItem`을 반환합니다.
    pub fn finalize(
        &mut self,
        stock_code: &StockCode,
        status: ReportStatus,
    ) -> ScorerResult<StockReport> {
        let pending = self.pending.remove(stock_code).unwrap_or_default();

        if let Some(item_id) = pending.duplicate {
            return Err(ScorerError::DuplicateItem {
                stock_code: stock_code.clone(),
                item_id,
            });
        }

        let mut entries = pending.entries;
        entries.sort_by_key(|e| e.seq);

        let mut summary = OutcomeSummary::default();
        for entry in &entries {
            summary.add(&entry.outcome);
        }

        Ok(StockReport {
            stock_code: stock_code.clone(),
            stock_name: pending.stock_name,
            status,
            entries,
            summary,
            finalized_at: Utc::now(),
            source_error: None,
        })
    }
}
