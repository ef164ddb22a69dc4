//! 종목별 분석 리포트.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AnalysisOutcome;
use crate::StockCode;

/// 리포트가 확정된 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// 뉴스 소스를 끝까지 처리함
    SourceExhausted,
    /// PROCESS_NUM 한도에 도달해 분배를 중단함
    BudgetCapped,
    /// 취소되어 일부만 처리됨 (미완료)
    Cancelled,
    /// 뉴스 소스가 도중에 실패함. 실패 전까지 분배된 항목만 포함 (미완료)
    SourceFailed,
}

/// 리포트 항목 하나.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// 분배 순번
    pub seq: u64,
    /// 뉴스 항목 ID
    pub item_id: String,
    /// 게시 시각
    pub pub_time: Option<String>,
    /// 분석 결과
    pub outcome: AnalysisOutcome,
}

/// 결과 유형별 건수.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeSummary {
    /// 결과 하나를 집계에 반영.
    pub fn add(&mut self, outcome: &AnalysisOutcome) {
        match outcome {
            AnalysisOutcome::Success { .. } => self.succeeded += 1,
            AnalysisOutcome::Failed { .. } => self.failed += 1,
            AnalysisOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// 전체 건수.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// 종목 하나에 대한 최종 리포트.
///
/// `entries`는 완료 순서가 아니라 분배 순번(`seq`) 오름차순으로 정렬되어 있습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReport {
    pub stock_code: StockCode,
    pub stock_name: Option<String>,
    pub status: ReportStatus,
    pub entries: Vec<ReportEntry>,
    pub summary: OutcomeSummary,
    pub finalized_at: DateTime<Utc>,
    /// `SourceFailed`일 때 소스 에러 메시지
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
}

impl StockReport {
    /// 처리된 항목이 없는 리포트 생성.
    pub fn empty(stock_code: StockCode, status: ReportStatus) -> Self {
        Self {
            stock_code,
            stock_name: None,
            status,
            entries: Vec::new(),
            summary: OutcomeSummary::default(),
            finalized_at: Utc::now(),
            source_error: None,
        }
    }

    /// 소스 실패로 중단된 리포트로 표시.
    pub fn with_source_error(mut self, error: impl Into<String>) -> Self {
        self.status = ReportStatus::SourceFailed;
        self.source_error = Some(error.into());
        self
    }

    /// 취소나 소스 실패 없이 확정되었는지 확인.
    pub fn is_complete(&self) -> bool {
        !matches!(
            self.status,
            ReportStatus::Cancelled | ReportStatus::SourceFailed
        )
    }

    /// 분배 순서대로 항목 ID 반환.
    pub fn item_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.item_id.as_str()).collect()
    }

    /// 실패/건너뜀 항목.
    pub fn unsuccessful(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_success())
    }
}
