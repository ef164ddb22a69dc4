//! 실행 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 실행 한 번의 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// 대상 종목 수
    pub codes: usize,
    /// 분배된 항목 수
    pub dispatched: usize,
    /// 성공 건수
    pub succeeded: usize,
    /// 실패 건수
    pub failed: usize,
    /// 건너뛴 건수 (빈 내용)
    pub skipped: usize,
    /// 종목 단위 에러 수 (중복 항목, 소스 에러)
    pub code_errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        let total = self.succeeded + self.failed + self.skipped;
        if total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            codes = self.codes,
            dispatched = self.dispatched,
            succeeded = self.succeeded,
            failed = self.failed,
            skipped = self.skipped,
            code_errors = self.code_errors,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "실행 완료"
        );
    }
}
