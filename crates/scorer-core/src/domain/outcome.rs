//! 뉴스 항목 처리 결과.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FactorScores;

/// 실패 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 네트워크/서버 일시 장애 (재시도 소진)
    Transient,
    /// 요청 한도 초과 (재시도 소진)
    RateLimited,
    /// 요청 타임아웃 (재시도 소진)
    Timeout,
    /// 인증 거부
    Unauthorized,
    /// 잘못된 요청
    InvalidRequest,
    /// 응답 파싱 실패
    Parse,
}

impl FailureKind {
    /// 재시도 대상 유형인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Transient | FailureKind::RateLimited | FailureKind::Timeout
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::InvalidRequest => write!(f, "invalid_request"),
            FailureKind::Parse => write!(f, "parse"),
        }
    }
}

/// 건너뜀 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// 제목과 본문이 모두 비어 있음
    EmptyContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyContent => write!(f, "empty_content"),
        }
    }
}

/// 뉴스 한 건의 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// 분석 성공
    Success { scores: FactorScores },
    /// 분석 실패
    Failed {
        kind: FailureKind,
        /// 실제 수행한 시도 횟수
        attempts: u32,
        message: String,
    },
    /// 처리하지 않고 건너뜀
    Skipped { reason: SkipReason },
}

impl AnalysisOutcome {
    /// 실패 결과 생성.
    pub fn failed(kind: FailureKind, attempts: u32, message: impl Into<String>) -> Self {
        AnalysisOutcome::Failed {
            kind,
            attempts,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, AnalysisOutcome::Skipped { .. })
    }

    /// 성공 시 점수 반환.
    pub fn scores(&self) -> Option<&FactorScores> {
        match self {
            AnalysisOutcome::Success { scores } => Some(scores),
            _ => None,
        }
    }
}
