//! 원격 API 에러 타입.

use scorer_core::FailureKind;
use std::time::Duration;
use thiserror::Error;

/// 완성 API 호출 에러.
#[derive(Debug, Error)]
pub enum LlmError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 시도당 타임아웃 초과
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 요청 한도 초과 (제공자가 권장한 대기 시간 포함)
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    /// 서버 측 일시 장애 (5xx, 408)
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 잘못된 요청 (그 외 4xx)
    #[error("Bad request {status}: {message}")]
    BadRequest { status: u16, message: String },

    /// 응답 파싱 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 응답에 내용이 없음
    #[error("Empty response")]
    EmptyResponse,
}

/// 완성 API 작업을 위한 Result 타입.
pub type LlmResult<T> = Result<T, LlmError>;

impl LlmError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Network(_)
                | LlmError::Timeout(_)
                | LlmError::RateLimited { .. }
                | LlmError::Server { .. }
        )
    }

    /// 제공자가 권장한 재시도 대기 시간.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// 결과에 기록할 실패 유형.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            LlmError::Network(_) | LlmError::Server { .. } => FailureKind::Transient,
            LlmError::Timeout(_) => FailureKind::Timeout,
            LlmError::RateLimited { .. } => FailureKind::RateLimited,
            LlmError::Unauthorized(_) => FailureKind::Unauthorized,
            LlmError::BadRequest { .. } => FailureKind::InvalidRequest,
            LlmError::Parse(_) | LlmError::EmptyResponse => FailureKind::Parse,
        }
    }

    /// HTTP 상태 코드로부터 에러 분류.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        let message = message.into();
        match status {
            429 => LlmError::RateLimited { retry_after },
            401 | 403 => LlmError::Unauthorized(message),
            408 | 500..=599 => LlmError::Server { status, message },
            _ => LlmError::BadRequest { status, message },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_decode() {
            LlmError::Parse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Parse(err.to_string())
    }
}
