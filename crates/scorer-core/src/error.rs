//! 스코어러 에러 타입.
//!
//! 개별 뉴스 항목의 실패는 에러가 아니라 [`AnalysisOutcome::Failed`]로 기록됩니다.
//! 이 모듈의 에러는 실행 전체 또는 특정 종목 단위로 전파되는 에러입니다.
//!
//! [`AnalysisOutcome::Failed`]: crate::AnalysisOutcome::Failed

use thiserror::Error;

use crate::StockCode;

/// 실행/종목 단위 에러.
#[derive(Debug, Error)]
pub enum ScorerError {
    /// 설정 에러 (자격증명 누락, 잘못된 PROCESS_NUM 등). 작업 분배 전에 실행을 중단합니다.
    #[error("설정 에러: {0}")]
    Config(String),

    /// 같은 종목에서 동일한 항목 ID가 두 번 기록됨 (뉴스 소스 계약 위반)
    #[error("중복 항목: {stock_code}/{item_id}")]
    DuplicateItem { stock_code: StockCode, item_id: String },

    /// 뉴스 소스 에러
    #[error("뉴스 소스 에러 ({stock_code}): {message}")]
    Source { stock_code: StockCode, message: String },

    /// 결과 내보내기 에러
    #[error("내보내기 에러: {0}")]
    Export(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 입출력 에러
    #[error("입출력 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 스코어러 작업을 위한 Result 타입.
pub type ScorerResult<T> = Result<T, ScorerError>;

impl ScorerError {
    /// 뉴스 소스 에러 생성 헬퍼.
    pub fn source(stock_code: &StockCode, message: impl Into<String>) -> Self {
        ScorerError::Source {
            stock_code: stock_code.clone(),
            message: message.into(),
        }
    }

    /// 실행 전체를 중단해야 하는 에러인지 확인합니다.
    ///
    /// `DuplicateItem`과 `Source`는 해당 종목에만 적용되며 다른 종목은 계속 처리됩니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScorerError::Config(_))
    }

    /// 특정 종목 범위의 에러라면 해당 종목 코드를 반환합니다.
    pub fn stock_code(&self) -> Option<&StockCode> {
        match self {
            ScorerError::DuplicateItem { stock_code, .. }
            | ScorerError::Source { stock_code, .. } => Some(stock_code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ScorerError {
    fn from(err: serde_json::Error) -> Self {
        ScorerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ScorerError {
    fn from(err: config::ConfigError) -> Self {
        ScorerError::Config(err.to_string())
    }
}
