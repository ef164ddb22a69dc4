//! # Scorer Core
//!
//! 뉴스 스코어러의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 종목 코드 및 뉴스 항목
//! - 분석 결과(성공/실패/건너뜀)와 종목별 리포트
//! - 분석기(`Analyzer`) trait
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
