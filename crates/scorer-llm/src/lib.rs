//! 원격 LLM 완성(completion) API 클라이언트.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - `CompletionApi` trait: 교체 가능한 원격 API 인터페이스
//! - OpenAI 호환 HTTP 클라이언트 (DashScope 등)
//! - Token Bucket 기반 전역 요청 한도
//! - 지수 백오프 + 지터 재시도 상태 머신
//! - `ApiClient`: 뉴스 한 건을 분석 결과 하나로 변환하는 분석기

pub mod client;
pub mod error;
pub mod http;
pub mod prompt;
pub mod rate_limit;
pub mod response;
pub mod retry;
pub mod traits;

pub use client::ApiClient;
pub use error::*;
pub use http::OpenAiCompatibleClient;
pub use prompt::PromptBuilder;
pub use rate_limit::RateLimiter;
pub use response::parse_scores;
pub use retry::{CallState, RetryPolicy};
pub use traits::*;
