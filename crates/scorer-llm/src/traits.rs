//! 완성 API trait 정의.

use async_trait::async_trait;
use serde::Serialize;

use crate::LlmResult;

/// 메시지 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// 대화 메시지 하나.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// 완성 요청.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// 요청 메시지
    pub messages: Vec<ChatMessage>,
    /// 샘플링 온도
    pub temperature: f32,
    /// JSON 객체 응답 강제 여부
    pub json_mode: bool,
}

/// 원격 완성 API.
///
/// 한 번의 호출은 한 번의 네트워크 요청입니다. 재시도와 요청 한도는
/// 호출자([`ApiClient`](crate::ApiClient))가 담당합니다.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// 제공자 이름 반환.
    fn name(&self) -> &str;

    /// 요청을 보내고 응답 텍스트를 반환.
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String>;
}
