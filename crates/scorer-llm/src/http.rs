//! OpenAI 호환 Chat Completions HTTP 클라이언트.
//!
//! DashScope compatible-mode 등 `POST {base_url}/chat/completions` 형식을
//! 따르는 제공자에 사용합니다.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use scorer_core::{ApiConfig, ScorerError, ScorerResult};

use crate::{ChatMessage, CompletionApi, CompletionRequest, LlmError, LlmResult};

/// 에러 메시지에 남길 응답 본문 최대 길이.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI 호환 완성 API 클라이언트.
pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: String,
    model: String,
    auth_header: HeaderValue,
}

impl OpenAiCompatibleClient {
    /// 새 클라이언트 생성.
    ///
    /// # Errors
    /// 자격증명이 헤더 값으로 사용할 수 없거나 HTTP 클라이언트 생성에 실패하면
    /// `ScorerError::Config`를 반환합니다.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        credential: &SecretString,
        timeout: Duration,
    ) -> ScorerResult<Self> {
        let mut auth_header =
            HeaderValue::from_str(&format!("Bearer {}", credential.expose_secret()))
                .map_err(|_| ScorerError::Config("API 키에 허용되지 않는 문자가 있습니다".to_string()))?;
        auth_header.set_sensitive(true);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScorerError::Config(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            auth_header,
        })
    }

    /// API 설정에서 클라이언트 생성.
    pub fn from_config(config: &ApiConfig) -> ScorerResult<Self> {
        Self::new(
            &config.base_url,
            config.model.clone(),
            config.credential()?,
            config.request_timeout(),
        )
    }

    /// 요청 엔드포인트.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionApi for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.auth_header.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "completion request rejected");
            return Err(LlmError::from_status(
                status.as_u16(),
                truncate(&text),
                retry_after,
            ));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// `Retry-After` 헤더(초 단위) 파싱.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash() {
        let key = SecretString::new("sk-test".to_string().into_boxed_str());
        let client = OpenAiCompatibleClient::new(
            "https://example.com/v1/",
            "qwen-turbo",
            &key,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "https://example.com/v1/chat/completions");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(7)));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "가".repeat(300);
        let truncated = truncate(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS + 3);
    }
}
