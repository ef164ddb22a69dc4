//! ApiClient 재시도/요청 한도 동작 테스트.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scorer_core::{
    AnalysisOutcome, Analyzer, FailureKind, NewsItem, RateLimitConfig, SkipReason, StockCode,
};
use scorer_llm::{
    ApiClient, CompletionApi, CompletionRequest, LlmError, LlmResult, RateLimiter, RetryPolicy,
};

const VALID: &str = r#"{"Fundamental_Positive": 0.6, "Impact_Cycle_Length": 0.5,
    "Timeliness_Weight": 0.4, "Information_Certainty": 0.9, "Information_Relevance": 1.0}"#;

/// 미리 정한 응답을 순서대로 돌려주는 가짜 API.
/// 스크립트가 끝나면 마지막 응답 생성기를 반복합니다.
struct ScriptedApi {
    script: Mutex<VecDeque<fn() -> LlmResult<String>>>,
    fallback: fn() -> LlmResult<String>,
    calls: AtomicU32,
    delay: Duration,
}

impl ScriptedApi {
    fn new(script: Vec<fn() -> LlmResult<String>>, fallback: fn() -> LlmResult<String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            delay: Duration::ZERO,
        }
    }

    fn always(response: fn() -> LlmResult<String>) -> Self {
        Self::new(Vec::new(), response)
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionApi for ScriptedApi {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &CompletionRequest) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
        next()
    }
}

fn ok() -> LlmResult<String> {
    Ok(VALID.to_string())
}

fn rate_limited() -> LlmResult<String> {
    Err(LlmError::RateLimited { retry_after: None })
}

fn server_error() -> LlmResult<String> {
    Err(LlmError::Server {
        status: 503,
        message: "busy".to_string(),
    })
}

fn unauthorized() -> LlmResult<String> {
    Err(LlmError::Unauthorized("invalid api key".to_string()))
}

fn garbage() -> LlmResult<String> {
    Ok("오늘은 좋은 뉴스입니다".to_string())
}

fn client(api: Arc<ScriptedApi>, max_attempts: u32) -> ApiClient {
    ApiClient::new(
        api,
        RateLimiter::new(&RateLimitConfig::new(6000, 100)),
        RetryPolicy::new(max_attempts, Duration::from_millis(50), Duration::from_secs(1)),
        Duration::from_secs(5),
    )
}

fn item(id: &str) -> NewsItem {
    NewsItem::new(StockCode::from("000001"), id, "平安银行发布年报").with_title("年报")
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_retries_up_to_max_attempts() {
    let api = Arc::new(ScriptedApi::always(rate_limited));
    let client = client(api.clone(), 4);

    let outcome = client.submit(&item("n-1")).await;

    match outcome {
        AnalysisOutcome::Failed { kind, attempts, .. } => {
            assert_eq!(kind, FailureKind::RateLimited);
            assert_eq!(attempts, 4);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(api.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_not_retried() {
    let api = Arc::new(ScriptedApi::always(unauthorized));
    let client = client(api.clone(), 5);

    let outcome = client.submit(&item("n-1")).await;

    assert!(matches!(
        outcome,
        AnalysisOutcome::Failed {
            kind: FailureKind::Unauthorized,
            attempts: 1,
            ..
        }
    ));
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_response_fails_without_retry() {
    let api = Arc::new(ScriptedApi::always(garbage));
    let client = client(api.clone(), 3);

    let outcome = client.submit(&item("n-1")).await;

    assert!(matches!(
        outcome,
        AnalysisOutcome::Failed {
            kind: FailureKind::Parse,
            attempts: 1,
            ..
        }
    ));
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_then_success() {
    let api = Arc::new(ScriptedApi::new(vec![server_error, rate_limited], ok));
    let client = client(api.clone(), 3);

    let outcome = client.submit(&item("n-1")).await;

    let scores = outcome.scores().expect("should succeed on third attempt");
    assert_eq!(scores.information_relevance, 1.0);
    assert_eq!(api.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_is_retryable() {
    let api = Arc::new(ScriptedApi::always(ok).with_delay(Duration::from_secs(10)));
    let client = ApiClient::new(
        api.clone(),
        RateLimiter::new(&RateLimitConfig::new(6000, 100)),
        RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(10)),
        Duration::from_secs(1),
    );

    let outcome = client.submit(&item("n-1")).await;

    assert!(matches!(
        outcome,
        AnalysisOutcome::Failed {
            kind: FailureKind::Timeout,
            attempts: 2,
            ..
        }
    ));
    assert_eq!(api.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blank_item_skipped_without_call() {
    let api = Arc::new(ScriptedApi::always(ok));
    let client = client(api.clone(), 3);
    let before = client.limiter().available().await;

    let blank = NewsItem::new(StockCode::from("000001"), "n-empty", "   ");
    let outcome = client.submit(&blank).await;

    assert_eq!(
        outcome,
        AnalysisOutcome::Skipped {
            reason: SkipReason::EmptyContent
        }
    );
    assert_eq!(api.calls(), 0);
    assert!((client.limiter().available().await - before).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_consumes_a_token() {
    let api = Arc::new(ScriptedApi::always(server_error));
    // 분당 1회 리필 + 버스트 10: 재시도 중 리필은 무시할 수준
    let client = ApiClient::new(
        api.clone(),
        RateLimiter::new(&RateLimitConfig::new(1, 10)),
        RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
        Duration::from_secs(5),
    );
    let before = client.limiter().available().await;

    let _ = client.submit(&item("n-1")).await;

    let consumed = before - client.limiter().available().await;
    assert!((consumed - 3.0).abs() < 1e-6, "consumed: {}", consumed);
}
