//! 뉴스 분석 API 클라이언트.
//!
//! 뉴스 한 건에 대해 요청 한도 토큰 확보 → 시도당 타임아웃을 건 원격 호출 →
//! 응답 파싱을 수행하고, 실패 시 [`CallState`] 상태 머신에 따라 재시도합니다.
//! 호출별 상태는 모두 지역 변수이므로 여러 작업 슬롯에서 동시에 사용할 수 있습니다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use scorer_core::{
    AnalysisOutcome, Analyzer, FactorScores, FailureKind, NewsItem, RunConfig, ScorerResult,
    SkipReason,
};

use crate::{
    parse_scores, CallState, CompletionApi, CompletionRequest, LlmError, LlmResult,
    OpenAiCompatibleClient, PromptBuilder, RateLimiter, RetryPolicy,
};

/// 재시도와 요청 한도를 적용하는 분석 클라이언트.
pub struct ApiClient {
    api: Arc<dyn CompletionApi>,
    limiter: RateLimiter,
    policy: RetryPolicy,
    prompt: PromptBuilder,
    attempt_timeout: Duration,
}

impl ApiClient {
    /// 새 클라이언트 생성.
    ///
    /// `limiter`는 같은 실행의 모든 클라이언트가 공유해야 합니다.
    pub fn new(
        api: Arc<dyn CompletionApi>,
        limiter: RateLimiter,
        policy: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            api,
            limiter,
            policy,
            prompt: PromptBuilder::default(),
            attempt_timeout,
        }
    }

    /// 실행 설정으로부터 OpenAI 호환 클라이언트를 구성합니다.
    ///
    /// # Errors
    /// 자격증명이 없으면 `ScorerError::Config`를 반환합니다.
    pub fn from_config(config: &RunConfig) -> ScorerResult<Self> {
        let api = OpenAiCompatibleClient::from_config(&config.api)?;
        Ok(Self::new(
            Arc::new(api),
            RateLimiter::new(&config.rate_limit),
            RetryPolicy::from(&config.retry),
            config.api.request_timeout(),
        )
        .with_prompt(PromptBuilder::new(config.api.temperature)))
    }

    /// 프롬프트 생성기 설정.
    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// 공유 Rate Limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// 재시도 정책.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 한 번의 시도: 토큰 확보 후 타임아웃을 걸고 호출.
    async fn attempt(&self, request: &CompletionRequest) -> LlmResult<FactorScores> {
        self.limiter.acquire().await;

        let text = tokio::time::timeout(self.attempt_timeout, self.api.complete(request))
            .await
            .map_err(|_| {
                LlmError::Timeout(format!("{}ms 초과", self.attempt_timeout.as_millis()))
            })??;

        parse_scores(&text)
    }
}

#[async_trait]
impl Analyzer for ApiClient {
    async fn submit(&self, item: &NewsItem) -> AnalysisOutcome {
        if item.is_blank() {
            warn!(
                stock_code = %item.stock_code,
                item_id = %item.id,
                "내용이 비어 있어 건너뜀"
            );
            return AnalysisOutcome::Skipped {
                reason: SkipReason::EmptyContent,
            };
        }

        let request = self.prompt.build(item);
        let mut state = CallState::start();
        let mut last_error: Option<LlmError> = None;

        loop {
            match state {
                CallState::Attempting { attempt } => match self.attempt(&request).await {
                    Ok(scores) => {
                        debug!(
                            stock_code = %item.stock_code,
                            item_id = %item.id,
                            attempt,
                            "분석 완료"
                        );
                        return AnalysisOutcome::Success { scores };
                    }
                    Err(err) => {
                        state = state.on_error(&self.policy, &err);
                        warn!(
                            stock_code = %item.stock_code,
                            item_id = %item.id,
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            retryable = err.is_retryable(),
                            error = %err,
                            "API 호출 실패"
                        );
                        last_error = Some(err);
                    }
                },
                CallState::Backoff { attempt, delay } => {
                    debug!(
                        item_id = %item.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "재시도 대기"
                    );
                    tokio::time::sleep(delay).await;
                    state = state.resume();
                }
                CallState::Succeeded { .. }
                | CallState::FailedPermanent { .. }
                | CallState::Exhausted { .. } => break,
            }
        }

        let attempts = state.attempts();
        if matches!(state, CallState::Exhausted { .. }) {
            warn!(
                stock_code = %item.stock_code,
                item_id = %item.id,
                attempts,
                "최대 재시도 횟수 초과"
            );
        }

        match last_error {
            Some(err) => AnalysisOutcome::failed(err.failure_kind(), attempts, err.to_string()),
            None => AnalysisOutcome::failed(FailureKind::Transient, attempts, "unknown failure"),
        }
    }
}
