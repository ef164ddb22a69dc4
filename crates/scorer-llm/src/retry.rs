//! 재시도 정책과 호출 상태 머신.
//!
//! # 상태 전이
//!
//! ```text
//! Attempting(n) ──[성공]──────────────> Succeeded
//!      │ ──[재시도 불가 에러]──────────> FailedPermanent
//!      │ ──[재시도 가능, n == max]─────> Exhausted
//!      └──[재시도 가능, n < max]──> Backoff(n, delay) ──[대기 후]──> Attempting(n + 1)
//! ```

use rand::Rng;
use std::time::Duration;

use scorer_core::RetryConfig;

use crate::LlmError;

/// 재시도 정책.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 재시도 대기 시간
    pub base_delay: Duration,
    /// 대기 시간 상한
    pub max_delay: Duration,
    /// 지터 적용 여부
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            jitter: config.jitter,
        }
    }
}

impl RetryPolicy {
    /// 새 정책 생성 (지터 적용).
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            jitter: true,
        }
    }

    /// 지터 비활성화.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// `attempt`번째 시도가 실패한 뒤의 대기 시간.
    ///
    /// 제공자가 대기 시간을 제시하면 그 값을 그대로 따르고, 아니면
    /// `base * 2^(attempt-1)`을 상한으로 자른 뒤 절반 구간에 지터를 적용합니다.
    pub fn backoff_delay(&self, attempt: u32, provider_hint: Option<Duration>) -> Duration {
        if let Some(hint) = provider_hint {
            return hint;
        }

        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let half = delay / 2;
        let spread = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(spread)
    }
}

/// 호출 한 건의 재시도 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// `attempt`번째 시도 중
    Attempting { attempt: u32 },
    /// `attempt`번 시도 후 재시도 대기
    Backoff { attempt: u32, delay: Duration },
    /// 성공
    Succeeded { attempts: u32 },
    /// 재시도 불가 에러로 종료
    FailedPermanent { attempts: u32 },
    /// 재시도 횟수 소진
    Exhausted { attempts: u32 },
}

impl CallState {
    /// 첫 시도 상태.
    pub fn start() -> Self {
        CallState::Attempting { attempt: 1 }
    }

    /// 시도 성공.
    pub fn on_success(self) -> Self {
        match self {
            CallState::Attempting { attempt } => CallState::Succeeded { attempts: attempt },
            other => other,
        }
    }

    /// 시도 실패.
    pub fn on_error(self, policy: &RetryPolicy, error: &LlmError) -> Self {
        let CallState::Attempting { attempt } = self else {
            return self;
        };

        if !error.is_retryable() {
            CallState::FailedPermanent { attempts: attempt }
        } else if attempt >= policy.max_attempts {
            CallState::Exhausted { attempts: attempt }
        } else {
            CallState::Backoff {
                attempt,
                delay: policy.backoff_delay(attempt, error.retry_after()),
            }
        }
    }

    /// 대기 종료 후 다음 시도로 전이.
    pub fn resume(self) -> Self {
        match self {
            CallState::Backoff { attempt, .. } => CallState::Attempting {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// 종료 상태인지 확인.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Succeeded { .. }
                | CallState::FailedPermanent { .. }
                | CallState::Exhausted { .. }
        )
    }

    /// 지금까지 수행한 시도 횟수.
    pub fn attempts(&self) -> u32 {
        match *self {
            CallState::Attempting { attempt } => attempt,
            CallState::Backoff { attempt, .. } => attempt,
            CallState::Succeeded { attempts }
            | CallState::FailedPermanent { attempts }
            | CallState::Exhausted { attempts } => attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(100), Duration::from_secs(1))
            .without_jitter()
    }

    #[test]
    fn test_exponential_backoff_capped() {
        let p = policy(10);
        assert_eq!(p.backoff_delay(1, None), Duration::from_millis(100));
        assert_eq!(p.backoff_delay(2, None), Duration::from_millis(200));
        assert_eq!(p.backoff_delay(3, None), Duration::from_millis(400));
        assert_eq!(p.backoff_delay(5, None), Duration::from_secs(1));
        assert_eq!(p.backoff_delay(40, None), Duration::from_secs(1));
    }

    #[test]
    fn test_provider_hint_honored() {
        let p = policy(3);
        assert_eq!(
            p.backoff_delay(1, Some(Duration::from_secs(30))),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_jitter_within_bounds() {
        let p = RetryPolicy::new(5, Duration::from_millis(400), Duration::from_secs(10));
        for _ in 0..100 {
            let d = p.backoff_delay(2, None);
            assert!(d >= Duration::from_millis(400) && d <= Duration::from_millis(800));
        }
    }

    #[test]
    fn test_retry_until_exhausted() {
        let p = policy(3);
        let err = LlmError::RateLimited { retry_after: None };

        let mut state = CallState::start();
        let mut transitions = 0;
        while !state.is_terminal() {
            state = state.on_error(&p, &err);
            if let CallState::Backoff { .. } = state {
                state = state.resume();
            }
            transitions += 1;
        }

        assert_eq!(state, CallState::Exhausted { attempts: 3 });
        assert_eq!(transitions, 3);
    }

    #[test]
    fn test_permanent_error_stops_immediately() {
        let p = policy(5);
        let state = CallState::start().on_error(&p, &LlmError::Unauthorized("401".into()));
        assert_eq!(state, CallState::FailedPermanent { attempts: 1 });
    }

    #[test]
    fn test_success_after_backoff() {
        let p = policy(3);
        let state = CallState::start()
            .on_error(&p, &LlmError::Network("reset".into()))
            .resume()
            .on_success();
        assert_eq!(state, CallState::Succeeded { attempts: 2 });
    }

    #[test]
    fn test_single_attempt_policy() {
        let p = policy(1);
        let state = CallState::start().on_error(&p, &LlmError::Timeout("60s".into()));
        assert_eq!(state, CallState::Exhausted { attempts: 1 });
    }
}
