//! 전역 요청 한도.
//!
//! Token Bucket 알고리즘으로 모든 작업 슬롯이 공유하는 요청 속도를 제한합니다.
//! 재시도를 포함해 시도 한 번마다 토큰 하나를 소비합니다.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use scorer_core::RateLimitConfig;

/// Token Bucket 구조체.
#[derive(Debug)]
struct TokenBucket {
    /// 현재 토큰 수
    tokens: f64,
    /// 마지막 리필 시간
    last_refill: Instant,
    /// 최대 토큰 수 (버킷 용량)
    max_tokens: f64,
    /// 초당 리필되는 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let refill_rate = config.requests_per_minute.max(1) as f64 / 60.0;
        let max_tokens = (refill_rate + config.burst_size as f64).max(1.0);

        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// 토큰 소비 시도.
    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// 다음 토큰까지 대기 시간.
    fn time_until_next_token(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

/// 공유 Rate Limiter.
///
/// 복제본은 같은 버킷을 공유합니다.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimiter {
    /// 새 Rate Limiter 생성.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(config))),
        }
    }

    /// 토큰을 얻을 때까지 대기.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_next_token()
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// 대기 없이 토큰 소비 시도.
    pub async fn try_acquire(&self) -> bool {
        self.bucket.lock().await.try_acquire()
    }

    /// 현재 사용 가능한 토큰 수.
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill();
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_wait() {
        // 초당 1회 + 버스트 2 = 토큰 3개
        let limiter = RateLimiter::new(&RateLimitConfig::new(60, 2));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(1));

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(999));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_rate() {
        // 초당 10회, 버스트 없음
        let limiter = RateLimiter::new(&RateLimitConfig::new(600, 0));
        let start = Instant::now();

        for _ in 0..30 {
            limiter.acquire().await;
        }

        // 처음 10개는 즉시, 나머지 20개는 초당 10개씩
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1990), "elapsed: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2200), "elapsed: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_bucket() {
        let limiter = RateLimiter::new(&RateLimitConfig::new(60, 0));
        let other = limiter.clone();

        assert!(limiter.try_acquire().await);
        assert!(!other.try_acquire().await);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(other.try_acquire().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_capped_at_capacity() {
        let limiter = RateLimiter::new(&RateLimitConfig::new(120, 3));
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!((limiter.available().await - 5.0).abs() < 1e-9);
    }
}
