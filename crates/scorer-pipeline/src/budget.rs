//! PROCESS_NUM 분배 예산.
//!
//! 작업 슬롯 사이에서 공유되는 분배 카운터입니다. 한도에 도달하면 더 이상
//! 항목을 꺼내지 않습니다.

use std::sync::atomic::{AtomicUsize, Ordering};

/// 분배 가능한 항목 수 예산.
#[derive(Debug)]
pub struct DispatchBudget {
    limit: usize,
    dispatched: AtomicUsize,
}

impl DispatchBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            dispatched: AtomicUsize::new(0),
        }
    }

    /// 항목 하나를 분배할 권한을 얻습니다. 한도에 도달했으면 `false`.
    pub fn try_acquire(&self) -> bool {
        self.dispatched
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.limit).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn is_exhausted(&self) -> bool {
        self.dispatched.load(Ordering::Acquire) >= self.limit
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::Acquire)
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.dispatched())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_budget_stops_at_limit() {
        let budget = DispatchBudget::new(2);
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
        assert!(budget.is_exhausted());
        assert_eq!(budget.dispatched(), 2);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_zero_budget() {
        let budget = DispatchBudget::new(0);
        assert!(budget.is_exhausted());
        assert!(!budget.try_acquire());
    }

    #[test]
    fn test_concurrent_acquire_never_exceeds_limit() {
        let budget = Arc::new(DispatchBudget::new(100));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = budget.clone();
                std::thread::spawn(move || (0..50).filter(|_| budget.try_acquire()).count())
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 100);
        assert_eq!(budget.dispatched(), 100);
    }
}
