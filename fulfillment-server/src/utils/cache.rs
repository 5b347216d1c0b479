//! Single-value TTL cache
//!
//! Used to cache the carrier connectivity probe so that batch syncs do not
//! hammer the connectivity endpoint. The clock is injected so tests can
//! step time instead of sleeping.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Time source for TTL checks
pub trait Clock: Send + Sync {
    /// Current time as Unix millis
    fn now_ms(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A single cached value with an expiry timestamp
#[derive(Clone)]
pub struct TtlCache<T> {
    inner: Arc<RwLock<Option<(T, i64)>>>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_ms: i64) -> Self {
        Self::with_clock(ttl_ms, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_ms: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            ttl_ms,
            clock,
        }
    }

    /// The cached value, unless expired or never set
    pub async fn get(&self) -> Option<T> {
        let inner = self.inner.read().await;
        match inner.as_ref() {
            Some((value, expires_at)) if self.clock.now_ms() < *expires_at => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Store a value, restarting the TTL
    pub async fn put(&self, value: T) {
        let expires_at = self.clock.now_ms() + self.ttl_ms;
        let mut inner = self.inner.write().await;
        *inner = Some((value, expires_at));
    }

    /// Drop the cached value
    pub async fn invalidate(&self) {
        let mut inner = self.inner.write().await;
        *inner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FakeClock(AtomicI64);

    impl FakeClock {
        fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_value_expires_after_ttl() {
        let clock = Arc::new(FakeClock(AtomicI64::new(0)));
        let cache: TtlCache<bool> = TtlCache::with_clock(1_000, clock.clone());

        assert_eq!(cache.get().await, None);

        cache.put(true).await;
        assert_eq!(cache.get().await, Some(true));

        clock.advance(999);
        assert_eq!(cache.get().await, Some(true));

        clock.advance(1);
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_put_restarts_ttl() {
        let clock = Arc::new(FakeClock(AtomicI64::new(0)));
        let cache: TtlCache<u32> = TtlCache::with_clock(1_000, clock.clone());

        cache.put(1).await;
        clock.advance(900);
        cache.put(2).await;
        clock.advance(900);
        assert_eq!(cache.get().await, Some(2));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache: TtlCache<u32> = TtlCache::new(60_000);
        cache.put(7).await;
        cache.invalidate().await;
        assert_eq!(cache.get().await, None);
    }
}
