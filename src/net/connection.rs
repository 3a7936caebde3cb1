//! Session identity and activity tracking.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Count live sessions and in-flight dispatches
//! - Wait for activity to drain during shutdown
//! - Limit concurrent sessions via semaphore permits

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

/// Source of session IDs; only uniqueness matters.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

/// Counts live units of work (sessions or dispatch tasks).
///
/// The count lives in a watch channel so shutdown can wait for zero
/// without polling.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    active: Arc<watch::Sender<u64>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            active: Arc::new(tx),
        }
    }

    /// Record one unit of work. Returns a guard that decrements on drop.
    pub fn track(&self) -> ActivityGuard {
        self.active.send_modify(|n| *n += 1);
        ActivityGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active_count(&self) -> u64 {
        *self.active.borrow()
    }

    /// Wait until the count reaches zero. Returns false on timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let mut rx = self.active.subscribe();
        // Bound so the `Ref` is dropped before `rx`.
        let idle = match tokio::time::timeout(timeout, rx.wait_for(|n| *n == 0)).await {
            Ok(res) => res.is_ok(),
            Err(_) => false,
        };
        idle
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the tracker count when dropped, including on panic unwind.
#[derive(Debug)]
pub struct ActivityGuard {
    active: Arc<watch::Sender<u64>>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.active.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Bounds the number of concurrent sessions.
#[derive(Debug, Clone)]
pub struct SessionLimiter {
    permits: Arc<Semaphore>,
    max_sessions: usize,
}

impl SessionLimiter {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
        }
    }

    /// Claim a slot without waiting; `None` when the limit is reached.
    pub fn try_acquire(&self) -> Option<SessionPermit> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| SessionPermit { _permit: permit })
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

/// A session slot, released when dropped.
#[derive(Debug)]
pub struct SessionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn activity_tracker_counts() {
        let tracker = ActivityTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.clone().track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn wait_idle_returns_when_drained() {
        let tracker = ActivityTracker::new();
        let guard = tracker.track();

        let waiter = tracker.clone();
        let wait = tokio::spawn(async move { waiter.wait_idle(Duration::from_secs(5)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        assert!(wait.await.unwrap());
    }

    #[tokio::test]
    async fn wait_idle_times_out() {
        let tracker = ActivityTracker::new();
        let _guard = tracker.track();
        assert!(!tracker.wait_idle(Duration::from_millis(20)).await);
    }

    #[test]
    fn limiter_rejects_over_capacity() {
        let limiter = SessionLimiter::new(1);
        let permit = limiter.try_acquire().expect("first slot");
        assert!(limiter.try_acquire().is_none());
        drop(permit);
        assert!(limiter.try_acquire().is_some());
        assert_eq!(limiter.max_sessions(), 1);
    }
}
