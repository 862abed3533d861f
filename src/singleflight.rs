//! Request coalescing
//!
//! [`Flight`] makes sure that at most one load per key is in flight. The
//! first caller for a key (the leader) runs the work; callers arriving while
//! it runs (followers) wait and receive a clone of the leader's result.
//! Once the leader finishes the record is dropped, so a later request for
//! the same key starts a fresh load. A leader dropped before it resolves
//! hands the load over to one of its followers.
//!
//! Both the work and the wait are bounded by an optional deadline; expiry
//! resolves as [`CacheError::Timeout`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{CacheError, Result};

/// Receiving half of a pending call; `None` until the leader resolves.
type Pending<T> = watch::Receiver<Option<Result<T>>>;

enum Role<T> {
    Leader(watch::Sender<Option<Result<T>>>),
    Follower(Pending<T>),
}

// == Flight ==
/// Deduplicates concurrent loads keyed by string.
pub struct Flight<T> {
    calls: Mutex<HashMap<String, Pending<T>>>,
    timeout: Option<Duration>,
}

impl<T> Default for Flight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            timeout: None,
        }
    }
}

impl<T> std::fmt::Debug for Flight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flight")
            .field("in_flight", &self.in_flight())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Removes the pending record when the leader finishes or is dropped.
struct CallGuard<'a, T> {
    calls: &'a Mutex<HashMap<String, Pending<T>>>,
    key: &'a str,
}

impl<T> Drop for CallGuard<'_, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(self.key);
    }
}

impl<T> Flight<T> {
    // == Constructors ==
    /// Creates a coalescer without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coalescer whose loads and waits give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            timeout: Some(timeout),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of keys with a load currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<T: Clone> Flight<T> {
    // == Run ==
    /// Runs `work` for `key` unless a run is already pending, in which case
    /// this call waits for that run and returns its result.
    ///
    /// A failure is shared with every caller of the same window and is not
    /// remembered afterwards. If the leading caller is dropped before it
    /// resolves, one waiter takes over and runs its own `work`.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            let role = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(pending) => Role::Follower(pending.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        calls.insert(key.to_string(), rx);
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => return self.lead(key, tx, work).await,
                Role::Follower(pending) => {
                    debug!(key, "joining in-flight load");
                    if let Some(result) = self.follow(key, pending).await {
                        return result;
                    }
                    debug!(key, "leader dropped, taking over the load");
                }
            }
        }
    }

    // == Leader ==
    async fn lead<F, Fut>(
        &self,
        key: &str,
        tx: watch::Sender<Option<Result<T>>>,
        work: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let guard = CallGuard {
            calls: &self.calls,
            key,
        };

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work())
                .await
                .unwrap_or_else(|_| Err(timed_out(key, limit))),
            None => work().await,
        };

        // The record must be gone before waiters wake up.
        drop(guard);
        tx.send_replace(Some(result.clone()));
        result
    }

    // == Follower ==
    /// Waits for the leader's result. `None` means the leader was dropped
    /// without resolving; its record is already gone by then.
    async fn follow(&self, key: &str, mut pending: Pending<T>) -> Option<Result<T>> {
        let wait = async {
            match pending.wait_for(Option::is_some).await {
                Ok(resolved) => (*resolved).clone(),
                Err(_) => None,
            }
        };

        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(outcome) => outcome,
                Err(_) => Some(Err(timed_out(key, limit))),
            },
            None => wait.await,
        }
    }
}

fn timed_out(key: &str, limit: Duration) -> CacheError {
    CacheError::Timeout(format!("{key} after {}ms", limit.as_millis()))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn slow_value(calls: Arc<AtomicUsize>, value: &str) -> Result<String> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(value.to_string())
    }

    #[tokio::test]
    async fn test_single_caller_runs_work() {
        let flight = Flight::new();

        let result = flight.run("Tom", || async { Ok("630".to_string()) }).await;

        assert_eq!(result, Ok("630".to_string()));
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_run() {
        let flight = Arc::new(Flight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move { flight.run("Tom", || slow_value(calls, "630")).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("630".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);

        // A later, non-overlapping call loads again
        let ninth = flight.run("Tom", || slow_value(Arc::clone(&calls), "631")).await;
        assert_eq!(ninth, Ok("631".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_is_shared_but_not_remembered() {
        let flight: Arc<Flight<String>> = Arc::new(Flight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    flight
                        .run("Jack", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(200)).await;
                            Err(CacheError::LoadFailure("disk on fire".to_string()))
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                Err(CacheError::LoadFailure("disk on fire".to_string()))
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let retry = flight.run("Jack", || async { Ok("589".to_string()) }).await;
        assert_eq!(retry, Ok("589".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_key_does_not_block_other_keys() {
        let flight = Arc::new(Flight::new());

        let slow = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .run("slow", || async {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        Ok("late".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fast = tokio::time::timeout(
            Duration::from_millis(500),
            flight.run("fast", || async { Ok("now".to_string()) }),
        )
        .await;

        assert_eq!(fast.unwrap(), Ok("now".to_string()));
        slow.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deadline_resolves_every_waiter() {
        let flight = Arc::new(Flight::with_timeout(Duration::from_millis(100)));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let flight = Arc::clone(&flight);
                tokio::spawn(async move {
                    flight
                        .run("Sam", || async {
                            tokio::time::sleep(Duration::from_secs(5)).await;
                            Ok("567".to_string())
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(matches!(handle.await.unwrap(), Err(CacheError::Timeout(_))));
        }
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dropped_leader_hands_over_to_follower() {
        let flight: Arc<Flight<String>> = Arc::new(Flight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = {
            let flight = Arc::clone(&flight);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                flight
                    .run("Tom", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok("630".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let followers: Vec<_> = (0..3)
            .map(|_| {
                let flight = Arc::clone(&flight);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    flight.run("Tom", || slow_value(calls, "631")).await
                })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(50)).await;
        leader.abort();

        for follower in followers {
            assert_eq!(follower.await.unwrap(), Ok("631".to_string()));
        }
        // The aborted run plus exactly one takeover
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(flight.in_flight(), 0);
    }

    #[test]
    fn test_debug_without_clone_bound() {
        struct Opaque;
        let flight: Flight<Opaque> = Flight::new();
        assert_eq!(
            format!("{flight:?}"),
            "Flight { in_flight: 0, timeout: None }"
        );
    }
}
