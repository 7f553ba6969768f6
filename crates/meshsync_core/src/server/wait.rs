//! Rendezvous primitives between HTTP handlers and the host thread.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout;

/// One-shot completion signal for a request awaiting the host.
///
/// Starts pending. The host completes it from any thread; the HTTP handler
/// waits for it with a deadline.
#[derive(Debug, Default)]
pub struct WaitHandle {
    completed: AtomicBool,
    notify: Notify,
}

impl WaitHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&self) {
        self.completed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Returns `true` if completed before `deadline` elapsed.
    pub async fn wait(&self, deadline: Duration) -> bool {
        let completed = async {
            loop {
                // registered before the check so a concurrent complete() is not lost
                let notified = self.notify.notified();
                if self.is_complete() {
                    return;
                }
                notified.await;
            }
        };
        timeout(deadline, completed).await.is_ok()
    }
}

/// Counter pairing SceneBegin fences with the closing SceneEnd.
#[derive(Debug, Default)]
pub struct RequestCounter {
    count: AtomicI32,
    notify: Notify,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i32 {
        self.count.load(Ordering::Acquire)
    }

    pub fn increment(&self) -> i32 {
        let value = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        // a late SceneBegin can lift a negative count back to zero
        self.notify.notify_waiters();
        value
    }

    pub fn decrement(&self) -> i32 {
        let value = self.count.fetch_sub(1, Ordering::AcqRel) - 1;
        self.notify.notify_waiters();
        value
    }

    /// Holds the counter raised until the returned guard is dropped.
    pub fn enter(&self) -> InFlight<'_> {
        self.increment();
        InFlight { counter: self }
    }

    /// Returns `true` if the counter reached zero before `deadline` elapsed.
    pub async fn wait_for_zero(&self, deadline: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.notify.notified();
                if self.get() == 0 {
                    return;
                }
                notified.await;
            }
        };
        timeout(deadline, drained).await.is_ok()
    }
}

#[derive(Debug)]
pub struct InFlight<'a> {
    counter: &'a RequestCounter,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.decrement();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_wait_handle_completed_from_other_thread() {
        let handle = Arc::new(WaitHandle::new());
        let host = Arc::clone(&handle);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            host.complete();
        });

        assert!(handle.wait(Duration::from_secs(2)).await);
        assert!(handle.is_complete());
    }

    #[tokio::test]
    async fn test_wait_handle_already_complete() {
        let handle = WaitHandle::new();
        handle.complete();
        assert!(handle.wait(Duration::from_millis(1)).await);
    }

    #[tokio::test]
    async fn test_wait_handle_times_out() {
        let handle = WaitHandle::new();
        let start = Instant::now();
        assert!(!handle.wait(Duration::from_millis(50)).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(1));
        assert!(!handle.is_complete());
    }

    #[test]
    fn test_counter_increment_decrement() {
        let counter = RequestCounter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.decrement(), 1);
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_in_flight_guard_restores_count() {
        let counter = RequestCounter::new();
        {
            let _guard = counter.enter();
            assert_eq!(counter.get(), 1);
        }
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_zero_released_by_decrement() {
        let counter = Arc::new(RequestCounter::new());
        counter.increment();
        let other = Arc::clone(&counter);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            other.decrement();
        });

        assert!(counter.wait_for_zero(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_wait_for_zero_released_by_increment() {
        let counter = Arc::new(RequestCounter::new());
        assert_eq!(counter.decrement(), -1);
        let other = Arc::clone(&counter);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            other.increment();
        });

        let start = Instant::now();
        assert!(counter.wait_for_zero(Duration::from_secs(1)).await);
        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(counter.get(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_zero_times_out() {
        let counter = RequestCounter::new();
        counter.increment();
        assert!(!counter.wait_for_zero(Duration::from_millis(30)).await);
        assert_eq!(counter.get(), 1);
    }
}
