//! Supervised background tasks

use metrics::{counter, gauge};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, warn};

struct Shared {
    in_flight: watch::Sender<usize>,
    panicked: AtomicU64,
}

/// Launches fire-and-forget tasks and watches them finish
///
/// Every spawned future gets a supervisor that awaits its handle, so a
/// panicking remediation is logged and counted rather than lost.
#[derive(Clone)]
pub struct TaskLauncher {
    shared: Arc<Shared>,
}

impl TaskLauncher {
    pub fn new() -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                in_flight,
                panicked: AtomicU64::new(0),
            }),
        }
    }

    /// Run `future` on the runtime under supervision
    pub fn spawn<F>(&self, name: impl Into<String>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let shared = Arc::clone(&self.shared);
        shared.in_flight.send_modify(|n| *n += 1);
        gauge!("sentinel_tasks_in_flight").set(*shared.in_flight.borrow() as f64);
        debug!("Launching task {}", name);

        let handle = tokio::spawn(future);
        tokio::spawn(async move {
            match handle.await {
                Ok(()) => debug!("Task {} finished", name),
                Err(e) if e.is_panic() => {
                    error!("Task {} panicked", name);
                    shared.panicked.fetch_add(1, Ordering::Relaxed);
                    counter!("sentinel_tasks_panicked_total").increment(1);
                }
                Err(e) => warn!("Task {} did not complete: {}", name, e),
            }
            shared.in_flight.send_modify(|n| *n = n.saturating_sub(1));
            gauge!("sentinel_tasks_in_flight").set(*shared.in_flight.borrow() as f64);
        });
    }

    /// Tasks launched and not yet finished
    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.borrow()
    }

    /// Tasks that ended in a panic
    pub fn panicked(&self) -> u64 {
        self.shared.panicked.load(Ordering::Relaxed)
    }

    /// Wait until no launched task is running
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for TaskLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_idle_waits_for_tasks() {
        let launcher = TaskLauncher::new();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let done = Arc::clone(&done);
            launcher.spawn("sleeper", async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        launcher.wait_idle().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(launcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panics_are_counted() {
        let launcher = TaskLauncher::new();
        launcher.spawn("doomed", async {
            panic!("strategy blew up");
        });
        launcher.spawn("fine", async {});
        launcher.wait_idle().await;
        assert_eq!(launcher.panicked(), 1);
    }

    #[tokio::test]
    async fn test_idle_launcher_returns_immediately() {
        TaskLauncher::new().wait_idle().await;
    }
}
