//! Fire-and-forget work that runs off the request path.
//!
//! Tasks are spawned on the runtime and tracked so shutdown can wait for
//! them. A panic inside a task is caught in that task, logged and counted; it
//! never reaches the request that submitted the work or the process.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use greenlight_observability::track_background_panic;

#[derive(Clone, Default)]
pub struct BackgroundRunner {
    tracker: TaskTracker,
    panics: Arc<AtomicU64>,
}

impl BackgroundRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` without waiting for it. `name` only labels log lines.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let panics = Arc::clone(&self.panics);

        self.tracker.spawn(async move {
            if let Err(payload) = AssertUnwindSafe(task).catch_unwind().await {
                panics.fetch_add(1, Ordering::Relaxed);
                track_background_panic();
                error!(
                    task = name,
                    panic = %panic_message(payload.as_ref()),
                    "background task panicked"
                );
            }
        });
    }

    /// Tasks spawned so far that have not finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Panics caught since start-up.
    pub fn panic_count(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }

    /// Waits up to `grace` for in-flight tasks. Returns `false` when some were
    /// still running and have been abandoned.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        info!(in_flight = self.in_flight(), "waiting for background tasks");

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    abandoned = self.in_flight(),
                    "background tasks still running after {grace:?}"
                );
                false
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn test_panic_is_contained_and_counted() {
        let runner = BackgroundRunner::new();
        runner.spawn("exploding", async {
            panic!("boom");
        });

        assert!(runner.shutdown(Duration::from_secs(1)).await);
        assert_eq!(runner.panic_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_work() {
        let runner = BackgroundRunner::new();
        let done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&done);
        runner.spawn("slow", async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });

        assert!(runner.shutdown(Duration::from_secs(1)).await);
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_gives_up_after_grace() {
        let runner = BackgroundRunner::new();
        runner.spawn("stuck", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        assert!(!runner.shutdown(Duration::from_secs(30)).await);
        assert_eq!(runner.in_flight(), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
