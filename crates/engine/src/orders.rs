use std::future::Future;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use common::{Error, Result};

/// Maximum number of live order submissions in flight per connector.
pub const DEFAULT_ORDER_CAPACITY: usize = 32;

/// Bounded set of background order submissions.
///
/// The tick loop never waits on a submission: outcomes are reported by the
/// submission future itself. Finished tasks are reaped on every `spawn`;
/// `abort_all` cancels whatever is still in flight.
pub struct OrderTasks {
    tasks: JoinSet<()>,
    capacity: usize,
}

impl OrderTasks {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Spawn a submission. Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, submission: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        if self.tasks.len() >= self.capacity {
            warn!(in_flight = self.tasks.len(), "Order backlog full, dropping submission");
            return Err(Error::OrderBacklog(self.tasks.len()));
        }
        self.tasks.spawn(submission);
        Ok(())
    }

    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.tasks.len()
    }

    pub fn abort_all(&mut self) {
        if !self.tasks.is_empty() {
            debug!(in_flight = self.tasks.len(), "Aborting outstanding order submissions");
        }
        self.tasks.abort_all();
    }

    fn reap(&mut self) {
        while let Some(done) = self.tasks.try_join_next() {
            if let Err(e) = done {
                if e.is_panic() {
                    warn!(error = %e, "Order submission task panicked");
                }
            }
        }
    }
}

impl Default for OrderTasks {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER_CAPACITY)
    }
}

/// Indent a JSON response body for the log; other bodies pass through.
pub(crate) fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn full_set_rejects_submission() {
        let mut tasks = OrderTasks::new(2);
        for _ in 0..2 {
            tasks.spawn(std::future::pending()).unwrap();
        }
        let err = tasks.spawn(async {}).unwrap_err();
        assert!(matches!(err, Error::OrderBacklog(2)));
        tasks.abort_all();
    }

    #[tokio::test]
    async fn finished_tasks_free_capacity() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut tasks = OrderTasks::new(1);

        let counter = done.clone();
        tasks
            .spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        while done.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        // Give the runtime a moment to mark the task complete.
        while tasks.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(tasks.spawn(async {}).is_ok());
    }

    #[test]
    fn pretty_body_indents_json_only() {
        assert_eq!(pretty_body(r#"{"orderId":1}"#), "{\n  \"orderId\": 1\n}");
        assert_eq!(pretty_body("<html>"), "<html>");
    }

    #[tokio::test]
    async fn abort_all_cancels_in_flight() {
        let mut tasks = OrderTasks::new(4);
        tasks.spawn(std::future::pending()).unwrap();
        tasks.spawn(std::future::pending()).unwrap();
        tasks.abort_all();
        while tasks.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(tasks.in_flight(), 0);
    }
}
