//! Fire-and-forget remote writes.
//!
//! Cart, wishlist and address mutations are applied to the store first and
//! then mirrored to the server without the caller waiting. Results are
//! ignored and failures logged; the local state is never rolled back.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::api::ApiError;

/// Spawns remote writes and keeps their handles until they finish.
#[derive(Debug, Default)]
pub struct BackgroundWriter {
    tasks: JoinSet<()>,
}

impl BackgroundWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `write` in the background.
    ///
    /// Outside a Tokio runtime there is nothing to run it on, so the write is
    /// dropped with a warning; the next pull-sync reconciles.
    pub fn spawn<F>(&mut self, operation: &'static str, write: F)
    where
        F: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.reap();

        let Ok(handle) = Handle::try_current() else {
            warn!(operation, "No async runtime, remote write dropped");
            return;
        };

        self.tasks.spawn_on(
            async move {
                match write.await {
                    Ok(()) => debug!(operation, "Remote write completed"),
                    Err(e) => warn!(operation, error = %e, "Remote write failed"),
                }
            },
            &handle,
        );
    }

    /// Wait for every outstanding write.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Remote write task panicked");
            }
        }
    }

    /// Number of writes not yet reaped.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Drop handles of writes that already finished.
    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                warn!(error = %e, "Remote write task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_settle_waits_for_all_writes() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut writer = BackgroundWriter::new();

        for _ in 0..3 {
            let done = Arc::clone(&done);
            writer.spawn("test_write", async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        writer.spawn("failing_write", async {
            Err(ApiError::Endpoint("unreachable".to_string()))
        });

        writer.settle().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(writer.pending(), 0);
    }

    #[test]
    fn test_write_without_runtime_is_dropped() {
        let mut writer = BackgroundWriter::new();
        writer.spawn("no_runtime", async { Ok(()) });
        assert_eq!(writer.pending(), 0);
    }
}
