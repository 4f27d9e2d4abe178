//! Sink for detached work.
//!
//! Cache writes that are not needed before responding, and background
//! revalidations, are spawned here instead of being awaited. Failures are
//! logged and never reach the responding path.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;

use crate::Error;

/// Spawns and tracks detached tasks.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawn a detached task. Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, label: &'static str, task: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let mut tasks = self.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            if let Err(err) = task.await {
                tracing::warn!(task = label, error = %err, "background task failed");
            }
        });
    }

    /// Number of tasks not yet reaped.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Wait until every detached task, including ones spawned while
    /// waiting, has finished.
    pub async fn wait_idle(&self) {
        loop {
            let mut drained = std::mem::take(&mut *self.lock());
            if drained.is_empty() {
                return;
            }
            while let Some(joined) = drained.join_next().await {
                if let Err(err) = joined {
                    tracing::warn!(error = %err, "background task panicked or was cancelled");
                }
            }
        }
    }
}
