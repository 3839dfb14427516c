// ─── Worker Pool ───
// Bounded concurrency with an explicit per-phase join barrier.

use std::future::Future;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::core::error::LauncherResult;

/// Bounded pool shared by every phase of one install or launch.
///
/// `barrier` is the only way to run work on it: the call returns once every
/// task has settled, or as soon as the first task fails. On failure the
/// remaining in-flight tasks are dropped and whatever they already wrote to
/// disk stays there.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    limit: usize,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// One worker per available CPU.
    pub fn per_cpu() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn barrier<I, Fut, T>(&self, phase: &str, tasks: I) -> LauncherResult<Vec<T>>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = LauncherResult<T>>,
    {
        let tasks: Vec<Fut> = tasks.into_iter().collect();
        info!(
            "Phase '{}': {} tasks, concurrency={}",
            phase,
            tasks.len(),
            self.limit
        );

        let results = stream::iter(tasks)
            .buffer_unordered(self.limit)
            .try_collect::<Vec<T>>()
            .await?;

        debug!("Phase '{}' complete", phase);
        Ok(results)
    }
}
