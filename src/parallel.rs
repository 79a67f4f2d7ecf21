use crate::error::{RepoError, Result};
use crate::metadata::AddonMetadata;
use crate::processors::{fetch_addon, FetchContext};
use futures::future::join_all;
use indicatif::ProgressBar;
use log::error;
use std::future::Future;
use tokio::task::JoinHandle;

/// Outcome of one worker, tagged with the location it processed
#[derive(Debug)]
pub struct WorkerResult {
    /// Location string as given on input
    pub location: String,
    /// Packaged metadata or the failure that stopped the worker
    pub outcome: Result<AddonMetadata>,
}

/// A spawned task fetching one add-on
pub struct AddonWorker {
    location: String,
    handle: JoinHandle<Result<AddonMetadata>>,
}

impl AddonWorker {
    /// Starts a worker running `task` on the runtime
    pub fn spawn<F>(location: String, task: F) -> Self
    where
        F: Future<Output = Result<AddonMetadata>> + Send + 'static,
    {
        Self {
            location,
            handle: tokio::spawn(task),
        }
    }

    /// Waits for the worker; a panicked task still reports a failure
    pub async fn join(self) -> WorkerResult {
        let outcome = match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(RepoError::Worker(format!("Addon worker did not report result: {}", e))),
        };
        WorkerResult {
            location: self.location,
            outcome,
        }
    }
}

/// Runs one worker per add-on location, with no concurrency cap
pub struct ParallelFetcher {
    progress: Option<ProgressBar>,
}

impl ParallelFetcher {
    /// Creates a fetcher without progress reporting
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Ticks `progress` once per finished worker
    pub fn with_progress(progress: ProgressBar) -> Self {
        Self {
            progress: Some(progress),
        }
    }

    /// Runs all tasks concurrently and returns their results in input order
    ///
    /// Every task runs to completion; a failing task never cancels its siblings.
    pub async fn process<F>(&self, tasks: Vec<(String, F)>) -> Vec<WorkerResult>
    where
        F: Future<Output = Result<AddonMetadata>> + Send + 'static,
    {
        let workers: Vec<AddonWorker> = tasks
            .into_iter()
            .map(|(location, task)| {
                let progress = self.progress.clone();
                AddonWorker::spawn(location, async move {
                    let outcome = task.await;
                    if let Some(progress) = progress {
                        progress.inc(1);
                    }
                    outcome
                })
            })
            .collect();

        join_all(workers.into_iter().map(AddonWorker::join)).await
    }

    /// Fetches every location with the default resolver
    pub async fn fetch_all(&self, locations: &[String], ctx: &FetchContext) -> Vec<WorkerResult> {
        let tasks = locations
            .iter()
            .map(|location| {
                let ctx = ctx.clone();
                let task_location = location.clone();
                (location.clone(), async move { fetch_addon(&task_location, &ctx).await })
            })
            .collect();
        self.process(tasks).await
    }
}

impl Default for ParallelFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwraps worker results in order, failing with the first tagged error
///
/// All failures are logged before the first one is returned.
pub fn collect_results(results: Vec<WorkerResult>) -> Result<Vec<AddonMetadata>> {
    let mut addons = Vec::with_capacity(results.len());
    let mut first_error = None;

    for result in results {
        match result.outcome {
            Ok(metadata) => addons.push(metadata),
            Err(e) => {
                error!("{}: {}", result.location, e);
                if first_error.is_none() {
                    first_error = Some(RepoError::for_addon(&result.location, e));
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(addons),
    }
}
