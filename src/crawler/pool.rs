use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, info};

use crate::crawler::task::{DownloadOutcome, DownloadTask};
use crate::storage::download::Fetcher;
use crate::storage::queue::{QueueError, TaskQueue};

/// Fixed-size set of download workers draining one shared task queue
pub struct WorkerPool<F: Fetcher + 'static> {
    fetcher: Arc<F>,
    workers: usize,
    output_dir: PathBuf,
}

impl<F: Fetcher + 'static> WorkerPool<F> {
    pub fn new(fetcher: Arc<F>, workers: usize, output_dir: impl AsRef<Path>) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Download every URL and wait for all workers to exit.
    ///
    /// Each URL is handed to exactly one worker. Failures are logged and the
    /// worker moves on. Returns how many tasks were picked up, skips included.
    pub async fn run(&self, urls: Vec<String>) -> Result<usize, QueueError> {
        let total = urls.len();
        let tasks = urls.into_iter()
            .map(|url| DownloadTask::new(url, &self.output_dir))
            .collect();
        let queue = Arc::new(TaskQueue::from_tasks(tasks)?);

        info!("Starting {} download workers for {} tasks", self.workers, total);

        let mut handles = Vec::with_capacity(self.workers);
        for i in 0..self.workers {
            let queue = queue.clone();
            let fetcher = self.fetcher.clone();

            handles.push(task::spawn(async move {
                Self::work(i, queue, fetcher).await
            }));
        }

        let mut processed = 0;
        for handle in handles {
            match handle.await {
                Ok(count) => processed += count,
                Err(e) => error!("Download worker aborted: {}", e),
            }
        }

        debug!("All {} workers finished, {} of {} tasks processed", self.workers, processed, total);
        Ok(processed)
    }

    async fn work(id: usize, queue: Arc<TaskQueue>, fetcher: Arc<F>) -> usize {
        debug!("Worker {} started", id);
        let mut processed = 0;

        while let Some(task) = queue.pop_task().await {
            processed += 1;

            match fetcher.fetch(&task).await {
                Ok(DownloadOutcome::Downloaded { path, .. }) => {
                    debug!("Worker {} saved {}", id, path.display());
                }
                Ok(DownloadOutcome::Skipped { path }) => {
                    debug!("Worker {} skipped existing {}", id, path.display());
                }
                Err(e) => {
                    error!("Download error for {}: {}", task.url, e);
                }
            }
        }

        debug!("Worker {} finished after {} tasks", id, processed);
        processed
    }
}
