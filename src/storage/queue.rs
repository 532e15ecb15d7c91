use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::crawler::task::DownloadTask;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("task queue is closed")]
    Closed,

    #[error("task queue is full (capacity {0})")]
    Full(usize),
}

/// FIFO task queue shared by the download workers.
///
/// Sized up front to the number of tasks so the producer never waits. Once
/// closed, `pop_task` drains what is left and then returns `None`.
pub struct TaskQueue {
    capacity: usize,

    sender: Option<mpsc::Sender<DownloadTask>>,

    /// Workers take turns on the receiver
    receiver: Mutex<mpsc::Receiver<DownloadTask>>,
}

impl TaskQueue {
    /// Create a queue holding up to `capacity` tasks
    pub fn with_capacity(capacity: usize) -> Self {
        // tokio channels need a non-zero bound
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);

        Self {
            capacity,
            sender: Some(sender),
            receiver: Mutex::new(receiver),
        }
    }

    /// Build a closed queue pre-filled with `tasks`
    pub fn from_tasks(tasks: Vec<DownloadTask>) -> Result<Self, QueueError> {
        let mut queue = Self::with_capacity(tasks.len());
        for task in tasks {
            queue.push_task(task)?;
        }
        queue.close();
        Ok(queue)
    }

    /// Push a task without waiting
    pub fn push_task(&self, task: DownloadTask) -> Result<(), QueueError> {
        let sender = self.sender.as_ref().ok_or(QueueError::Closed)?;

        sender.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full(self.capacity),
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })?;

        Ok(())
    }

    /// Stop accepting tasks. Workers see `None` after the backlog is drained.
    pub fn close(&mut self) {
        if self.sender.take().is_some() {
            debug!("Task queue closed");
        }
    }

    /// Pop the next task, or `None` once the queue is closed and empty
    pub async fn pop_task(&self) -> Option<DownloadTask> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }
}
