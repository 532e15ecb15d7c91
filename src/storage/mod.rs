pub mod download;
pub mod markup;
pub mod queue;

// Re-export common types
pub use download::{Downloader, DownloadError, Fetcher};
pub use markup::{MarkupStore, MarkupStoreError};
pub use queue::{QueueError, TaskQueue};
