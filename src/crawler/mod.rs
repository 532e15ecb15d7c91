pub mod controller;
pub mod extractor;
pub mod filename;
pub mod pool;
pub mod task;

// Re-export common types
pub use controller::HarvestController;
pub use extractor::{extract_links, LinkExtractor};
pub use filename::derive_filename;
pub use pool::WorkerPool;
pub use task::{DownloadOutcome, DownloadTask};
