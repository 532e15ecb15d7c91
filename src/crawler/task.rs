use std::path::{Path, PathBuf};

use crate::crawler::filename::derive_filename;

/// A single document to fetch. Only lives on the task queue between
/// enqueue and worker pickup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Extracted download URL
    pub url: String,

    /// Directory the document is written into
    pub dest_dir: PathBuf,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, dest_dir: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            dest_dir: dest_dir.as_ref().to_path_buf(),
        }
    }

    /// Filename the document is stored under
    pub fn filename(&self) -> String {
        derive_filename(&self.url)
    }

    /// Full destination path
    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir.join(self.filename())
    }
}

/// What happened to a task that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Body streamed to disk
    Downloaded { path: PathBuf, bytes: u64 },

    /// A regular file was already at the destination; no request was made
    Skipped { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_path_uses_derived_filename() {
        let task = DownloadTask::new(
            "https://x.thewercs.com/DirectDocumentDownloader/Document?prd=HRLS00001-3~~PDF~~MTR~~AGHS~~EN",
            "PDFs",
        );
        assert_eq!(task.dest_path(), PathBuf::from("PDFs").join("hrls00001-3-pdf-mtr-aghs-en.pdf"));
    }
}
