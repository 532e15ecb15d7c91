use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MarkupStoreError {
    #[error("failed to open markup store {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to append to markup store {}: {source}", .path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read markup store {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only file holding the rendered markup of every listing page.
///
/// Its presence, at any size, marks the render phase of a run as done.
/// There is no per-page bookkeeping.
#[derive(Debug, Clone)]
pub struct MarkupStore {
    path: PathBuf,
}

impl MarkupStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a previous run already produced the store
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Append one page worth of markup, creating the store if needed
    pub async fn append(&self, markup: &str) -> Result<(), MarkupStoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| MarkupStoreError::Open { path: self.path.clone(), source })?;

        file.write_all(markup.as_bytes()).await
            .map_err(|source| MarkupStoreError::Append { path: self.path.clone(), source })?;
        file.flush().await
            .map_err(|source| MarkupStoreError::Append { path: self.path.clone(), source })?;

        debug!("Appended {} bytes to {}", markup.len(), self.path.display());
        Ok(())
    }

    /// Read back everything accumulated so far. Bytes that are not valid
    /// UTF-8 are replaced rather than failing the read.
    pub async fn read(&self) -> Result<String, MarkupStoreError> {
        let bytes = fs::read(&self.path).await
            .map_err(|source| MarkupStoreError::Read { path: self.path.clone(), source })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_concatenates_pages() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkupStore::new(dir.path().join("listing.html"));
        assert!(!store.exists().await);

        store.append("<html>page 0</html>").await.unwrap();
        assert!(store.exists().await);
        store.append("<html>page 1</html>").await.unwrap();

        assert_eq!(store.read().await.unwrap(), "<html>page 0</html><html>page 1</html>");
    }

    #[tokio::test]
    async fn test_empty_store_still_counts_as_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkupStore::new(dir.path().join("listing.html"));
        store.append("").await.unwrap();

        assert!(store.exists().await);
        assert_eq!(store.read().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.html");
        let anchor = r#"<a href="https://www.bio-rad.com/sites/default/files/webroot/web/pdf/lit-1.pdf">x</a>"#;
        let mut raw = anchor.as_bytes().to_vec();
        raw.push(0xFF);
        std::fs::write(&path, raw).unwrap();

        let markup = MarkupStore::new(&path).read().await.unwrap();
        assert!(markup.starts_with(anchor));
        assert!(markup.ends_with('\u{FFFD}'));
        assert_eq!(
            crate::crawler::extractor::extract_links(&markup),
            vec!["https://www.bio-rad.com/sites/default/files/webroot/web/pdf/lit-1.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_read_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkupStore::new(dir.path().join("absent.html"));

        assert!(matches!(store.read().await, Err(MarkupStoreError::Read { .. })));
    }

    #[tokio::test]
    async fn test_append_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = MarkupStore::new(dir.path().join("no-such-dir").join("listing.html"));

        assert!(matches!(store.append("<html/>").await, Err(MarkupStoreError::Open { .. })));
    }
}
