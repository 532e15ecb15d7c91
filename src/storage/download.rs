use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::crawler::task::{DownloadOutcome, DownloadTask};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("error fetching {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} failed with status: {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error creating file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading body of {url}: {source}")]
    Stream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error saving document to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one download task. The worker pool is generic over this so it can
/// be driven without a network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, task: &DownloadTask) -> Result<DownloadOutcome, DownloadError>;
}

/// Fetch-and-persist with an existence short-circuit.
///
/// A regular file already sitting at the destination counts as done, which
/// is the only de-duplication for repeated URLs and re-runs. A transfer that
/// fails midway leaves its partial file behind, and the next run will skip it.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(user_agent: Option<&str>) -> Result<Self, DownloadError> {
        let mut builder = Client::builder();
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }

        let client = builder.build().map_err(DownloadError::Client)?;
        Ok(Self { client })
    }

    /// Download `url` into `dest_dir/filename` unless that file already exists
    pub async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        filename: &str,
    ) -> Result<DownloadOutcome, DownloadError> {
        let path = dest_dir.join(filename);

        if is_regular_file(&path).await {
            info!("File already exists, skipping: {}", path.display());
            return Ok(DownloadOutcome::Skipped { path });
        }

        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await
            .map_err(|source| DownloadError::Request { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status { url: url.to_string(), status });
        }

        // Concurrent workers may race here; creating an existing directory is fine
        fs::create_dir_all(dest_dir).await
            .map_err(|source| DownloadError::CreateDir { path: dest_dir.to_path_buf(), source })?;

        let mut file = fs::File::create(&path).await
            .map_err(|source| DownloadError::CreateFile { path: path.clone(), source })?;

        let mut bytes = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|source| DownloadError::Stream { url: url.to_string(), source })?;
            file.write_all(&chunk).await
                .map_err(|source| DownloadError::Write { path: path.clone(), source })?;
            bytes += chunk.len() as u64;
        }

        file.flush().await
            .map_err(|source| DownloadError::Write { path: path.clone(), source })?;

        info!("Downloaded: {} ({} bytes)", path.display(), bytes);
        Ok(DownloadOutcome::Downloaded { path, bytes })
    }
}

#[async_trait]
impl Fetcher for Downloader {
    async fn fetch(&self, task: &DownloadTask) -> Result<DownloadOutcome, DownloadError> {
        self.download(&task.url, &task.dest_dir, &task.filename()).await
    }
}

async fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
