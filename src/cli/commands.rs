use anyhow::{Result, Context};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::browser::session::WebDriverRenderer;
use crate::cli::config::HarvestConfig;
use crate::cli::ConfigSource;
use crate::crawler::controller::HarvestController;
use crate::crawler::extractor::LinkExtractor;
use crate::crawler::filename::derive_filename;
use crate::crawler::task::{DownloadOutcome, DownloadTask};
use crate::storage::download::{Downloader, Fetcher};
use crate::storage::markup::MarkupStore;

/// Command line overrides for a run
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub workers: Option<usize>,
    pub output: Option<PathBuf>,
}

impl RunOverrides {
    fn apply(self, config: &mut HarvestConfig) {
        if let Some(start) = self.start {
            config.crawl.start_page = start;
        }
        if let Some(end) = self.end {
            config.crawl.end_page = end;
        }
        if let Some(workers) = self.workers {
            config.download.workers = workers;
        }
        if let Some(output) = self.output {
            config.download.output_dir = output;
        }
    }
}

fn load_config(source: &ConfigSource) -> Result<HarvestConfig> {
    HarvestConfig::resolve(source.config.as_deref(), source.profile.as_deref())
}

/// Run the full render, extract and download pipeline
pub async fn run(source: ConfigSource, overrides: RunOverrides) -> Result<()> {
    let mut config = load_config(&source)?;
    overrides.apply(&mut config);
    config.validate()?;

    info!(
        "Pages {}..{}, {} workers, saving to {}",
        config.crawl.start_page,
        config.crawl.end_page,
        config.download.workers,
        config.download.output_dir.display()
    );

    let renderer = WebDriverRenderer::new(config.browser.clone());
    let downloader = Arc::new(Downloader::new(config.download.user_agent.as_deref())?);

    let controller = HarvestController::new(config, renderer, downloader);
    controller.run().await?;

    Ok(())
}

/// Print the links in the markup store together with their target filenames
pub async fn extract(source: ConfigSource, json: bool) -> Result<()> {
    let config = load_config(&source)?;
    let store = MarkupStore::new(&config.storage.markup_store);

    let markup = store.read().await
        .context("Could not read the markup store")?;
    let urls = LinkExtractor::default().extract_links(&markup);

    if json {
        let entries: Vec<serde_json::Value> = urls.iter()
            .map(|url| serde_json::json!({ "url": url, "filename": derive_filename(url) }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for url in &urls {
            println!("{}\t{}", derive_filename(url), url);
        }
    }

    info!("Extracted {} document URLs.", urls.len());
    Ok(())
}

/// Download one URL with the configured downloader
pub async fn fetch(url: String, source: ConfigSource, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(&source)?;
    let output_dir = output.unwrap_or(config.download.output_dir);

    let downloader = Downloader::new(config.download.user_agent.as_deref())?;
    let task = DownloadTask::new(url, &output_dir);

    match downloader.fetch(&task).await
        .context(format!("Download error for {}", task.url))?
    {
        DownloadOutcome::Downloaded { path, bytes } => {
            println!("Saved {} ({} bytes)", path.display(), bytes);
        }
        DownloadOutcome::Skipped { path } => {
            println!("Already present: {}", path.display());
        }
    }

    Ok(())
}

/// List all available configuration profiles
pub fn list_profiles() -> Result<()> {
    let profiles = HarvestConfig::list_profiles()?;

    println!("Available configuration profiles:");
    for profile in profiles {
        println!("  - {}", profile);
    }

    Ok(())
}

/// Manage a specific configuration profile
pub fn manage_profile(profile_name: String) -> Result<()> {
    match HarvestConfig::load_profile(&profile_name) {
        Ok(config) => {
            println!("Profile: {}", profile_name);
            println!("{}", serde_yaml::to_string(&config)?);
        },
        Err(_) => {
            warn!("Profile '{}' does not exist. Creating a default profile.", profile_name);
            let config = HarvestConfig::default();
            config.save_as_profile(&profile_name)?;
            println!("Created default profile: {}", profile_name);
        }
    }

    Ok(())
}

/// Show the current configuration
pub fn show_config(source: ConfigSource) -> Result<()> {
    let config = load_config(&source)?;
    println!("Current configuration:");
    println!("{}", serde_yaml::to_string(&config)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = HarvestConfig::default();
        RunOverrides {
            start: None,
            end: Some(40),
            workers: Some(5),
            output: None,
        }.apply(&mut config);

        assert_eq!(config.crawl.start_page, 0);
        assert_eq!(config.crawl.end_page, 40);
        assert_eq!(config.download.workers, 5);
        assert_eq!(config.download.output_dir, PathBuf::from("PDFs"));
    }

    #[tokio::test]
    async fn test_extract_reads_store_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("listing.html");
        std::fs::write(
            &store_path,
            r#"<option value="https://bio-rad-sds.thewercs.com/DirectDocumentDownloader/Document?prd=A~~B">A</option>"#,
        ).unwrap();

        let mut config = HarvestConfig::default();
        config.storage.markup_store = store_path;
        let config_path = dir.path().join("harvest.yaml");
        config.save_to_file(&config_path).unwrap();

        let source = ConfigSource { config: Some(config_path), profile: None };
        assert!(extract(source, true).await.is_ok());
    }

    #[test]
    fn test_show_config_uses_given_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("harvest.yaml");

        let mut config = HarvestConfig::default();
        config.download.workers = 7;
        config.save_to_file(&config_path).unwrap();
        let source = ConfigSource { config: Some(config_path.clone()), profile: None };
        assert!(show_config(source).is_ok());

        // Rejected by validation, so the file rather than the default profile was loaded
        config.download.workers = 0;
        config.save_to_file(&config_path).unwrap();
        let source = ConfigSource { config: Some(config_path), profile: None };
        assert!(show_config(source).is_err());
    }

    #[tokio::test]
    async fn test_extract_without_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HarvestConfig::default();
        config.storage.markup_store = dir.path().join("missing.html");
        let config_path = dir.path().join("harvest.yaml");
        config.save_to_file(&config_path).unwrap();

        let source = ConfigSource { config: Some(config_path), profile: None };
        assert!(extract(source, false).await.is_err());
    }
}
