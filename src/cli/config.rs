use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use tracing::{info, debug, error};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HarvestConfig {
    pub crawl: CrawlSettings,
    pub browser: BrowserSettings,
    pub download: DownloadSettings,
    pub storage: StorageSettings,
}

/// Listing pages to render
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrawlSettings {
    /// Listing URL template. `{page}` is replaced by the page index,
    /// otherwise the index is appended.
    pub base_url: String,
    /// First page index (inclusive)
    pub start_page: u32,
    /// Last page index (exclusive)
    pub end_page: u32,
}

/// Render collaborator settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport: Viewport,
    /// Flat wait after navigation before the markup is read, in milliseconds.
    /// The listing pages give no "render complete" signal.
    pub settle_delay_ms: u64,
    pub page_load_timeout_secs: u64,
}

/// Browser viewport settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Download settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub user_agent: Option<String>,
}

/// Storage settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageSettings {
    /// Accumulated rendered markup of every listing page
    pub markup_store: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            crawl: CrawlSettings {
                base_url: "https://www.bio-rad.com/en-us/literature-library?facets_query=&page=".to_string(),
                start_page: 0,
                end_page: 10,
            },
            browser: BrowserSettings {
                webdriver_url: "http://localhost:9515".to_string(),
                headless: true,
                viewport: Viewport {
                    width: 1920,
                    height: 1080,
                },
                settle_delay_ms: 5000,
                page_load_timeout_secs: 60,
            },
            download: DownloadSettings {
                output_dir: PathBuf::from("PDFs"),
                workers: 20,
                user_agent: None,
            },
            storage: StorageSettings {
                markup_store: PathBuf::from("bio-rad-msds.html"),
            },
        }
    }
}

impl CrawlSettings {
    /// Build the listing URL for a page index
    pub fn page_url(&self, page: u32) -> String {
        if self.base_url.contains("{page}") {
            self.base_url.replace("{page}", &page.to_string())
        } else {
            format!("{}{}", self.base_url, page)
        }
    }
}

impl HarvestConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        let mut path = if let Some(proj_dirs) = directories::ProjectDirs::from("com", "pdf-harvester", "pdf-harvester") {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        };

        // Create the profiles directory if it doesn't exist
        path.push("profiles");
        if !path.exists() {
            if let Err(e) = fs::create_dir_all(&path) {
                error!("Failed to create config directory: {}", e);
            }
        }

        path.pop();
        path
    }

    /// Load the default configuration
    pub fn load_default() -> Result<Self> {
        let config_path = Self::config_dir().join("default.yaml");

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            info!("Default configuration not found. Creating...");
            let config = Self::default();
            config.save_as_default()?;
            Ok(config)
        }
    }

    /// Load a configuration profile
    pub fn load_profile(profile: &str) -> Result<Self> {
        let profile_path = Self::config_dir().join("profiles").join(format!("{}.yaml", profile));

        if profile_path.exists() {
            Self::load_from_file(&profile_path)
        } else {
            anyhow::bail!("Profile '{}' not found", profile)
        }
    }

    /// Resolve the configuration for a command: explicit file, then profile, then default
    pub fn resolve(config_file: Option<&Path>, profile: Option<&str>) -> Result<Self> {
        let config = match (config_file, profile) {
            (Some(path), _) => Self::load_from_file(path)?,
            (None, Some(name)) => Self::load_profile(name)
                .context(format!("Failed to load profile: {}", name))?,
            (None, None) => Self::load_default()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.workers == 0 {
            anyhow::bail!("download.workers must be at least 1");
        }
        if self.crawl.start_page > self.crawl.end_page {
            anyhow::bail!(
                "crawl.start_page ({}) is after crawl.end_page ({})",
                self.crawl.start_page,
                self.crawl.end_page
            );
        }
        Ok(())
    }

    /// Save the configuration as the default
    pub fn save_as_default(&self) -> Result<()> {
        let config_path = Self::config_dir().join("default.yaml");
        self.save_to_file(&config_path)
    }

    /// Save the configuration as a profile
    pub fn save_as_profile(&self, profile: &str) -> Result<()> {
        let profiles_dir = Self::config_dir().join("profiles");
        let profile_path = profiles_dir.join(format!("{}.yaml", profile));
        self.save_to_file(&profile_path)
    }

    /// Save the configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// List all available profiles
    pub fn list_profiles() -> Result<Vec<String>> {
        let profiles_dir = Self::config_dir().join("profiles");

        if !profiles_dir.exists() {
            return Ok(vec![]);
        }

        let mut profiles = Vec::new();

        for entry in fs::read_dir(profiles_dir)? {
            let path = entry?.path();

            if path.is_file() && path.extension().map_or(false, |ext| ext == "yaml") {
                if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                    profiles.push(name.to_string());
                }
            }
        }

        profiles.sort();
        Ok(profiles)
    }
}
