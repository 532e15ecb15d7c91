use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::cli::config::BrowserSettings;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start browser session: {0}")]
    Session(#[source] WebDriverError),

    #[error("failed to navigate to {url}: {source}")]
    Navigate {
        url: String,
        #[source]
        source: WebDriverError,
    },

    #[error("failed to read rendered markup of {url}: {source}")]
    Markup {
        url: String,
        #[source]
        source: WebDriverError,
    },

    #[error("page {url} rendered no markup")]
    EmptyMarkup { url: String },
}

/// Supplies fully rendered markup for a listing page
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}

/// Renders pages in headless Chrome through a WebDriver endpoint.
///
/// Every call gets its own browser session, torn down before returning.
/// The listing pages never signal that client-side rendering has finished,
/// so the markup is read after a flat settle delay.
pub struct WebDriverRenderer {
    config: BrowserSettings,
}

impl WebDriverRenderer {
    pub fn new(config: BrowserSettings) -> Self {
        Self { config }
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.config.settle_delay_ms)
    }

    /// Open an isolated browser session
    async fn open(&self) -> Result<WebDriver, RenderError> {
        let mut caps = DesiredCapabilities::chrome();

        let viewport = &self.config.viewport;
        caps.add_chrome_arg(&format!("--window-size={},{}", viewport.width, viewport.height))
            .map_err(RenderError::Session)?;
        if self.config.headless {
            caps.set_headless().map_err(RenderError::Session)?;
        }
        caps.add_chrome_arg("--disable-gpu").map_err(RenderError::Session)?;
        caps.add_chrome_arg("--disable-dev-shm-usage").map_err(RenderError::Session)?;

        let driver = WebDriver::new(&self.config.webdriver_url, caps).await
            .map_err(RenderError::Session)?;

        driver.set_page_load_timeout(Duration::from_secs(self.config.page_load_timeout_secs)).await
            .map_err(RenderError::Session)?;

        debug!("Browser session opened on {}", self.config.webdriver_url);
        Ok(driver)
    }

    async fn capture(&self, driver: &WebDriver, url: &str) -> Result<String, RenderError> {
        debug!("Navigating to: {}", url);
        driver.goto(url).await
            .map_err(|source| RenderError::Navigate { url: url.to_string(), source })?;

        sleep(self.settle_delay()).await;

        let markup = driver.source().await
            .map_err(|source| RenderError::Markup { url: url.to_string(), source })?;

        if markup.trim().is_empty() {
            return Err(RenderError::EmptyMarkup { url: url.to_string() });
        }
        Ok(markup)
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let driver = self.open().await?;
        let result = self.capture(&driver, url).await;

        if let Err(e) = driver.quit().await {
            error!("Error closing browser session: {}", e);
        }

        result
    }
}
