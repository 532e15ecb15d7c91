use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::browser::session::Renderer;
use crate::cli::config::HarvestConfig;
use crate::crawler::extractor::LinkExtractor;
use crate::crawler::pool::WorkerPool;
use crate::storage::download::Fetcher;
use crate::storage::markup::MarkupStore;

/// Drives one harvest: render-or-skip, read the markup store, extract, download
pub struct HarvestController<R: Renderer, F: Fetcher + 'static> {
    config: HarvestConfig,
    renderer: R,
    store: MarkupStore,
    extractor: LinkExtractor,
    pool: WorkerPool<F>,
}

impl<R: Renderer, F: Fetcher + 'static> HarvestController<R, F> {
    pub fn new(config: HarvestConfig, renderer: R, fetcher: Arc<F>) -> Self {
        let store = MarkupStore::new(&config.storage.markup_store);
        let pool = WorkerPool::new(fetcher, config.download.workers, &config.download.output_dir);

        Self {
            config,
            renderer,
            store,
            extractor: LinkExtractor::default(),
            pool,
        }
    }

    /// Run the whole pipeline. Returns the number of extracted URLs dispatched.
    ///
    /// Only a failure to read back the markup store is an error; render,
    /// append and download failures are logged and the run carries on.
    pub async fn run(&self) -> Result<usize> {
        if self.store.exists().await {
            info!(
                "Markup store {} already exists. Skipping rendering.",
                self.store.path().display()
            );
        } else {
            info!("Markup store not found. Rendering listing pages...");
            self.render_pages().await;
        }

        let markup = self.store.read().await
            .context("Could not read the markup store")?;

        let urls = self.extractor.extract_links(&markup);
        let total = urls.len();
        info!("Extracted {} document URLs, downloading with {} workers.", total, self.pool.workers());

        self.pool.run(urls).await
            .context("Failed to queue download tasks")?;

        info!("All downloads completed.");
        Ok(total)
    }

    /// Render every page of the configured range into the markup store
    async fn render_pages(&self) {
        let crawl = &self.config.crawl;

        for page in crawl.start_page..crawl.end_page {
            let url = crawl.page_url(page);
            info!("Rendering page {}: {}", page, url);

            let markup = match self.renderer.render(&url).await {
                Ok(markup) => markup,
                Err(e) => {
                    error!("Failed to render page {}: {}", page, e);
                    continue;
                }
            };

            if let Err(e) = self.store.append(&markup).await {
                warn!("Failed to store markup for page {}: {}", page, e);
            }
        }
    }
}
