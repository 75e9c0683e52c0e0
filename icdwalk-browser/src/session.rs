use crate::error::{BrowserError, Result, automation};
use crate::node::CdpNode;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use futures::StreamExt;
use icdwalk_core::TreeNode;
use icdwalk_core::node::selectors;
use icdwalk_core::wait::{DEFAULT_POLL_INTERVAL, poll_until};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_BROWSE_URL: &str = "https://icd.who.int/browse11/l-m/en#/";
pub const DEFAULT_ROOT_TIMEOUT: Duration = Duration::from_secs(3);

/// Options for launching the browser and locating the tree.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub sandbox: bool,
    /// How long to wait for the root table, and again for the first level
    /// after clicking it.
    pub root_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            root_timeout: DEFAULT_ROOT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SessionConfig {
    pub fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        if !self.sandbox {
            builder = builder.no_sandbox();
        }
        builder.build().map_err(BrowserError::LaunchError)
    }
}

/// A launched browser with a single page on the classification.
pub struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    config: SessionConfig,
}

impl Session {
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        let browser_config = config.browser_config()?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchError(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler event error: {}", e);
                }
            }
            debug!("CDP handler finished");
        });

        let page = browser.new_page("about:blank").await?;
        info!(
            "Browser launched ({})",
            if config.headless { "headless" } else { "headful" }
        );

        Ok(Self {
            browser,
            page,
            handler,
            config,
        })
    }

    pub async fn open(&self, url: &Url) -> Result<()> {
        info!("Navigating to {}", url);
        self.page.goto(url.as_str()).await?;
        Ok(())
    }

    /// Expand the classification root and return the first level of the
    /// tree in document order.
    pub async fn top_categories(&self) -> Result<Vec<CdpNode>> {
        let root = CdpNode::new(self.wait_for(selectors::ROOT_TABLE).await?);
        root.click().await?;
        self.wait_for(selectors::ROOT_ITEMS).await?;

        let categories: Vec<CdpNode> = self
            .page
            .find_elements(selectors::TOP_CATEGORIES)
            .await?
            .into_iter()
            .map(CdpNode::new)
            .collect();
        info!("Found {} top-level categories", categories.len());
        Ok(categories)
    }

    async fn wait_for(&self, selector: &str) -> Result<Element> {
        let found = poll_until(self.config.root_timeout, self.config.poll_interval, || async {
            let found = self
                .page
                .find_elements(selector)
                .await
                .map_err(automation)?;
            Ok(found.into_iter().next())
        })
        .await?;

        found.ok_or_else(|| BrowserError::Timeout(selector.to_string(), self.config.root_timeout))
    }

    /// Save the rendered body markup and a full-page screenshot.
    pub async fn snapshot(&self, html_path: &Path, png_path: &Path) -> Result<()> {
        for path in [html_path, png_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let body = self.page.find_element("body").await?;
        let html = body.inner_html().await?.unwrap_or_default();
        tokio::fs::write(html_path, html).await?;
        info!("Write to file ({}) success!", html_path.display());

        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), png_path)
            .await?;
        info!("Write to file ({}) success!", png_path.display());
        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser did not exit cleanly: {}", e);
        }
        self.handler.await?;
        debug!("Browser closed");
        Ok(())
    }
}
