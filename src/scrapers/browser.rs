use crate::error::{Result, ScoutError};
use crate::search::PageFetcher;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Page fetcher using headless Chrome, for search pages that only render
/// their listings with JavaScript.
pub struct BrowserPageFetcher {
    browser: Browser,
    base_url: Url,
    settle: Duration,
}

impl BrowserPageFetcher {
    /// Launch headless Chrome for pages under `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScoutError::Configuration(format!("invalid base URL {base_url}: {e}")))?;

        info!("Launching headless Chrome...");
        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .map_err(|e| {
                ScoutError::Configuration(format!("failed to build launch options: {e}"))
            })?;
        let browser = Browser::new(options).map_err(|e| {
            ScoutError::Configuration(format!("failed to launch Chrome browser: {e}"))
        })?;

        Ok(Self {
            browser,
            base_url,
            settle: Duration::from_secs(8),
        })
    }

    /// How long to let the page run scripts before reading it
    pub fn with_settle_time(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

fn render(browser: &Browser, url: &str, settle: Duration) -> anyhow::Result<String> {
    let tab = browser.new_tab()?;
    tab.navigate_to(url)?;
    tab.wait_until_navigated()?;

    debug!("Waiting {:?} for page to fully load...", settle);
    thread::sleep(settle);

    // Accept cookies if present
    let _ = tab.evaluate(
        r#"
        const button = document.querySelector('button[id*="accept"], button[id*="consent"]');
        if (button) button.click();
        "#,
        false,
    );

    let html = tab
        .evaluate("document.documentElement.outerHTML", false)?
        .value
        .and_then(|value| value.as_str().map(String::from))
        .unwrap_or_default();
    let _ = tab.close(true);
    Ok(html)
}

#[async_trait]
impl PageFetcher for BrowserPageFetcher {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let browser = self.browser.clone();
        let target = url.to_string();
        let settle = self.settle;

        let html = tokio::task::spawn_blocking(move || render(&browser, &target, settle))
            .await
            .map_err(|e| ScoutError::Provider(format!("browser task failed: {e}")))?
            .map_err(|e| ScoutError::Provider(format!("browser fetch of {url} failed: {e:#}")))?;

        if html.is_empty() {
            return Err(ScoutError::Provider(format!("empty page from {url}")));
        }
        debug!("Rendered {} bytes of HTML", html.len());
        Ok(html)
    }
}
