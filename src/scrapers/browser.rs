use crate::scrapers::traits::PageSource;
use crate::scrapers::types::ScrapeOptions;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const WINDOW_SIZE: (u32, u32) = (1920, 1080);
const READY_POLL: Duration = Duration::from_millis(250);

/// Page source backed by a single headless Chrome tab
pub struct BrowserPageSource {
    // Chrome exits when the last handle is dropped
    _browser: Browser,
    tab: Arc<Tab>,
    settle_delay: Duration,
    page_timeout: Duration,
}

impl BrowserPageSource {
    /// Launch Chrome and open the tab every page is loaded into
    pub fn launch(options: &ScrapeOptions) -> Result<Self> {
        info!("Launching Chrome (headless: {})...", options.headless);

        let launch_options = LaunchOptions::default_builder()
            .headless(options.headless)
            .window_size(Some(WINDOW_SIZE))
            .idle_browser_timeout(options.page_timeout * 2)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(launch_options)
            .context("Failed to launch Chrome browser")?;

        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_default_timeout(options.page_timeout);

        Ok(Self {
            _browser: browser,
            tab,
            settle_delay: options.settle_delay,
            page_timeout: options.page_timeout,
        })
    }
}

#[async_trait]
impl PageSource for BrowserPageSource {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();
        let settle_delay = self.settle_delay;
        let page_timeout = self.page_timeout;

        tokio::task::spawn_blocking(move || load_page(&tab, &url, settle_delay, page_timeout))
            .await
            .context("Browser task panicked")?
    }

    fn source_name(&self) -> &'static str {
        "Chrome"
    }
}

fn load_page(tab: &Tab, url: &str, settle_delay: Duration, page_timeout: Duration) -> Result<String> {
    debug!("Navigating to {}", url);

    tab.navigate_to(url)
        .with_context(|| format!("Failed to navigate to {}", url))?;
    tab.wait_until_navigated()
        .with_context(|| format!("Timed out loading {}", url))?;

    // Listing tiles are rendered client-side after the load event
    thread::sleep(settle_delay);
    wait_for_ready_state(tab, page_timeout)?;

    let html_result = tab
        .evaluate("document.documentElement.outerHTML", false)
        .context("Failed to read page HTML")?;

    let html = match html_result.value {
        Some(value) => value.as_str().unwrap_or("").to_string(),
        None => {
            warn!("Could not get HTML from {}", url);
            String::new()
        }
    };

    debug!("Loaded {} bytes of HTML from {}", html.len(), url);
    Ok(html)
}

fn wait_for_ready_state(tab: &Tab, page_timeout: Duration) -> Result<()> {
    let started = Instant::now();

    loop {
        let state = tab
            .evaluate("document.readyState", false)
            .context("Failed to read document.readyState")?;

        if state.value.as_ref().and_then(|v| v.as_str()) == Some("complete") {
            return Ok(());
        }

        if started.elapsed() >= page_timeout {
            warn!("Document still not complete after {:?}, continuing", page_timeout);
            return Ok(());
        }

        thread::sleep(READY_POLL);
    }
}
