use anyhow::Result;
use async_trait::async_trait;

/// Anything that can turn a URL into the rendered HTML of that page
/// This keeps navigation (browser, plain HTTP, test fixtures) apart from extraction
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load `url` and return the document HTML once the page has settled
    async fn fetch_html(&self, url: &str) -> Result<String>;

    /// Get the name of the page source
    fn source_name(&self) -> &'static str;
}
