use crate::error::ScrapeError;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const START_URL_PATTERN: &str = r"^(https?://)?(www\.)?flatmates\.com\.au/?.*$";

/// A validated flatmates.com.au search URL, always carrying a scheme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartUrl(String);

impl StartUrl {
    /// Validate operator input and fill in `https://` when the scheme is missing
    pub fn parse(input: &str) -> Result<Self, ScrapeError> {
        let input = input.trim();
        let pattern = Regex::new(START_URL_PATTERN).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;

        if input.is_empty() || !pattern.is_match(input) {
            return Err(ScrapeError::InvalidUrl(input.to_string()));
        }

        if input.starts_with("http://") || input.starts_with("https://") {
            Ok(Self(input.to_string()))
        } else {
            Ok(Self(format!("https://{}", input)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of results page `page`
    pub fn page_url(&self, page: u32) -> String {
        let separator = if self.0.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.0, separator, page)
    }
}

impl fmt::Display for StartUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one scrape run needs to know
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Filtered search results page to start from
    pub start_url: StartUrl,
    /// CSV file rows are appended to
    pub output: PathBuf,
    /// Log of detail URLs already written to `output`
    pub scraped_links: PathBuf,
    /// JSON array of detail URLs to use instead of walking the results pages
    pub links_file: Option<PathBuf>,
    /// Stop after this many results pages
    pub max_pages: Option<u32>,
    /// Wait after each navigation so client-side rendering can finish
    pub settle_delay: Duration,
    /// Upper bound for a single page load
    pub page_timeout: Duration,
    /// Run Chrome without a visible window
    pub headless: bool,
}

impl ScrapeOptions {
    pub fn new(start_url: StartUrl) -> Self {
        Self {
            start_url,
            output: PathBuf::from("listing_data.csv"),
            scraped_links: PathBuf::from("scraped_links.txt"),
            links_file: None,
            max_pages: None,
            settle_delay: Duration::from_secs(3),
            page_timeout: Duration::from_secs(120),
            headless: true,
        }
    }
}
