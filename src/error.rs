use thiserror::Error;

/// Errors the scraper reports to the operator by kind
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid CSS selector {selector}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
}
