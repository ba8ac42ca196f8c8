use crate::scrapers::types::{ScrapeOptions, StartUrl};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

const URL_PROMPT: &str = "Please input the URL of the filtered listing page: ";

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "flatmates-scraper")]
#[command(about = "Scrape flatmates.com.au room listings into a CSV file", long_about = None)]
pub struct Cli {
    /// Filtered flatmates.com.au search URL (prompted for when omitted)
    pub url: Option<String>,

    /// CSV file rows are appended to
    #[arg(short, long, default_value = "listing_data.csv")]
    pub output: PathBuf,

    /// Log of detail URLs already scraped, used to resume
    #[arg(long, default_value = "scraped_links.txt")]
    pub scraped_links: PathBuf,

    /// JSON array of detail URLs to scrape instead of walking the results pages
    #[arg(long)]
    pub links_file: Option<PathBuf>,

    /// Stop after this many results pages (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Seconds to wait after each page load for rendering to finish
    #[arg(long, default_value = "3")]
    pub settle_secs: u64,

    /// Page load timeout in seconds
    #[arg(long, default_value = "120")]
    pub timeout_secs: u64,

    /// Show the Chrome window
    #[arg(long)]
    pub headed: bool,

    /// Fetch pages over plain HTTP instead of driving Chrome
    #[arg(long)]
    pub http: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build run options, asking the operator for the URL when none was given
    pub fn into_options(self) -> Result<ScrapeOptions> {
        let raw_url = match self.url {
            Some(url) => url,
            None => prompt_for_url(io::stdin().lock(), io::stdout())?,
        };

        let mut options = ScrapeOptions::new(StartUrl::parse(&raw_url)?);
        options.output = self.output;
        options.scraped_links = self.scraped_links;
        options.links_file = self.links_file;
        options.max_pages = self.max_pages;
        options.settle_delay = Duration::from_secs(self.settle_secs);
        options.page_timeout = Duration::from_secs(self.timeout_secs);
        options.headless = !self.headed;

        Ok(options)
    }
}

fn prompt_for_url(mut input: impl BufRead, mut output: impl Write) -> Result<String> {
    write!(output, "{}", URL_PROMPT)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read URL from stdin")?;

    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;

    #[test]
    fn prompt_reads_one_line() {
        let mut shown = Vec::new();
        let url = prompt_for_url(&b"flatmates.com.au/rooms/perth\nignored\n"[..], &mut shown).unwrap();

        assert_eq!(url, "flatmates.com.au/rooms/perth");
        assert_eq!(String::from_utf8(shown).unwrap(), URL_PROMPT);
    }

    #[test]
    fn flags_map_onto_options() {
        let cli = Cli::parse_from([
            "flatmates-scraper",
            "https://flatmates.com.au/rooms/sydney",
            "--output",
            "rooms.csv",
            "--max-pages",
            "4",
            "--settle-secs",
            "0",
            "--headed",
        ]);
        let options = cli.into_options().unwrap();

        assert_eq!(options.start_url.as_str(), "https://flatmates.com.au/rooms/sydney");
        assert_eq!(options.output, PathBuf::from("rooms.csv"));
        assert_eq!(options.scraped_links, PathBuf::from("scraped_links.txt"));
        assert_eq!(options.max_pages, Some(4));
        assert_eq!(options.settle_delay, Duration::ZERO);
        assert_eq!(options.page_timeout, Duration::from_secs(120));
        assert!(!options.headless);
    }

    #[test]
    fn zero_page_limit_is_rejected() {
        let parsed = Cli::try_parse_from([
            "flatmates-scraper",
            "https://flatmates.com.au/rooms/sydney",
            "--max-pages",
            "0",
        ]);

        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let cli = Cli::parse_from(["flatmates-scraper", "https://example.com/rooms"]);
        let err = cli.into_options().unwrap_err();

        assert!(matches!(err.downcast_ref::<ScrapeError>(), Some(ScrapeError::InvalidUrl(_))));
    }
}
