use crate::models::ListingRecord;
use crate::output::CsvSink;
use crate::resume::ScrapedLinks;
use crate::scrapers::extract::ListingExtractor;
use crate::scrapers::traits::PageSource;
use crate::scrapers::types::ScrapeOptions;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Detail links found on the results pages (or in the links file)
    pub discovered: usize,
    /// Links skipped because an earlier run already wrote them
    pub already_scraped: usize,
    /// Rows appended to the CSV
    pub scraped: usize,
    /// Detail pages without a listing container
    pub missing: usize,
    /// Detail pages that failed to load
    pub failed: usize,
    /// Results pages whose links were taken
    pub pages_read: u32,
}

/// Detail links gathered from the results pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedLinks {
    /// Unique detail URLs in first-seen order
    pub links: Vec<String>,
    /// Results pages whose links were taken
    pub pages_read: u32,
}

/// Walks the flatmates.com.au search results and scrapes every listing found
pub struct FlatmatesScraper {
    source: Box<dyn PageSource>,
    extractor: ListingExtractor,
    options: ScrapeOptions,
}

impl FlatmatesScraper {
    pub fn new(source: Box<dyn PageSource>, options: ScrapeOptions) -> Result<Self> {
        Ok(Self {
            source,
            extractor: ListingExtractor::new()?,
            options,
        })
    }

    /// Scrape every listing not yet in `scraped`, appending one row per listing to `sink`
    pub async fn run(&self, sink: &mut CsvSink, scraped: &mut ScrapedLinks) -> Result<RunSummary> {
        info!(
            "Starting the scraper at {} ({} pages, {} links scraped before)",
            self.options.start_url,
            self.source.source_name(),
            scraped.len()
        );

        let collected = match &self.options.links_file {
            Some(path) => CollectedLinks {
                links: load_links_file(path)?,
                pages_read: 0,
            },
            None => self.collect_listing_links().await?,
        };
        let links = collected.links;

        let discovered = links.len();
        let pending: Vec<String> = links.into_iter().filter(|link| !scraped.contains(link)).collect();

        let mut summary = RunSummary {
            discovered,
            already_scraped: discovered - pending.len(),
            pages_read: collected.pages_read,
            ..RunSummary::default()
        };

        info!(
            "Starting to scrape {} new listing links ({} already scraped)",
            pending.len(),
            summary.already_scraped
        );

        for (i, link) in pending.iter().enumerate() {
            info!("Scraping {}", link);

            match self.scrape_listing(link).await {
                Ok(Some(record)) => {
                    sink.append(&record)?;
                    scraped.record(link)?;
                    summary.scraped += 1;
                }
                Ok(None) => {
                    warn!("No listing data found on {}", link);
                    summary.missing += 1;
                }
                Err(e) => {
                    warn!("Failed to load {}: {:#}", link, e);
                    summary.failed += 1;
                }
            }

            info!("Scraped {}/{} pages", i + 1, pending.len());
        }

        Ok(summary)
    }

    /// Follow the results pages until one has no listings or no next-page control
    pub async fn collect_listing_links(&self) -> Result<CollectedLinks> {
        let mut page = 1;
        let mut pages_read = 0;
        let mut seen = HashSet::new();
        let mut all_links = Vec::new();

        loop {
            let page_url = self.options.start_url.page_url(page);

            let html = match self.source.fetch_html(&page_url).await {
                Ok(html) => html,
                Err(e) if page > 1 => {
                    warn!("Failed to load results page {}, stopping: {:#}", page, e);
                    break;
                }
                Err(e) => return Err(e.context(format!("Failed to load results page {}", page_url))),
            };

            let results = self.extractor.parse_results_page(&html, &page_url);
            if results.tiles_found == 0 {
                warn!("No listing tiles found on page {}, stopping", page);
                break;
            }

            pages_read += 1;
            let found = results.links.len();
            for link in results.links {
                if seen.insert(link.clone()) {
                    all_links.push(link);
                } else {
                    debug!("Listing {} already seen on an earlier page", link);
                }
            }
            info!("Extracted {} listing links from page {}", found, page);

            if !results.has_next {
                info!("No next page element found, stopping");
                break;
            }

            if self.options.max_pages.is_some_and(|max| page >= max) {
                info!("Reached the page limit of {}, stopping", page);
                break;
            }

            page += 1;
        }

        info!(
            "Extracted {} listing links in total from {} pages",
            all_links.len(),
            pages_read
        );
        Ok(CollectedLinks {
            links: all_links,
            pages_read,
        })
    }

    /// Load one detail page and extract its record
    pub async fn scrape_listing(&self, url: &str) -> Result<Option<ListingRecord>> {
        let html = self.source.fetch_html(url).await?;
        Ok(self.extractor.parse_listing(&html, url))
    }
}

/// Read a JSON array of detail URLs saved by an earlier run, keeping the first of any repeats
fn load_links_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read links file {}", path.display()))?;

    let mut links: Vec<String> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of URLs", path.display()))?;

    let listed = links.len();
    let mut seen = HashSet::new();
    links.retain(|link| seen.insert(link.clone()));
    if links.len() < listed {
        debug!("Dropped {} repeated links from {}", listed - links.len(), path.display());
    }

    info!("Loaded {} listing links from {}", links.len(), path.display());
    Ok(links)
}
