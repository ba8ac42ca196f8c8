mod cli;
mod error;
mod models;
mod output;
mod resume;
mod scrapers;

use clap::Parser;
use cli::Cli;
use output::CsvSink;
use resume::ScrapedLinks;
use scrapers::{BrowserPageSource, FlatmatesScraper, HttpPageSource, PageSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("🏠 Flatmates Scraper");
    info!("====================");

    let use_http = cli.http;
    let options = cli.into_options()?;

    let source: Box<dyn PageSource> = if use_http {
        Box::new(HttpPageSource::new(&options)?)
    } else {
        Box::new(BrowserPageSource::launch(&options)?)
    };

    let mut sink = CsvSink::open(&options.output)?;
    let mut scraped = ScrapedLinks::load(&options.scraped_links)?;

    let scraper = FlatmatesScraper::new(source, options)?;
    let summary = scraper.run(&mut sink, &mut scraped).await?;

    info!(
        "✅ Wrote {} new rows to {} ({} links found, {} already scraped, {} without listing data, {} failed)",
        sink.rows_written(),
        sink.path().display(),
        summary.discovered,
        summary.already_scraped,
        summary.missing,
        summary.failed
    );

    Ok(())
}
