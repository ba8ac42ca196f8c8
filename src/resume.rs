use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Detail URLs already written to the CSV by earlier runs, one per line on disk
pub struct ScrapedLinks {
    path: PathBuf,
    links: HashSet<String>,
}

impl ScrapedLinks {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let links: HashSet<String> = if path.exists() {
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        } else {
            HashSet::new()
        };

        if links.is_empty() {
            info!("No previously scraped links in {}", path.display());
        } else {
            info!("Resuming: {} links already scraped", links.len());
        }

        Ok(Self { path, links })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.links.contains(url)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Remember `url` in memory and append it to the log file
    pub fn record(&mut self, url: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        writeln!(file, "{}", url).with_context(|| format!("Failed to append to {}", self.path.display()))?;

        self.links.insert(url.to_string());
        Ok(())
    }
}
