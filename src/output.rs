use crate::models::{ListingRecord, CSV_HEADER};
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// Append-only CSV file of scraped listings
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: usize,
}

impl CsvSink {
    /// Open `path` for appending, writing the header row only into a new or empty file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let needs_header = fs::metadata(path).map(|meta| meta.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {} for appending", path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer
                .write_record(CSV_HEADER)
                .context("Failed to write CSV header")?;
            writer.flush().context("Failed to flush CSV header")?;
            info!("Created {} with header row", path.display());
        }

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
        })
    }

    /// Write one row and flush it to disk
    pub fn append(&mut self, record: &ListingRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .with_context(|| format!("Failed to write row for {}", record.source_url))?;
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;

        self.rows_written += 1;
        Ok(())
    }

    /// Rows appended through this sink
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, price: &str) -> ListingRecord {
        ListingRecord {
            price_per_week: price.to_string(),
            beds: "3".to_string(),
            baths: "1".to_string(),
            persons: "2".to_string(),
            room_overview: "Private room (Furnished)".to_string(),
            property_features: "Air conditioning, Internet included".to_string(),
            property_about: "Close to the station.\nBills included.".to_string(),
            flatmates_about: "N/A".to_string(),
            district: "Newtown, Sydney".to_string(),
            source_url: url.to_string(),
        }
    }

    #[test]
    fn header_matches_record_fields() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(record("https://flatmates.com.au/a", "300")).unwrap();
        let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(data.lines().next().unwrap(), CSV_HEADER.join(","));
    }

    #[test]
    fn header_written_once_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing_data.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record("https://flatmates.com.au/a", "300")).unwrap();
        assert_eq!(sink.rows_written(), 1);
        drop(sink);

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record("https://flatmates.com.au/b", "410")).unwrap();
        drop(sink);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, CSV_HEADER);

        let rows: Vec<ListingRecord> = reader.deserialize::<ListingRecord>().map(|row| row.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price_per_week, "300");
        assert_eq!(rows[1].source_url, "https://flatmates.com.au/b");
        // multi-line text survives quoting
        assert_eq!(rows[0].property_about, "Close to the station.\nBills included.");
    }

    #[test]
    fn empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing_data.csv");
        File::create(&path).unwrap();

        let sink = CsvSink::open(&path).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), CSV_HEADER.join(","));
    }
}
