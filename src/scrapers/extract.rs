use crate::error::ScrapeError;
use crate::models::{ListingRecord, NOT_AVAILABLE};
use anyhow::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};
use url::Url;

const FLATMATES_HEADING: &str = "About the flatmates";
const FLATMATES_WRAPPER_PREFIX: &str = "styles__description__wrapper___";

// Elements that start and end a line of rendered text
const LINE_BREAKS: [&str; 4] = ["br", "p", "div", "li"];

/// Links found on one page of search results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsPage {
    /// Listing tiles on the page, with or without a usable link
    pub tiles_found: usize,
    /// Absolute detail-page URLs, in page order
    pub links: Vec<String>,
    /// Whether the page offers a "Go to next page" control
    pub has_next: bool,
}

/// Compiled selectors for the flatmates.com.au results and detail pages
///
/// The site uses CSS modules, so every class is matched by its stable prefix
/// (`styles__roomRent___`) and never by the generated hash after it.
pub struct ListingExtractor {
    tile: Selector,
    tile_link: Selector,
    next_page: Selector,
    listing_root: Selector,
    room_rent: Selector,
    main_feature: Selector,
    property_about: Selector,
    property_feature: Selector,
    room_detail: Selector,
    room_title: Selector,
    room_subtitle: Selector,
    left_section: Selector,
    heading: Selector,
    digits: Regex,
}

impl ListingExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tile: selector(
                r#"div[class^="styles__listings___"] > div[class^="styles__listingTileBox___"]"#,
            )?,
            tile_link: selector(r#"a[class^="styles__contentBox___"]"#)?,
            next_page: selector(r#"a[aria-label="Go to next page"]"#)?,
            listing_root: selector("[initial_tracking_context_schema_data]")?,
            room_rent: selector(
                r#"a[class^="styles__roomRent___"] > div[class^="styles__value___"]"#,
            )?,
            main_feature: selector(
                r#"div[class^="styles__propertyMainFeatures___"] > div[class^="styles__propertyFeature___"] > div[class^="styles__value___"]"#,
            )?,
            property_about: selector(r#"div[class^="styles__description__wrapper"] > p"#)?,
            property_feature: selector(
                r#"div[class^="styles__featureStyles__titleContainer___"] div[class^="styles__detail___"]"#,
            )?,
            room_detail: selector(
                r#"div[class^="styles__roomDetails___"] div[class^="styles__detail___"]"#,
            )?,
            room_title: selector(r#"span[class^="styles__detail__title___"]"#)?,
            room_subtitle: selector(r#"span[class^="styles__detail__subTitle___"]"#)?,
            left_section: selector(r#"section[class^="styles__left___"]"#)?,
            heading: selector("h3")?,
            digits: Regex::new(r"\d+")?,
        })
    }

    /// Pull the detail-page links and the next-page control out of a results page
    pub fn parse_results_page(&self, html: &str, page_url: &str) -> ResultsPage {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let tiles: Vec<_> = document.select(&self.tile).collect();
        let mut links = Vec::with_capacity(tiles.len());

        for (idx, tile) in tiles.iter().enumerate() {
            let href = tile
                .select(&self.tile_link)
                .next()
                .and_then(|link| link.value().attr("href"));

            match href {
                Some(href) => links.push(resolve_link(base.as_ref(), href)),
                None => warn!("No listing link found in tile {} of {}", idx, page_url),
            }
        }

        ResultsPage {
            tiles_found: tiles.len(),
            links,
            has_next: document.select(&self.next_page).next().is_some(),
        }
    }

    /// Extract one listing from its detail page
    ///
    /// Returns `None` when the page has no listing container at all, which is
    /// what removed or expired listings look like.
    pub fn parse_listing(&self, html: &str, url: &str) -> Option<ListingRecord> {
        let document = Html::parse_document(html);
        let root = document.select(&self.listing_root).next()?;

        let mut record = ListingRecord::unavailable(url);

        if let Some(rent) = root.select(&self.room_rent).next() {
            match self.digits.find(&element_text(rent)) {
                Some(price) => record.price_per_week = price.as_str().to_string(),
                None => debug!("Rent without a number on {}", url),
            }
        }

        let main_features = root.select(&self.main_feature).map(element_text);
        for (slot, value) in [&mut record.beds, &mut record.baths, &mut record.persons]
            .into_iter()
            .zip(main_features)
        {
            *slot = value;
        }

        if let Some(about) = document.select(&self.property_about).next() {
            record.property_about = element_text(about);
        }

        record.property_features = document
            .select(&self.property_feature)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(", ");

        record.room_overview = self
            .room_overview(&document)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        if let Some(flatmates) = flatmates_about(&document, &self.heading) {
            record.flatmates_about = flatmates;
        }

        if let Some(district) = self.district(&document) {
            record.district = district;
        }

        Some(record)
    }

    /// `title (subtitle)` per room detail; `None` if any detail is incomplete
    fn room_overview(&self, document: &Html) -> Option<String> {
        let mut parts = Vec::new();

        for detail in document.select(&self.room_detail) {
            let title = element_text(detail.select(&self.room_title).next()?);
            let subtitle = element_text(detail.select(&self.room_subtitle).next()?);

            if subtitle.is_empty() {
                parts.push(title);
            } else {
                parts.push(format!("{} ({})", title, subtitle));
            }
        }

        Some(parts.join(", "))
    }

    /// First `h1` of an attribute-less `div` directly inside the left column
    fn district(&self, document: &Html) -> Option<String> {
        document
            .select(&self.left_section)
            .flat_map(child_elements)
            .filter(|div| div.value().name() == "div" && div.value().attrs().next().is_none())
            .flat_map(child_elements)
            .find(|el| el.value().name() == "h1")
            .map(element_text)
    }
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| href.to_string())
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

fn class_starts_with(element: &ElementRef<'_>, prefix: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.starts_with(prefix))
}

/// Description block that follows the "About the flatmates" heading
fn flatmates_about(document: &Html, heading: &Selector) -> Option<String> {
    document
        .select(heading)
        .filter(|h3| {
            h3.children()
                .filter_map(|node| node.value().as_text())
                .any(|text| text.trim() == FLATMATES_HEADING)
        })
        .find_map(|h3| {
            h3.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "div" && class_starts_with(el, FLATMATES_WRAPPER_PREFIX))
        })
        .map(element_text)
}

/// Rendered text of an element: whitespace collapsed, one line per block
fn element_text(element: ElementRef<'_>) -> String {
    let mut lines = vec![String::new()];
    push_rendered_text(element, &mut lines);

    lines
        .iter()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// Block elements end the current line on both open and close; empty lines are dropped later
fn push_rendered_text(element: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if let Some(line) = lines.last_mut() {
                    line.push_str(text);
                }
            }
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let breaks = LINE_BREAKS.iter().any(|name| *name == child.value().name());

                if breaks {
                    lines.push(String::new());
                }
                push_rendered_text(child, lines);
                if breaks {
                    lines.push(String::new());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = include_str!("fixtures/results_page.html");
    const LISTING_DETAIL: &str = include_str!("fixtures/listing_detail.html");
    const LISTING_SPARSE: &str = include_str!("fixtures/listing_sparse.html");

    const DETAIL_URL: &str = "https://flatmates.com.au/share-house-sydney-surry-hills-2010-P1001";

    #[test]
    fn results_page_links_are_absolute_and_ordered() {
        let extractor = ListingExtractor::new().unwrap();
        let page = extractor.parse_results_page(RESULTS_PAGE, "https://flatmates.com.au/rooms/sydney?page=2");

        assert_eq!(page.tiles_found, 3);
        assert_eq!(
            page.links,
            vec![
                "https://flatmates.com.au/share-house-sydney-surry-hills-2010-P1001".to_string(),
                "https://flatmates.com.au/share-house-sydney-newtown-2042-P1002".to_string(),
            ]
        );
        assert!(page.has_next);
    }

    #[test]
    fn results_page_without_tiles_or_next() {
        let extractor = ListingExtractor::new().unwrap();
        let page = extractor.parse_results_page(
            "<html><body><p>No rooms match your search</p></body></html>",
            "https://flatmates.com.au/rooms/sydney?page=9",
        );

        assert_eq!(page.tiles_found, 0);
        assert!(page.links.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn detail_page_fields() {
        let extractor = ListingExtractor::new().unwrap();
        let record = extractor.parse_listing(LISTING_DETAIL, DETAIL_URL).unwrap();

        assert_eq!(record.price_per_week, "350");
        assert_eq!(record.beds, "3");
        assert_eq!(record.baths, "2");
        assert_eq!(record.persons, "4");
        assert_eq!(record.room_overview, "Private room (Furnished), Shared bathroom");
        assert_eq!(record.property_features, "Air conditioning, Internet included");
        assert_eq!(record.property_about, "Sunny terrace close to the station.\nBills included.");
        assert_eq!(
            record.flatmates_about,
            "Two friendly professionals.\nWe cook together on Sundays."
        );
        assert_eq!(record.district, "Surry Hills, Sydney");
        assert_eq!(record.source_url, DETAIL_URL);
    }

    #[test]
    fn sparse_detail_page_falls_back_per_field() {
        let extractor = ListingExtractor::new().unwrap();
        let record = extractor.parse_listing(LISTING_SPARSE, DETAIL_URL).unwrap();

        assert_eq!(record.price_per_week, NOT_AVAILABLE);
        assert_eq!(record.beds, "2");
        assert_eq!(record.baths, NOT_AVAILABLE);
        assert_eq!(record.persons, NOT_AVAILABLE);
        // the only room detail has no subtitle element
        assert_eq!(record.room_overview, NOT_AVAILABLE);
        assert_eq!(record.property_features, "");
        assert_eq!(record.property_about, NOT_AVAILABLE);
        assert_eq!(record.flatmates_about, NOT_AVAILABLE);
        assert_eq!(record.district, NOT_AVAILABLE);
    }

    #[test]
    fn page_without_listing_root_yields_nothing() {
        let extractor = ListingExtractor::new().unwrap();
        let html = "<html><body><h1>This listing is no longer available</h1></body></html>";

        assert!(extractor.parse_listing(html, DETAIL_URL).is_none());
    }

    #[test]
    fn element_text_breaks_after_closing_block() {
        let document = Html::parse_fragment("<section>a<div>b</div>c<p>d</p>e<br>f</section>");
        let section = document.select(&Selector::parse("section").unwrap()).next().unwrap();

        assert_eq!(element_text(section), "a\nb\nc\nd\ne\nf");
    }

    #[test]
    fn element_text_keeps_inline_words_together() {
        let document = Html::parse_fragment("<div><b>Sy</b>dney   <i>inner</i>\n west</div>");
        let div = document.select(&Selector::parse("div").unwrap()).next().unwrap();

        assert_eq!(element_text(div), "Sydney inner west");
    }
}
