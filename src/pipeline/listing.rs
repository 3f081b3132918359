use crate::app::ports::FetchedPage;
use crate::constants::*;
use crate::error::Result;
use crate::pipeline::schema::{CompiledSchema, ExtractedItem, ExtractionSchema};
use crate::types::{ListingPage, RawFestivalRecord};
use tracing::debug;
use url::Url;

/// Turns a rendered listing page into raw festival records.
#[derive(Debug)]
pub struct ListingExtractor {
    schema: CompiledSchema,
}

impl ListingExtractor {
    pub fn new(schema: &ExtractionSchema) -> Result<Self> {
        Ok(Self {
            schema: schema.compile()?,
        })
    }

    /// Records in document order. Items missing a name, genre or detail link
    /// are dropped here but still counted in `matched`; every other field may
    /// be absent.
    pub fn extract(&self, page: &FetchedPage) -> ListingPage {
        let base = Url::parse(&page.url).ok();
        let items = self.schema.extract(&page.body);
        let matched = items.len();
        let records = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let record = into_record(item, base.as_ref());
                if record.is_none() {
                    debug!(
                        url = %page.url,
                        schema = self.schema.name(),
                        index,
                        "Dropping listing item without festival name, genre or detail link"
                    );
                }
                record
            })
            .collect();
        ListingPage { matched, records }
    }
}

fn into_record(mut item: ExtractedItem, base: Option<&Url>) -> Option<RawFestivalRecord> {
    let festival_name = item.remove(FIELD_FESTIVAL_NAME)?;
    let genre = item.remove(FIELD_GENRE)?;
    let detail_url = resolve(base, item.remove(FIELD_DETAIL_URL)?);

    Some(RawFestivalRecord {
        image: item.remove(FIELD_IMAGE).map(|src| resolve(base, src)),
        festival_name,
        genre,
        city: item.remove(FIELD_CITY),
        state: item.remove(FIELD_STATE),
        start_date: item.remove(FIELD_START_DATE),
        end_date: item.remove(FIELD_END_DATE),
        detail_url,
    })
}

/// Resolves a relative link against the page it came from. Absolute links are
/// returned byte-for-byte so they stay usable as join keys.
fn resolve(base: Option<&Url>, link: String) -> String {
    match Url::parse(&link) {
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .and_then(|b| b.join(&link).ok())
            .map(String::from)
            .unwrap_or(link),
        _ => link,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: "https://www.festivalsfromindia.com/genres/music/page/2/?orderby=title".to_string(),
            body: body.to_string(),
        }
    }

    fn article(name: &str, genre: &str, href: &str) -> String {
        format!(
            r#"<article class="festival"><a class="cf-grids-box" href="{href}">
                <span class="cf-grids-box-cat-genre">{genre}</span><h4>{name}</h4></a></article>"#
        )
    }

    #[test]
    fn test_extracts_records_in_document_order() {
        let body = format!(
            "<html><body>{}{}</body></html>",
            article("Ziro Festival", "Music", "https://example.com/ziro/"),
            article("Jaipur Literature Festival", "Literature", "https://example.com/jlf/"),
        );
        let extractor = ListingExtractor::new(&ExtractionSchema::festival_listing()).unwrap();
        let records = extractor.extract(&page(&body)).records;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].festival_name, "Ziro Festival");
        assert_eq!(records[0].detail_url, "https://example.com/ziro/");
        assert_eq!(records[1].genre, "Literature");
        assert_eq!(records[1].city, None);
    }

    #[test]
    fn test_drops_items_without_required_fields() {
        let body = format!(
            "<html><body>{}{}</body></html>",
            r#"<article class="festival"><h4>Nameless genre</h4></article>"#,
            article("Hornbill Festival", "Multi-Arts", "https://example.com/hornbill/"),
        );
        let extractor = ListingExtractor::new(&ExtractionSchema::festival_listing()).unwrap();
        let listing = extractor.extract(&page(&body));

        assert_eq!(listing.matched, 2);
        assert_eq!(listing.records.len(), 1);
        assert_eq!(listing.records[0].festival_name, "Hornbill Festival");
    }

    #[test]
    fn test_relative_links_resolve_against_page_url() {
        let body = format!(
            "<html><body>{}</body></html>",
            article("Rann Utsav", "Multi-Arts", "/festivals/rann-utsav/")
        );
        let extractor = ListingExtractor::new(&ExtractionSchema::festival_listing()).unwrap();
        let records = extractor.extract(&page(&body)).records;

        assert_eq!(
            records[0].detail_url,
            "https://www.festivalsfromindia.com/festivals/rann-utsav/"
        );
    }

    #[test]
    fn test_counts_matches_when_every_item_is_dropped() {
        let body = r#"<html><body><article class="festival"><h4>No genre</h4></article></body></html>"#;
        let extractor = ListingExtractor::new(&ExtractionSchema::festival_listing()).unwrap();
        let listing = extractor.extract(&page(body));

        assert_eq!(listing.matched, 1);
        assert!(listing.records.is_empty());
    }

    #[test]
    fn test_absolute_links_are_untouched() {
        assert_eq!(resolve(None, "HTTPS://Example.com/a".to_string()), "HTTPS://Example.com/a");
    }
}
