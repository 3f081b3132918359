use crate::types::{NormalizedFestivalRecord, RawFestivalRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

// The listing renders date ranges as "<start> to <end>" split across two spans
static RANGE_CONNECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bto\b").expect("connector pattern is valid"));

/// Strips everything that is neither a word character nor whitespace.
/// `"Mumbai,"` becomes `"Mumbai"`.
pub fn clean_location(text: &str) -> String {
    NON_WORD.replace_all(text, "").trim().to_string()
}

/// Removes the standalone "to" connector. `"to 29 Jun 2025"` becomes `"29 Jun 2025"`.
pub fn clean_date(text: &str) -> String {
    RANGE_CONNECTOR.replace_all(text, "").trim().to_string()
}

fn clean(value: Option<String>, f: fn(&str) -> String) -> Option<String> {
    value.map(|v| f(&v)).filter(|v| !v.is_empty())
}

pub fn normalize_record(raw: RawFestivalRecord) -> NormalizedFestivalRecord {
    NormalizedFestivalRecord {
        image: raw.image,
        festival_name: raw.festival_name,
        genre: raw.genre,
        city: clean(raw.city, clean_location),
        state: clean(raw.state, clean_location),
        start_date: clean(raw.start_date, clean_date),
        end_date: clean(raw.end_date, clean_date),
        detail_url: raw.detail_url,
    }
}

/// Cleans every record, then collapses records equal in every field. The
/// first occurrence of each record keeps its position.
pub fn normalize_records(raw: Vec<RawFestivalRecord>) -> Vec<NormalizedFestivalRecord> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .map(normalize_record)
        .filter(|record| seen.insert(record.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, city: &str, start: &str) -> RawFestivalRecord {
        RawFestivalRecord {
            image: Some("https://example.com/a.jpg".to_string()),
            festival_name: name.to_string(),
            genre: "Music".to_string(),
            city: Some(city.to_string()),
            state: Some("Maharashtra.".to_string()),
            start_date: Some(start.to_string()),
            end_date: Some("to 29 Jun 2025".to_string()),
            detail_url: format!("https://example.com/{name}/"),
        }
    }

    #[test]
    fn test_clean_location() {
        assert_eq!(clean_location("Mumbai,"), "Mumbai");
        assert_eq!(clean_location(" Tamil Nadu. "), "Tamil Nadu");
        assert_eq!(clean_location("Thiruvananthapuram"), "Thiruvananthapuram");
    }

    #[test]
    fn test_clean_date() {
        assert_eq!(clean_date("to 29 Jun 2025"), "29 Jun 2025");
        assert_eq!(clean_date("TO 1 Jul 2025"), "1 Jul 2025");
        // Only the standalone word is removed
        assert_eq!(clean_date("Tomorrow"), "Tomorrow");
        assert_eq!(clean_date("14 Oct 2025"), "14 Oct 2025");
    }

    #[test]
    fn test_normalize_cleans_location_and_dates() {
        let records = normalize_records(vec![raw("kala-ghoda", "Mumbai,", "20 Jun 2025")]);
        let record = &records[0];

        assert_eq!(record.city.as_deref(), Some("Mumbai"));
        assert_eq!(record.state.as_deref(), Some("Maharashtra"));
        assert_eq!(record.start_date.as_deref(), Some("20 Jun 2025"));
        assert_eq!(record.end_date.as_deref(), Some("29 Jun 2025"));
        assert_eq!(record.image.as_deref(), Some("https://example.com/a.jpg"));
    }

    #[test]
    fn test_punctuation_only_location_becomes_absent() {
        let records = normalize_records(vec![raw("x", ",", "1 Jan 2025")]);
        assert_eq!(records[0].city, None);
    }

    #[test]
    fn test_identical_records_collapse() {
        let records = normalize_records(vec![
            raw("ziro", "Ziro", "1 Sep 2025"),
            raw("hornbill", "Kohima", "1 Dec 2025"),
            raw("ziro", "Ziro", "1 Sep 2025"),
        ]);
        let names: Vec<_> = records.iter().map(|r| r.festival_name.as_str()).collect();
        assert_eq!(names, vec!["ziro", "hornbill"]);
    }

    #[test]
    fn test_records_identical_after_cleaning_collapse() {
        let records = normalize_records(vec![
            raw("ziro", "Ziro,", "1 Sep 2025"),
            raw("ziro", "Ziro", "1 Sep 2025"),
        ]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_records_differing_in_one_field_survive() {
        let mut other = raw("ziro", "Ziro", "1 Sep 2025");
        other.genre = "Multi-Arts".to_string();
        let records = normalize_records(vec![raw("ziro", "Ziro", "1 Sep 2025"), other]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let input = vec![
            raw("sunburn", "Goa!", "to 28 Dec 2025"),
            raw("sunburn", "Goa", "28 Dec 2025"),
            raw("nh7", "Pune,", "to  to 5 Dec 2025"),
        ];
        let once = normalize_records(input);
        let twice = normalize_records(once.iter().cloned().map(RawFestivalRecord::from).collect());
        assert_eq!(once, twice);
    }
}
