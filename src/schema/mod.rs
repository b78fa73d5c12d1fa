//! Schema probing: reading values out of record properties whose encoding is
//! only known once the record is in hand.

pub mod encoding;

pub use encoding::{
    describe, detect, FieldEncoding, STATUS_ENCODINGS, TEXT_ENCODINGS, URL_ENCODINGS,
};

use crate::notion::Record;

/// URL schemes the fetch action can retrieve.
const FETCHABLE_SCHEMES: &[&str] = &["http", "https"];

/// Read property `field` of `record`, trying `candidates` in order and
/// returning the first non-empty value.
///
/// Absence (missing property, unknown encoding, empty value) is `None`, never
/// an error; callers skip the record.
pub fn extract(record: &Record, field: &str, candidates: &[FieldEncoding]) -> Option<String> {
    let property = record.property(field)?;
    candidates.iter().find_map(|e| e.extract(property))
}

/// Read a source URL from property `field`. Values that do not parse as an
/// `http`/`https` URL are treated as absent. The accepted value is returned
/// exactly as stored.
pub fn extract_url(record: &Record, field: &str) -> Option<String> {
    let property = record.property(field)?;
    URL_ENCODINGS
        .iter()
        .filter_map(|e| e.extract(property))
        .find(|v| is_fetchable_url(v))
}

fn is_fetchable_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| FETCHABLE_SCHEMES.contains(&u.scheme()))
        .unwrap_or(false)
}
