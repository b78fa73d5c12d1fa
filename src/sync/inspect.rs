use chrono::{DateTime, Utc};

use crate::notion::Record;
use crate::schema::{self, describe, STATUS_ENCODINGS};

/// What the synchronizer would see in one record. Read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: String,
    pub last_edited_time: Option<DateTime<Utc>>,
    /// `(property name, encoding name)`, sorted by name.
    pub encodings: Vec<(String, String)>,
    pub url: Option<String>,
    pub status: Option<String>,
}

impl RecordSummary {
    pub fn from_record(record: &Record, url_property: &str, status_property: &str) -> Self {
        let mut encodings: Vec<(String, String)> = record
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), describe(value)))
            .collect();
        encodings.sort();
        Self {
            id: record.id.clone(),
            last_edited_time: record.last_edited_time,
            encodings,
            url: schema::extract_url(record, url_property),
            status: schema::extract(record, status_property, STATUS_ENCODINGS),
        }
    }
}

impl std::fmt::Display for RecordSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let edited = self
            .last_edited_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(f, "{}  (edited {})", self.id, edited)?;
        writeln!(f, "  url:    {}", self.url.as_deref().unwrap_or("<none>"))?;
        writeln!(f, "  status: {}", self.status.as_deref().unwrap_or("<none>"))?;
        for (name, encoding) in &self.encodings {
            writeln!(f, "  - {name}: {encoding}")?;
        }
        Ok(())
    }
}
