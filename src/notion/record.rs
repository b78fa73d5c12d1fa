use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One row of the remote collection.
///
/// Properties stay dynamic JSON: each database chooses its own property
/// types, and the same property name can carry a different encoding from
/// one database to the next.
#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Record {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Merge a partial property update into this record, the way the store
    /// applies a patch: named properties are replaced, others are untouched.
    #[cfg(test)]
    pub fn apply_update(&mut self, update: &Value) {
        if let Some(map) = update.as_object() {
            for (name, value) in map {
                self.properties.insert(name.clone(), value.clone());
            }
        }
    }
}
