use serde_json::{json, Value};

/// The JSON shapes a single record property can take.
///
/// A property object carries exactly one of these keys, so the encoding is
/// discovered per record by looking for the key. Each encoding owns one
/// extraction rule and one payload shape; the shapes are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEncoding {
    /// `{"url": "<value>"}`
    PlainScalar,
    /// `{"rich_text": [{"plain_text"|"text": ..}, ..]}`
    RichText,
    /// `{"title": [{"plain_text"|"text": ..}, ..]}`
    Title,
    /// `{"select": {"name": "<value>"}}`
    SingleChoice,
    /// `{"status": {"name": "<value>"}}`
    StatusChoice,
}

/// Encodings tried when reading a source URL, in priority order.
pub const URL_ENCODINGS: &[FieldEncoding] = &[
    FieldEncoding::PlainScalar,
    FieldEncoding::RichText,
    FieldEncoding::Title,
];

/// Encodings a status property may use, in detection order.
pub const STATUS_ENCODINGS: &[FieldEncoding] = &[
    FieldEncoding::SingleChoice,
    FieldEncoding::RichText,
    FieldEncoding::Title,
    FieldEncoding::StatusChoice,
];

/// Encodings a free-text property (such as the output path) may use.
pub const TEXT_ENCODINGS: &[FieldEncoding] = &[
    FieldEncoding::RichText,
    FieldEncoding::Title,
    FieldEncoding::PlainScalar,
];

impl FieldEncoding {
    pub const ALL: [FieldEncoding; 5] = [
        FieldEncoding::PlainScalar,
        FieldEncoding::RichText,
        FieldEncoding::Title,
        FieldEncoding::SingleChoice,
        FieldEncoding::StatusChoice,
    ];

    /// Key under which this encoding stores its value in a property object.
    pub fn key(self) -> &'static str {
        match self {
            FieldEncoding::PlainScalar => "url",
            FieldEncoding::RichText => "rich_text",
            FieldEncoding::Title => "title",
            FieldEncoding::SingleChoice => "select",
            FieldEncoding::StatusChoice => "status",
        }
    }

    /// Whether `property` uses this encoding. A present-but-null value
    /// (e.g. an unset select) still identifies the encoding.
    pub fn matches(self, property: &Value) -> bool {
        property.get(self.key()).is_some()
    }

    /// Read the scalar held by `property`, or `None` when it does not use this
    /// encoding or holds nothing. Text arrays yield their first segment only.
    pub fn extract(self, property: &Value) -> Option<String> {
        let value = property.get(self.key())?;
        let text = match self {
            FieldEncoding::PlainScalar => value.as_str(),
            FieldEncoding::RichText | FieldEncoding::Title => {
                value.as_array()?.first().and_then(segment_text)
            }
            FieldEncoding::SingleChoice | FieldEncoding::StatusChoice => {
                value.get("name").and_then(Value::as_str)
            }
        }?;
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Partial-update payload setting `property_name` to `value`.
    pub fn update(self, property_name: &str, value: &str) -> Value {
        let payload = match self {
            FieldEncoding::PlainScalar => json!(value),
            FieldEncoding::RichText | FieldEncoding::Title => {
                json!([{ "text": { "content": value } }])
            }
            FieldEncoding::SingleChoice | FieldEncoding::StatusChoice => json!({ "name": value }),
        };
        json!({ property_name: { self.key(): payload } })
    }
}

impl std::fmt::Display for FieldEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

fn segment_text(segment: &Value) -> Option<&str> {
    segment
        .get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| segment.pointer("/text/content").and_then(Value::as_str))
}

/// First encoding among `candidates` that `property` uses.
pub fn detect(property: &Value, candidates: &[FieldEncoding]) -> Option<FieldEncoding> {
    candidates.iter().copied().find(|e| e.matches(property))
}

/// Human-readable name of whatever encoding `property` uses, including types
/// this crate cannot read (`checkbox`, `number`, ...).
pub fn describe(property: &Value) -> String {
    if let Some(e) = detect(property, &FieldEncoding::ALL) {
        return e.key().to_string();
    }
    property
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}
