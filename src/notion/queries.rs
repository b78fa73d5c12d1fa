use serde_json::{json, Map, Value};

use crate::types::FilterKind;

/// Largest page the query endpoint will return.
pub(crate) const PAGE_SIZE: u32 = 100;

/// Build the filter selecting records whose status property equals `label`.
///
/// Returns `None` for [`FilterKind::None`]; the caller then lists the whole
/// collection and filters locally.
pub fn status_filter(property: &str, label: &str, kind: FilterKind) -> Option<Value> {
    let condition = match kind {
        FilterKind::Status => "status",
        FilterKind::Select => "select",
        FilterKind::None => return None,
    };
    Some(json!({
        "property": property,
        condition: { "equals": label },
    }))
}

/// Body for one page of a collection query.
pub(crate) fn query_body(filter: Option<&Value>, start_cursor: Option<&str>) -> Value {
    let mut body = Map::new();
    body.insert("page_size".to_string(), json!(PAGE_SIZE));
    if let Some(filter) = filter {
        body.insert("filter".to_string(), filter.clone());
    }
    if let Some(cursor) = start_cursor {
        body.insert("start_cursor".to_string(), json!(cursor));
    }
    Value::Object(body)
}

/// Body for a partial page update. Only the named properties change.
pub(crate) fn patch_body(properties: &Value) -> Value {
    json!({ "properties": properties })
}
