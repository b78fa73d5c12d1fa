use serde::Deserialize;

use super::record::Record;

/// Response from `POST /databases/{id}/query`.
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Record>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl QueryResponse {
    /// Cursor for the next page, or `None` once the listing is exhausted.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_full() {
        let json = r#"{
            "object": "list",
            "results": [
                {"object": "page", "id": "p1", "properties": {}},
                {"object": "page", "id": "p2", "properties": {}}
            ],
            "next_cursor": "cursor-2",
            "has_more": true,
            "type": "page_or_database"
        }"#;
        let resp: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results[1].id, "p2");
        assert_eq!(resp.continuation(), Some("cursor-2"));
    }

    #[test]
    fn test_query_response_last_page() {
        let json = r#"{"results": [], "next_cursor": null, "has_more": false}"#;
        let resp: QueryResponse = serde_json::from_str(json).unwrap();
        assert!(resp.results.is_empty());
        assert_eq!(resp.continuation(), None);
    }

    #[test]
    fn test_query_response_ignores_stale_cursor() {
        let json = r#"{"results": [], "next_cursor": "x", "has_more": false}"#;
        let resp: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.continuation(), None);
    }

    #[test]
    fn test_query_response_minimal() {
        let resp: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.results.is_empty());
        assert!(!resp.has_more);
    }
}
