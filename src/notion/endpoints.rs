//! URL layout of the Notion REST API.
//!
//! The root is configurable so tests can point the client at a local server.

pub const DEFAULT_API_ROOT: &str = "https://api.notion.com/v1";

/// Value sent in the `Notion-Version` header; property payload shapes are
/// pinned to this revision.
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone)]
pub struct Endpoints {
    api_root: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_ROOT)
    }
}

impl Endpoints {
    pub fn new(api_root: &str) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn database_query(&self, database_id: &str) -> String {
        format!("{}/databases/{}/query", self.api_root, database_id)
    }

    pub fn page(&self, page_id: &str) -> String {
        format!("{}/pages/{}", self.api_root, page_id)
    }
}
