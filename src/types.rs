use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Source platform of the queued videos, forwarded to the fetch command.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Douyin,
    Tiktok,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Douyin => "douyin",
            Platform::Tiktok => "tiktok",
        }
    }
}

/// How the pending-record query filter is expressed to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterKind {
    /// `{"status": {"equals": ..}}` on a status-typed property.
    #[default]
    Status,
    /// `{"select": {"equals": ..}}` on a single-select property.
    Select,
    /// No server-side filter; pending records are picked out locally.
    None,
}

/// Where the status writer learns the status property's encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusResolution {
    /// Inspect the record returned by the query.
    #[default]
    Record,
    /// Re-fetch the record by id right before writing.
    Refetch,
}
