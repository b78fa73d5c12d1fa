use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::cli::{DownloaderArgs, NotionArgs};
use crate::sync::Labels;
use crate::types::{FilterKind, Platform, StatusResolution};

pub const DEFAULT_URL_PROPERTY: &str = "抖音url";
pub const DEFAULT_STATUS_PROPERTY: &str = "抖音状态";
pub const DEFAULT_PENDING_LABEL: &str = "待下载";
pub const DEFAULT_DONE_LABEL: &str = "已下载";
pub const DEFAULT_FAILED_LABEL: &str = "下载失败";
pub const DEFAULT_DOWNLOAD_DIR: &str = "Download/Notion";

/// Contents of the JSON config file. Every key is optional; a missing file
/// behaves like an empty one.
#[derive(Default, Deserialize)]
pub struct ConfigFile {
    pub notion_token: Option<String>,
    pub database_id: Option<String>,
    pub download_dir: Option<String>,
    pub platform: Option<Platform>,
    pub url_property: Option<String>,
    pub status_property: Option<String>,
    pub pending_label: Option<String>,
    pub done_label: Option<String>,
    pub failed_label: Option<String>,
    pub in_progress_label: Option<String>,
    pub path_property: Option<String>,
}

impl std::fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigFile")
            .field("notion_token", &self.notion_token.as_ref().map(|_| "<redacted>"))
            .field("database_id", &self.database_id)
            .field("download_dir", &self.download_dir)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("Invalid config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config file {}", path.display()))
            }
        }
    }
}

/// Connection and schema settings for the Notion side.
pub struct NotionSettings {
    pub token: String,
    pub database_id: String,
    pub url_property: String,
    pub status_property: String,
    pub labels: Labels,
    pub path_property: Option<String>,
    pub filter_kind: FilterKind,
    pub resolution: StatusResolution,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionSettings")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("url_property", &self.url_property)
            .field("status_property", &self.status_property)
            .field("labels", &self.labels)
            .field("filter_kind", &self.filter_kind)
            .finish_non_exhaustive()
    }
}

impl NotionSettings {
    /// Merge flags/environment (already combined by clap) over the config file.
    pub fn resolve(args: NotionArgs, file: &ConfigFile) -> anyhow::Result<Self> {
        let token = pick(args.token, &file.notion_token)
            .ok_or_else(|| missing("Notion token", "--token", "NOTION_TOKEN", "notion_token"))?;
        let database_id = pick(args.database_id, &file.database_id).ok_or_else(|| {
            missing(
                "Notion database id",
                "--database-id",
                "NOTION_DATABASE_ID",
                "database_id",
            )
        })?;

        Ok(Self {
            token,
            database_id,
            url_property: pick(args.url_property, &file.url_property)
                .unwrap_or_else(|| DEFAULT_URL_PROPERTY.to_string()),
            status_property: pick(args.status_property, &file.status_property)
                .unwrap_or_else(|| DEFAULT_STATUS_PROPERTY.to_string()),
            labels: Labels {
                pending: pick(args.pending_label, &file.pending_label)
                    .unwrap_or_else(|| DEFAULT_PENDING_LABEL.to_string()),
                done: pick(args.done_label, &file.done_label)
                    .unwrap_or_else(|| DEFAULT_DONE_LABEL.to_string()),
                failed: pick(args.failed_label, &file.failed_label)
                    .unwrap_or_else(|| DEFAULT_FAILED_LABEL.to_string()),
                in_progress: pick(args.in_progress_label, &file.in_progress_label),
            },
            path_property: pick(args.path_property, &file.path_property),
            filter_kind: args.filter_kind,
            resolution: args.status_resolution,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        })
    }
}

/// Where and how videos are downloaded.
#[derive(Debug, Clone)]
pub struct DownloaderSettings {
    pub output_dir: PathBuf,
    pub platform: Platform,
    pub fetch_command: String,
    pub fetch_args: Vec<String>,
    pub fetch_timeout: Duration,
}

impl DownloaderSettings {
    pub fn resolve(args: DownloaderArgs, file: &ConfigFile) -> Self {
        let dir = pick(args.download_dir, &file.download_dir)
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string());
        Self {
            output_dir: expand_tilde(&dir),
            platform: args.platform.or(file.platform).unwrap_or_default(),
            fetch_command: args.fetch_command,
            fetch_args: args.fetch_args,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
        }
    }
}

/// First non-empty of the command-line value and the file value.
fn pick(arg: Option<String>, file: &Option<String>) -> Option<String> {
    arg.filter(|v| !v.is_empty())
        .or_else(|| file.clone().filter(|v| !v.is_empty()))
}

fn missing(what: &str, flag: &str, env: &str, key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "{what} is not set. Provide it in one of three ways:\n  \
         1. the {flag} flag\n  \
         2. the {env} environment variable\n  \
         3. \"{key}\" in the config file (see --config)"
    )
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
