use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{FilterKind, LogLevel, Platform, StatusResolution};

#[derive(Parser, Debug)]
#[command(
    name = "notiondl-rs",
    version,
    about = "Download videos queued in a Notion database and record the outcome"
)]
pub struct Cli {
    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// JSON config file; values there are used when neither a flag nor an
    /// environment variable is given
    #[arg(long, default_value = "notion_config.json", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download every pending record and write the outcome back
    Sync(SyncArgs),
    /// Download one URL without contacting Notion
    Fetch(FetchArgs),
    /// Show how pending records look to the synchronizer (read-only)
    Inspect(InspectArgs),
}

/// Where the records live and how they are laid out.
#[derive(Args, Debug, Clone, Default)]
pub struct NotionArgs {
    /// Notion integration token
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Database holding the download queue
    #[arg(long, env = "NOTION_DATABASE_ID")]
    pub database_id: Option<String>,

    /// Property holding the video URL [default: 抖音url]
    #[arg(long)]
    pub url_property: Option<String>,

    /// Property holding the download status [default: 抖音状态]
    #[arg(long)]
    pub status_property: Option<String>,

    /// Status value of records waiting to be downloaded [default: 待下载]
    #[arg(long)]
    pub pending_label: Option<String>,

    /// Status written after a successful download [default: 已下载]
    #[arg(long)]
    pub done_label: Option<String>,

    /// Status written after a failed download [default: 下载失败]
    #[arg(long)]
    pub failed_label: Option<String>,

    /// Status written right before downloading (e.g. 下载中); off by default
    #[arg(long)]
    pub in_progress_label: Option<String>,

    /// Property receiving the local path of each downloaded file
    #[arg(long)]
    pub path_property: Option<String>,

    /// How the pending query filters on the status property
    #[arg(long, value_enum, default_value = "status")]
    pub filter_kind: FilterKind,

    /// Where the status property's type is learned before writing
    #[arg(long, value_enum, default_value = "record")]
    pub status_resolution: StatusResolution,

    /// Timeout for each Notion API request, in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

/// How videos are downloaded.
#[derive(Args, Debug, Clone)]
pub struct DownloaderArgs {
    /// Local directory for downloads [default: Download/Notion]
    #[arg(short = 'd', long, env = "NOTION_DOWNLOAD_DIR")]
    pub download_dir: Option<String>,

    /// Source platform of the URLs [default: douyin]
    #[arg(long, value_enum)]
    pub platform: Option<Platform>,

    /// Downloader program to run for each URL
    #[arg(long, default_value = "yt-dlp")]
    pub fetch_command: String,

    /// Argument passed to the downloader (repeatable). Supports {url},
    /// {output_dir} and {platform} placeholders. The downloader must print
    /// the path of the video it wrote on stdout
    #[arg(long = "fetch-arg", allow_hyphen_values = true)]
    pub fetch_args: Vec<String>,

    /// Kill the downloader after this many seconds
    #[arg(long, default_value_t = 1800)]
    pub fetch_timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub notion: NotionArgs,

    #[command(flatten)]
    pub downloader: DownloaderArgs,

    /// List what would be downloaded without downloading or writing
    #[arg(long)]
    pub dry_run: bool,

    /// Run continuously, waiting N seconds between passes
    #[arg(long)]
    pub watch_with_interval: Option<u64>,

    /// Records processed at the same time
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Retries of a failed status write
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,

    /// Base delay between status write retries, in seconds
    #[arg(long, default_value_t = 2)]
    pub retry_delay: u64,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Video URL to download
    #[arg(long)]
    pub url: String,

    #[command(flatten)]
    pub downloader: DownloaderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub notion: NotionArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_defaults() {
        let cli = Cli::try_parse_from(["notiondl-rs", "sync"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.config, PathBuf::from("notion_config.json"));
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.concurrency, 1);
        assert_eq!(args.max_retries, 2);
        assert_eq!(args.retry_delay, 2);
        assert_eq!(args.downloader.fetch_command, "yt-dlp");
        assert_eq!(args.downloader.fetch_timeout_secs, 1800);
        assert_eq!(args.notion.filter_kind, FilterKind::Status);
        assert_eq!(args.notion.status_resolution, StatusResolution::Record);
        assert!(args.notion.url_property.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_sync_options() {
        let cli = Cli::try_parse_from([
            "notiondl-rs",
            "--log-level",
            "debug",
            "sync",
            "--url-property",
            "链接",
            "--filter-kind",
            "select",
            "--platform",
            "tiktok",
            "--fetch-arg",
            "--no-progress",
            "--fetch-arg",
            "{url}",
            "--concurrency",
            "4",
            "--watch-with-interval",
            "600",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        let Command::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.notion.url_property.as_deref(), Some("链接"));
        assert_eq!(args.notion.filter_kind, FilterKind::Select);
        assert_eq!(args.downloader.platform, Some(Platform::Tiktok));
        assert_eq!(args.downloader.fetch_args, vec!["--no-progress", "{url}"]);
        assert_eq!(args.concurrency, 4);
        assert_eq!(args.watch_with_interval, Some(600));
        assert!(args.dry_run);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(Cli::try_parse_from(["notiondl-rs", "sync", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_fetch_requires_url() {
        assert!(Cli::try_parse_from(["notiondl-rs", "fetch"]).is_err());
        let cli =
            Cli::try_parse_from(["notiondl-rs", "fetch", "--url", "https://v.douyin.com/x/"])
                .unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.url, "https://v.douyin.com/x/");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["notiondl-rs", "inspect", "--config", "/etc/n.json"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/n.json"));
        assert!(matches!(cli.command, Command::Inspect(_)));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["notiondl-rs"]).is_err());
    }
}
