//! notiondl-rs: downloads videos queued in a Notion database.
//!
//! Each pending record's URL is handed to an external downloader, and the
//! outcome is written back into the record's status property using whatever
//! property type the database happens to use for it.

#![warn(clippy::all)]

mod cli;
mod config;
mod fetch;
mod notion;
pub mod retry;
mod schema;
mod shutdown;
mod sync;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Command;
use config::{ConfigFile, DownloaderSettings, NotionSettings};
use fetch::{fetch_with_timeout, CommandFetcher, FetchRequest, FetchResult};
use notion::{Endpoints, NotionClient, RemoteStore};
use retry::RetryConfig;
use sync::{RecordSummary, SyncConfig, TaskSynchronizer};

fn notion_client(settings: &NotionSettings) -> anyhow::Result<NotionClient> {
    NotionClient::new(
        &settings.token,
        &settings.database_id,
        Endpoints::default(),
        settings.request_timeout,
    )
}

/// Run the sync command: one pass, or repeated passes in watch mode.
async fn run_sync(args: cli::SyncArgs, file: &ConfigFile) -> anyhow::Result<()> {
    let notion = NotionSettings::resolve(args.notion, file)?;
    let downloader = DownloaderSettings::resolve(args.downloader, file);

    tokio::fs::create_dir_all(&downloader.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory {}",
                downloader.output_dir.display()
            )
        })?;

    tracing::info!(
        database = %notion.database_id,
        output_dir = %downloader.output_dir.display(),
        concurrency = args.concurrency,
        "Starting notiondl-rs"
    );
    tracing::debug!("{:?}", notion);

    let store: Arc<dyn RemoteStore> = Arc::new(notion_client(&notion)?);
    let fetcher = Arc::new(CommandFetcher::new(
        downloader.fetch_command,
        downloader.fetch_args,
    ));
    let retry = RetryConfig {
        max_retries: args.max_retries,
        base_delay: Duration::from_secs(args.retry_delay),
        ..RetryConfig::default()
    };
    let synchronizer = TaskSynchronizer::new(
        store,
        fetcher,
        retry,
        SyncConfig {
            url_property: notion.url_property,
            status_property: notion.status_property,
            labels: notion.labels,
            filter_kind: notion.filter_kind,
            resolution: notion.resolution,
            path_property: notion.path_property,
            platform: downloader.platform,
            output_dir: downloader.output_dir,
            fetch_timeout: downloader.fetch_timeout,
            concurrency: usize::from(args.concurrency),
            dry_run: args.dry_run,
            no_progress_bar: args.no_progress_bar,
        },
    );

    let shutdown_token = shutdown::install_signal_handler()?;

    loop {
        let report = synchronizer.run_pass(&shutdown_token).await;
        report.log_summary();

        let Some(interval) = args.watch_with_interval else {
            if report.has_unreconciled() {
                anyhow::bail!(
                    "{} record(s) left with a stale status ({} unsupported schema, {} failed writes)",
                    report.unsupported() + report.reconciliation_failed(),
                    report.unsupported(),
                    report.reconciliation_failed()
                );
            }
            break;
        };

        if shutdown_token.is_cancelled() {
            tracing::info!("Shutdown requested, exiting...");
            break;
        }
        tracing::info!("Waiting {} seconds...", interval);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
            _ = shutdown_token.cancelled() => {
                tracing::info!("Shutdown during wait, exiting...");
                break;
            }
        }
    }

    Ok(())
}

/// Run the fetch command: download one URL, print where it landed.
async fn run_fetch(args: cli::FetchArgs, file: &ConfigFile) -> anyhow::Result<()> {
    let downloader = DownloaderSettings::resolve(args.downloader, file);
    let fetcher = CommandFetcher::new(downloader.fetch_command, downloader.fetch_args);
    let request = FetchRequest {
        url: args.url,
        platform: downloader.platform,
        output_dir: downloader.output_dir,
    };
    tracing::info!("Fetching {} with {}", request.url, fetcher.program());

    match fetch_with_timeout(&fetcher, &request, downloader.fetch_timeout).await {
        FetchResult::Success { path } => {
            println!("{}", path.display());
            Ok(())
        }
        FetchResult::Failure { reason } => anyhow::bail!("Download failed: {}", reason),
    }
}

/// Run the inspect command: print each pending record as the synchronizer
/// would read it.
async fn run_inspect(args: cli::InspectArgs, file: &ConfigFile) -> anyhow::Result<()> {
    let notion = NotionSettings::resolve(args.notion, file)?;
    let client = notion_client(&notion)?;
    let records = sync::pending_records(
        &client,
        &notion.status_property,
        &notion.labels.pending,
        notion.filter_kind,
    )
    .await
    .context("Failed to query pending records")?;

    for record in &records {
        println!(
            "{}",
            RecordSummary::from_record(record, &notion.url_property, &notion.status_property)
        );
    }
    println!(
        "{} pending record(s) with {:?} = {:?}",
        records.len(),
        notion.status_property,
        notion.labels.pending
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let file = ConfigFile::load(&cli.config)?;

    match cli.command {
        Command::Sync(args) => run_sync(args, &file).await,
        Command::Fetch(args) => run_fetch(args, &file).await,
        Command::Inspect(args) => run_inspect(args, &file).await,
    }
}
