//! Record-driven synchronization: list pending records, fetch each one's
//! video, write the result back into the record's status property.
//!
//! The remote status property is the only durable state. A record that was
//! reconciled drops out of the pending query, so running a pass twice does not
//! fetch it again.

pub mod inspect;
pub mod outcome;
pub mod status;
#[cfg(test)]
pub(crate) mod testing;

pub use inspect::RecordSummary;
pub use outcome::{Outcome, SyncReport, TaskOutcome};
pub use status::{StatusWriteError, StatusWriter};

use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::fetch::{fetch_with_timeout, FetchAction, FetchRequest, FetchResult};
use crate::notion::queries::status_filter;
use crate::notion::{Record, RemoteStore, StoreError};
use crate::retry::RetryConfig;
use crate::schema::{self, FieldEncoding, STATUS_ENCODINGS};
use crate::types::{FilterKind, Platform, StatusResolution};

/// Status labels written by the synchronizer.
#[derive(Debug, Clone)]
pub struct Labels {
    pub pending: String,
    pub done: String,
    pub failed: String,
    /// Written before fetching when set.
    pub in_progress: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub url_property: String,
    pub status_property: String,
    pub labels: Labels,
    pub filter_kind: FilterKind,
    pub resolution: StatusResolution,
    /// Property receiving the output path after a successful fetch.
    pub path_property: Option<String>,
    pub platform: Platform,
    pub output_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub concurrency: usize,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

pub struct TaskSynchronizer {
    store: Arc<dyn RemoteStore>,
    fetcher: Arc<dyn FetchAction>,
    writer: StatusWriter,
    config: SyncConfig,
}

impl TaskSynchronizer {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        fetcher: Arc<dyn FetchAction>,
        retry: RetryConfig,
        config: SyncConfig,
    ) -> Self {
        let writer = StatusWriter::new(store.clone(), config.status_property.clone(), retry);
        Self {
            store,
            fetcher,
            writer,
            config,
        }
    }

    pub async fn pending_records(&self) -> Result<Vec<Record>, StoreError> {
        pending_records(
            self.store.as_ref(),
            &self.config.status_property,
            &self.config.labels.pending,
            self.config.filter_kind,
        )
        .await
    }

    /// Run one synchronization pass.
    ///
    /// A failed query yields an empty report. Once `shutdown` is cancelled no
    /// new record is started; records already in flight finish, including
    /// their status write.
    pub async fn run_pass(&self, shutdown: &CancellationToken) -> SyncReport {
        let started = Instant::now();
        let records = match self.pending_records().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to query pending records: {}", e);
                return SyncReport {
                    elapsed: started.elapsed(),
                    ..SyncReport::default()
                };
            }
        };

        if records.is_empty() {
            tracing::info!("No pending records");
            return SyncReport {
                elapsed: started.elapsed(),
                ..SyncReport::default()
            };
        }

        let total = records.len();
        tracing::info!("Found {} pending record(s)", total);
        let pb = create_progress_bar(self.config.no_progress_bar, total as u64);
        let pb_ref = &pb;

        let outcomes: Vec<TaskOutcome> = stream::iter(records)
            .take_while(|_| std::future::ready(!shutdown.is_cancelled()))
            .map(|record| async move {
                let outcome = self.process(&record, pb_ref).await;
                pb_ref.inc(1);
                outcome
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        pb.finish_and_clear();
        let interrupted = outcomes.len() < total;
        if interrupted {
            tracing::info!(
                "Shutdown requested, {} record(s) left for the next run",
                total - outcomes.len()
            );
        }

        SyncReport {
            outcomes,
            elapsed: started.elapsed(),
            interrupted,
        }
    }

    /// Extract, fetch and reconcile one record.
    async fn process(&self, record: &Record, pb: &ProgressBar) -> TaskOutcome {
        let record_id = record.id.clone();
        let finish = |url: Option<String>, outcome: Outcome| TaskOutcome {
            record_id: record_id.clone(),
            url,
            outcome,
        };

        let Some(url) = schema::extract_url(record, &self.config.url_property) else {
            pb.suspend(|| {
                tracing::info!(
                    record_id = %record.id,
                    "No usable URL in {:?}, skipping",
                    self.config.url_property
                )
            });
            return finish(None, Outcome::Skipped);
        };

        let known = match self.config.resolution {
            StatusResolution::Record => match self.writer.resolve(record) {
                Ok(encoding) => Some(encoding),
                Err(e) => {
                    pb.suspend(|| {
                        tracing::error!(record_id = %record.id, "Not fetching {}: {}", url, e)
                    });
                    let detail = e.to_string();
                    return finish(
                        Some(url),
                        Outcome::UnsupportedSchema {
                            fetch: None,
                            detail,
                        },
                    );
                }
            },
            StatusResolution::Refetch => None,
        };

        if self.config.dry_run {
            pb.suspend(|| tracing::info!(record_id = %record.id, "Would fetch {}", url));
            return finish(Some(url), Outcome::WouldFetch);
        }

        if let Some(label) = &self.config.labels.in_progress {
            if let Err(e) = self.write_status(&record.id, known, label).await {
                pb.suspend(|| {
                    tracing::warn!(record_id = %record.id, "Could not mark in progress: {}", e)
                });
            }
        }

        pb.set_message(url.clone());
        let request = FetchRequest {
            url: url.clone(),
            platform: self.config.platform,
            output_dir: self.config.output_dir.clone(),
        };
        let fetch =
            fetch_with_timeout(self.fetcher.as_ref(), &request, self.config.fetch_timeout).await;

        let label = match &fetch {
            FetchResult::Success { .. } => &self.config.labels.done,
            FetchResult::Failure { reason } => {
                pb.suspend(|| {
                    tracing::warn!(record_id = %record.id, "Fetch failed for {}: {}", url, reason)
                });
                &self.config.labels.failed
            }
        };

        let outcome = match self.write_status(&record.id, known, label).await {
            Ok(()) => match fetch {
                FetchResult::Success { path } => {
                    pb.suspend(|| {
                        tracing::info!(record_id = %record.id, "Downloaded {}", path.display())
                    });
                    self.record_output_path(record, &path, pb).await;
                    Outcome::Succeeded { path }
                }
                FetchResult::Failure { reason } => Outcome::FetchFailed { reason },
            },
            Err(e @ StatusWriteError::UnsupportedSchema { .. }) => {
                pb.suspend(|| {
                    tracing::error!(
                        record_id = %record.id,
                        "Cannot record outcome ({}): {}",
                        outcome::describe_fetch(&fetch),
                        e
                    )
                });
                Outcome::UnsupportedSchema {
                    fetch: Some(fetch),
                    detail: e.to_string(),
                }
            }
            Err(e) => {
                pb.suspend(|| {
                    tracing::error!(
                        record_id = %record.id,
                        "Reconciliation failed ({}): {}",
                        outcome::describe_fetch(&fetch),
                        e
                    )
                });
                Outcome::ReconciliationFailed {
                    fetch,
                    error: e.to_string(),
                }
            }
        };
        finish(Some(url), outcome)
    }

    /// Write `label` with the encoding learned from the queried record, or
    /// re-read the record first when none is known.
    async fn write_status(
        &self,
        id: &str,
        known: Option<FieldEncoding>,
        label: &str,
    ) -> Result<(), StatusWriteError> {
        match known {
            Some(encoding) => self.writer.write(id, encoding, label).await,
            None => self.writer.set_status(id, label).await.map(|_| ()),
        }
    }

    async fn record_output_path(&self, record: &Record, path: &Path, pb: &ProgressBar) {
        let Some(property) = &self.config.path_property else {
            return;
        };
        if let Err(e) = self.writer.write_path(record, property, path).await {
            pb.suspend(|| {
                tracing::warn!(record_id = %record.id, "Could not record output path: {}", e)
            });
        }
    }
}

/// Records whose `status_property` equals `pending`, each id at most once.
///
/// With [`FilterKind::None`] the whole collection is listed and the status
/// value is compared locally.
pub async fn pending_records(
    store: &dyn RemoteStore,
    status_property: &str,
    pending: &str,
    filter_kind: FilterKind,
) -> Result<Vec<Record>, StoreError> {
    let filter = status_filter(status_property, pending, filter_kind);
    let records = store.query(filter.as_ref()).await?;
    let mut seen = HashSet::new();
    Ok(records
        .into_iter()
        .filter(|r| {
            filter.is_some()
                || schema::extract(r, status_property, STATUS_ENCODINGS).as_deref() == Some(pending)
        })
        .filter(|r| seen.insert(r.id.clone()))
        .collect())
}

/// Create a progress bar with a consistent template.
///
/// Returns `ProgressBar::hidden()` when the user passed `--no-progress-bar` or
/// stdout is not a terminal.
fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
