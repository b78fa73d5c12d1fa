use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::FetchResult;

/// How one record left a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fetched and reconciled as done.
    Succeeded { path: PathBuf },
    /// Fetch failed and the record was reconciled as failed.
    FetchFailed { reason: String },
    /// No usable URL; nothing was fetched or written.
    Skipped,
    /// The status property's encoding is unknown. `fetch` is set when the
    /// encoding was only checked after fetching.
    UnsupportedSchema {
        fetch: Option<FetchResult>,
        detail: String,
    },
    /// The fetch outcome is known locally but could not be written back.
    ReconciliationFailed { fetch: FetchResult, error: String },
    /// Dry run: the record would have been fetched.
    WouldFetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub record_id: String,
    pub url: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<TaskOutcome>,
    pub elapsed: Duration,
    /// Shutdown was requested before every eligible record was started.
    pub interrupted: bool,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|t| pred(&t.outcome)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Succeeded { .. }))
    }

    pub fn fetch_failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::FetchFailed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn unsupported(&self) -> usize {
        self.count(|o| matches!(o, Outcome::UnsupportedSchema { .. }))
    }

    pub fn reconciliation_failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::ReconciliationFailed { .. }))
    }

    pub fn would_fetch(&self) -> usize {
        self.count(|o| matches!(o, Outcome::WouldFetch))
    }

    /// Records whose remote status could not be brought in line with what
    /// happened locally.
    pub fn has_unreconciled(&self) -> bool {
        self.unsupported() > 0 || self.reconciliation_failed() > 0
    }

    pub fn log_summary(&self) {
        if self.outcomes.is_empty() {
            return;
        }
        if self.would_fetch() > 0 {
            tracing::info!(
                "Dry run: {} record(s) would be fetched, {} skipped",
                self.would_fetch(),
                self.skipped()
            );
            return;
        }
        tracing::info!(
            "Pass complete in {:.1}s: {} downloaded, {} failed, {} skipped, {} unsupported schema, {} unreconciled{}",
            self.elapsed.as_secs_f64(),
            self.succeeded(),
            self.fetch_failed(),
            self.skipped(),
            self.unsupported(),
            self.reconciliation_failed(),
            if self.interrupted { " (interrupted)" } else { "" }
        );
        for task in &self.outcomes {
            if let Outcome::ReconciliationFailed { fetch, error } = &task.outcome {
                tracing::error!(
                    record_id = %task.record_id,
                    "Remote status is stale (local outcome: {}): {}",
                    describe_fetch(fetch),
                    error
                );
            }
        }
    }
}

pub(crate) fn describe_fetch(fetch: &FetchResult) -> String {
    match fetch {
        FetchResult::Success { path } => format!("downloaded to {}", path.display()),
        FetchResult::Failure { reason } => format!("fetch failed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(outcome: Outcome) -> TaskOutcome {
        TaskOutcome {
            record_id: "r".into(),
            url: None,
            outcome,
        }
    }

    #[test]
    fn test_counts() {
        let report = SyncReport {
            outcomes: vec![
                task(Outcome::Succeeded {
                    path: PathBuf::from("/out/1.mp4"),
                }),
                task(Outcome::Succeeded {
                    path: PathBuf::from("/out/2.mp4"),
                }),
                task(Outcome::FetchFailed {
                    reason: "network".into(),
                }),
                task(Outcome::Skipped),
            ],
            ..SyncReport::default()
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.fetch_failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.unsupported(), 0);
        assert!(!report.has_unreconciled());
    }

    #[test]
    fn test_unsupported_schema_is_unreconciled() {
        let report = SyncReport {
            outcomes: vec![task(Outcome::UnsupportedSchema {
                fetch: None,
                detail: "checkbox".into(),
            })],
            ..SyncReport::default()
        };
        assert!(report.has_unreconciled());
    }

    #[test]
    fn test_reconciliation_failed_is_unreconciled() {
        let report = SyncReport {
            outcomes: vec![task(Outcome::ReconciliationFailed {
                fetch: FetchResult::Success {
                    path: PathBuf::from("/out/1.mp4"),
                },
                error: "503".into(),
            })],
            ..SyncReport::default()
        };
        assert_eq!(report.reconciliation_failed(), 1);
        assert!(report.has_unreconciled());
    }

    #[test]
    fn test_describe_fetch() {
        assert_eq!(
            describe_fetch(&FetchResult::Failure {
                reason: "network".into()
            }),
            "fetch failed: network"
        );
    }
}
