//! The fetch action: URL in, video file out.
//!
//! The synchronizer treats fetching as opaque. It only needs to know whether
//! a file was produced and where, or why not.

pub mod command;
pub mod error;

pub use command::CommandFetcher;
pub use error::FetchError;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub platform: Platform,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success { path: PathBuf },
    Failure { reason: String },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }
}

#[async_trait]
pub trait FetchAction: Send + Sync {
    /// Retrieve one video. Implementations report failure in the result
    /// instead of returning an error.
    async fn fetch(&self, request: &FetchRequest) -> FetchResult;
}

/// Run `action` with a deadline. Running out of time is an ordinary failure,
/// so the caller still reconciles the record as failed.
pub async fn fetch_with_timeout(
    action: &dyn FetchAction,
    request: &FetchRequest,
    limit: Duration,
) -> FetchResult {
    match tokio::time::timeout(limit, action.fetch(request)).await {
        Ok(result) => result,
        Err(_) => FetchResult::Failure {
            reason: FetchError::TimedOut(limit).to_string(),
        },
    }
}
