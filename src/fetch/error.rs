use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a fetch did not produce a video file.
///
/// These never escape the fetch module as errors: the synchronizer only sees
/// the rendered message inside [`super::FetchResult::Failure`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed ({status}): {stderr}")]
    Exited {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("finished but reported no video file under {}", .dir.display())]
    NoOutput { dir: PathBuf },

    #[error("disk error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}
