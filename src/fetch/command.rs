//! Fetch action backed by an external downloader program.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::error::FetchError;
use super::{FetchAction, FetchRequest, FetchResult};

pub const DEFAULT_PROGRAM: &str = "yt-dlp";

/// Arguments used when none are configured. `--print after_move:filepath`
/// makes yt-dlp report the final file, including one it skipped because it
/// was already downloaded.
pub const DEFAULT_ARGS: &[&str] = &[
    "--no-progress",
    "--no-simulate",
    "--paths",
    "{output_dir}",
    "--print",
    "after_move:filepath",
    "{url}",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv"];

/// Lines of stderr kept in a failure reason.
const STDERR_TAIL_LINES: usize = 10;

/// Runs `program` with a templated argument list and returns the video file
/// the program reported on stdout.
///
/// Supported placeholders: `{url}`, `{output_dir}`, `{platform}`. The last
/// stdout line naming an existing video file wins; relative paths are taken
/// from the output directory. The child is killed if the fetch future is
/// dropped, which is how timeouts stop it.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
}

impl CommandFetcher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let args = if args.is_empty() {
            DEFAULT_ARGS.iter().map(|s| s.to_string()).collect()
        } else {
            args
        };
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn render_args(&self, request: &FetchRequest) -> Vec<String> {
        let output_dir = request.output_dir.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{url}", &request.url)
                    .replace("{output_dir}", &output_dir)
                    .replace("{platform}", request.platform.as_str())
            })
            .collect()
    }

    async fn run(&self, request: &FetchRequest) -> Result<PathBuf, FetchError> {
        tokio::fs::create_dir_all(&request.output_dir).await?;
        let args = self.render_args(request);
        tracing::debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FetchError::Exited {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        reported_video(&stdout, &request.output_dir)
            .await
            .ok_or_else(|| FetchError::NoOutput {
                dir: request.output_dir.clone(),
            })
    }
}

impl Default for CommandFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, Vec::new())
    }
}

#[async_trait]
impl FetchAction for CommandFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        match self.run(request).await {
            Ok(path) => FetchResult::Success { path },
            Err(e) => FetchResult::Failure {
                reason: e.to_string(),
            },
        }
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| VIDEO_EXTENSIONS.iter().any(|v| e.eq_ignore_ascii_case(v)))
}

/// Last line of `stdout` that names an existing video file.
async fn reported_video(stdout: &str, output_dir: &Path) -> Option<PathBuf> {
    for line in stdout.lines().rev() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let candidate = output_dir.join(line);
        if !is_video(&candidate) {
            continue;
        }
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => return Some(candidate),
            _ => tracing::debug!("Ignoring reported path {}", candidate.display()),
        }
    }
    None
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
