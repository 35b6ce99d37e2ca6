//! Supervision of the external remux tool.
//!
//! One [`Remuxer`] is shared by every lesson task. Each [`Remuxer::run`] spawns
//! the program with the lesson's header block, pumps its stdout through the
//! shared [`Throttle`], logs its stderr as it arrives and maps the terminal
//! state to a [`RemuxOutcome`] or a [`RemuxError`].

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, instrument, warn};
use url::Url;

use super::error::RemuxError;
use super::throttle::{Throttle, copy_throttled};
use crate::auth::AuthContext;
use crate::config::DEFAULT_FFMPEG_PATH;
use crate::platform::Platform;

const STDERR_CHUNK_BYTES: usize = 4096;

/// Immutable request headers for one lesson's remux.
///
/// Built once per task so concurrent tasks never share or mutate a header set.
/// The Debug output redacts the cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(&'static str, String)>,
}

impl RequestHeaders {
    /// Snapshots `Origin`, `Referer` and the cookie applicable to `url`.
    #[must_use]
    pub fn for_url(platform: &Platform, auth: &AuthContext, url: &Url) -> Self {
        let mut entries: Vec<(&'static str, String)> = platform.static_headers().into();
        if let Some(cookie) = auth.cookie_header_for(url) {
            entries.push(("Cookie", cookie));
        }
        Self { entries }
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Newline-joined `Key: Value` lines, as passed to `-headers`.
    #[must_use]
    pub fn to_header_block(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Debug for RequestHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if key.eq_ignore_ascii_case("cookie") {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// How the remux program is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxOptions {
    /// Program to execute.
    pub program: PathBuf,
    /// Kill the child when it runs longer than this.
    pub timeout: Option<Duration>,
    /// Forward the child's stdout to ours instead of discarding it.
    pub passthrough_stdout: bool,
}

impl Default for RemuxOptions {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_FFMPEG_PATH),
            timeout: None,
            passthrough_stdout: false,
        }
    }
}

/// Result of a successful remux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxOutcome {
    /// The written file.
    pub output: PathBuf,
    /// Bytes the child wrote to stdout.
    pub stdout_bytes: u64,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

/// Spawns and supervises remux processes.
#[derive(Debug, Clone)]
pub struct Remuxer {
    options: RemuxOptions,
    throttle: Arc<Throttle>,
}

impl Remuxer {
    /// Creates a remuxer whose stdout streams all share `throttle`.
    #[must_use]
    pub fn new(options: RemuxOptions, throttle: Arc<Throttle>) -> Self {
        Self { options, throttle }
    }

    /// Returns the run options.
    #[must_use]
    pub fn options(&self) -> &RemuxOptions {
        &self.options
    }

    /// Remuxes `input` into `output`, waiting for the child to exit.
    ///
    /// # Errors
    ///
    /// - [`RemuxError::Spawn`] if the program cannot be started
    /// - [`RemuxError::Io`] if supervising the child fails
    /// - [`RemuxError::ExitStatus`] if it exits unsuccessfully
    /// - [`RemuxError::TimedOut`] if the deadline passes; the child is killed
    #[instrument(skip(self, headers, output), fields(output = %output.display()))]
    pub async fn run(
        &self,
        input: &Url,
        headers: &RequestHeaders,
        output: &Path,
    ) -> Result<RemuxOutcome, RemuxError> {
        let args = build_args(&headers.to_header_block(), input.as_str(), output);
        debug!(program = %self.options.program.display(), "spawning remux");

        let started = Instant::now();
        let mut child = Command::new(&self.options.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RemuxError::spawn(&self.options.program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RemuxError::io(output, std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RemuxError::io(output, std::io::Error::other("stderr not captured")))?;

        let throttle = Arc::clone(&self.throttle);
        let passthrough = self.options.passthrough_stdout;
        let stdout_task = tokio::spawn(async move {
            let mut stdout = stdout;
            if passthrough {
                copy_throttled(&mut stdout, &mut tokio::io::stdout(), &throttle).await
            } else {
                copy_throttled(&mut stdout, &mut tokio::io::sink(), &throttle).await
            }
        });
        let stderr_task = tokio::spawn(log_stderr(stderr).in_current_span());

        let waited = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "remux deadline passed, killing child");
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill remux child");
                    }
                    stdout_task.abort();
                    stderr_task.abort();
                    return Err(RemuxError::timed_out(output, limit));
                }
            },
            None => child.wait().await,
        };
        let status = waited.map_err(|e| RemuxError::io(output, e))?;

        let stdout_bytes = stdout_task
            .await
            .map_err(|e| RemuxError::io(output, std::io::Error::other(e)))?
            .map_err(|e| RemuxError::io(output, e))?;
        if let Err(e) = stderr_task.await {
            warn!(error = %e, "stderr reader task failed");
        }

        if !status.success() {
            warn!(%status, "remux exited unsuccessfully");
            return Err(RemuxError::exit_status(output, status));
        }

        let elapsed = started.elapsed();
        debug!(stdout_bytes, elapsed_ms = elapsed.as_millis(), "remux finished");
        Ok(RemuxOutcome {
            output: output.to_path_buf(),
            stdout_bytes,
            elapsed,
        })
    }
}

/// Argument vector: `-y -headers <block> -i <input> -map 0 -c copy <output>`.
#[must_use]
pub fn build_args(header_block: &str, input: &str, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-headers".into(),
        header_block.into(),
        "-i".into(),
        input.into(),
        "-map".into(),
        "0".into(),
        "-c".into(),
        "copy".into(),
        output.as_os_str().to_owned(),
    ]
}

/// Logs stderr in raw chunks as they arrive, until EOF.
async fn log_stderr<R: AsyncRead + Unpin>(mut stderr: R) {
    let mut buf = vec![0u8; STDERR_CHUNK_BYTES];
    loop {
        match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                let chunk = chunk.trim_end();
                if !chunk.is_empty() {
                    info!(target: "remux", "{chunk}");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed reading remux stderr");
                break;
            }
        }
    }
}
