//! Error types for the download module.
//!
//! [`RemuxError`] covers one supervised remux process; [`LessonError`] is the
//! per-lesson failure the scheduler records. Neither is fatal to a run.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::manifest::ResolveError;

/// Errors that can occur while supervising the remux tool.
#[derive(Debug, Error)]
pub enum RemuxError {
    /// The program could not be started (missing binary, permissions, ...).
    #[error("failed to start remux program '{}': {source}", program.display())]
    Spawn {
        /// Program that failed to start.
        program: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's output or waiting for it failed.
    #[error("I/O error while remuxing to {}: {source}", path.display())]
    Io {
        /// Output file of the remux.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("remux to {} failed: {status}", path.display())]
    ExitStatus {
        /// Output file of the remux.
        path: PathBuf,
        /// The child's exit status.
        status: ExitStatus,
    },

    /// The program outlived its deadline and was killed.
    #[error("remux to {} timed out after {}s", path.display(), timeout.as_secs())]
    TimedOut {
        /// Output file of the remux.
        path: PathBuf,
        /// The configured deadline.
        timeout: Duration,
    },
}

impl RemuxError {
    /// Creates a spawn error.
    pub fn spawn(program: &Path, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.to_path_buf(),
            source,
        }
    }

    /// Creates an I/O error for an output path.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates an exit status error.
    pub fn exit_status(path: &Path, status: ExitStatus) -> Self {
        Self::ExitStatus {
            path: path.to_path_buf(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timed_out(path: &Path, timeout: Duration) -> Self {
        Self::TimedOut {
            path: path.to_path_buf(),
            timeout,
        }
    }

    /// Exit code of the child, when it exited on its own with one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitStatus { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// Why a single lesson failed.
#[derive(Debug, Error)]
pub enum LessonError {
    /// The manifest could not be resolved.
    #[error("lesson {index} \"{title}\": {source}")]
    Resolve {
        /// Lesson index.
        index: u32,
        /// Lesson title.
        title: String,
        /// The resolve failure.
        #[source]
        source: ResolveError,
    },

    /// The remux tool failed.
    #[error("lesson {index} \"{title}\": {source}")]
    Remux {
        /// Lesson index.
        index: u32,
        /// Lesson title.
        title: String,
        /// The remux failure.
        #[source]
        source: RemuxError,
    },
}
