//! Exit code logic for the downloader process.
//!
//! Single responsibility: map a run's result to the process exit outcome.

use std::process::ExitCode;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Setup succeeded and every lesson was attempted.
    Success,
    /// Configuration or setup failed before lessons were attempted.
    Fatal,
    /// At least one lesson failed and failures were requested to be fatal.
    LessonFailures,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Fatal => 1,
            Self::LessonFailures => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Determines the exit outcome of a run whose setup succeeded.
pub(crate) fn determine_exit_outcome(failed: usize, fail_on_error: bool) -> ProcessExit {
    if failed > 0 && fail_on_error {
        ProcessExit::LessonFailures
    } else {
        ProcessExit::Success
    }
}
