//! Whole-course orchestration.
//!
//! A run moves through [`RunPhase`]s in order:
//!
//! ```text
//! Init → FetchCourseMetadata → EnsureDestinationDir → EnqueueLessons → AwaitDrain → Done
//! ```
//!
//! Any failure before `EnqueueLessons` completes is fatal and aborts the run
//! before a lesson task is submitted. From then on lesson failures are
//! recorded in the [`RunSummary`] and never stop other lessons.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, CatalogClient};
use crate::auth::AuthContext;
use crate::config::{ConfigError, Settings};
use crate::download::{
    LessonDownloader, LessonError, RemuxOptions, RemuxOutcome, Remuxer, Throttle, course_dir,
};
use crate::manifest::ManifestResolver;
use crate::model::Lesson;
use crate::queue::{QueueError, TaskOutcome, TaskQueue};

/// Lifecycle phase of a course run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Building the auth context and API client.
    Init,
    /// Fetching course metadata.
    FetchCourseMetadata,
    /// Creating the course directory.
    EnsureDestinationDir,
    /// Submitting one task per lesson.
    EnqueueLessons,
    /// Waiting for every lesson task to finish.
    AwaitDrain,
    /// All lessons attempted.
    Done,
    /// The run aborted before lessons were attempted.
    FatalError,
}

/// Fatal run errors. Lesson failures are not errors at this level.
#[derive(Debug, Error)]
pub enum CourseError {
    /// The auth token was rejected before any request.
    #[error("invalid authentication setup: {source}")]
    Auth {
        /// The underlying configuration error.
        #[source]
        source: ConfigError,
    },

    /// The HTTP client could not be built.
    #[error("failed to initialize API client: {source}")]
    Client {
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// Course metadata could not be fetched or parsed.
    #[error("failed to fetch metadata for course '{slug}': {source}")]
    Metadata {
        /// Course slug.
        slug: String,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// The course directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The lesson queue could not be started or fed.
    #[error("lesson queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[source]
        source: QueueError,
    },
}

impl CourseError {
    /// Phase in which the error occurred.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::Auth { .. } | Self::Client { .. } => RunPhase::Init,
            Self::Metadata { .. } => RunPhase::FetchCourseMetadata,
            Self::CreateDir { .. } => RunPhase::EnsureDestinationDir,
            Self::Queue { .. } => RunPhase::EnqueueLessons,
        }
    }
}

/// A lesson that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonFailure {
    /// The lesson.
    pub lesson: Lesson,
    /// Human-readable reason.
    pub reason: String,
}

/// Result of a run that got past setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Course title as returned by the API.
    pub course_title: String,
    /// Directory the lessons were written to.
    pub course_dir: PathBuf,
    /// Lessons written successfully, with their output files.
    pub succeeded: Vec<(Lesson, PathBuf)>,
    /// Lessons that failed.
    pub failed: Vec<LessonFailure>,
}

impl RunSummary {
    /// Number of lessons attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when every lesson succeeded.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Downloads every lesson of one course.
#[derive(Debug, Clone)]
pub struct CourseDownloader {
    settings: Settings,
}

impl CourseDownloader {
    /// Creates a downloader for validated settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the course download to completion.
    ///
    /// # Errors
    ///
    /// Returns [`CourseError`] for failures before any lesson is submitted.
    /// Lesson failures are reported in the returned [`RunSummary`].
    #[instrument(skip(self), fields(course = %self.settings.course_slug))]
    pub async fn run(&self) -> Result<RunSummary, CourseError> {
        let result = self.run_phases().await;
        if let Err(e) = &result {
            debug!(phase = ?e.phase(), "run aborted");
            enter(RunPhase::FatalError);
        }
        result
    }

    async fn run_phases(&self) -> Result<RunSummary, CourseError> {
        let settings = &self.settings;

        enter(RunPhase::Init);
        let auth = AuthContext::new(&settings.platform, &settings.auth_token)
            .map_err(|source| CourseError::Auth { source })?;
        let api = Arc::new(
            CatalogClient::new(settings.platform.clone(), &auth)
                .map_err(|source| CourseError::Client { source })?,
        );

        enter(RunPhase::FetchCourseMetadata);
        let course = api
            .fetch_course(&settings.course_slug)
            .await
            .map_err(|source| CourseError::Metadata {
                slug: settings.course_slug.clone(),
                source,
            })?;
        info!(title = %course.title, lessons = course.lessons.len(), "fetched course");

        enter(RunPhase::EnsureDestinationDir);
        let dir = course_dir(&settings.download_root, &course.title);
        ensure_dir(&dir).await?;

        enter(RunPhase::EnqueueLessons);
        let throttle = Arc::new(Throttle::from_limit(settings.bandwidth_limit));
        let remuxer = Remuxer::new(
            RemuxOptions {
                program: settings.ffmpeg_path.clone(),
                timeout: settings.remux_timeout,
                passthrough_stdout: settings.passthrough_stdout,
            },
            throttle,
        );
        let downloader = LessonDownloader::new(
            ManifestResolver::new(Arc::clone(&api), settings.quality),
            auth,
            settings.platform.clone(),
            remuxer,
        );

        let mut queue: TaskQueue<RemuxOutcome, LessonError> =
            TaskQueue::new(settings.concurrency).map_err(|source| CourseError::Queue { source })?;
        for lesson in &course.lessons {
            let downloader = downloader.clone();
            let lesson = lesson.clone();
            let dir = dir.clone();
            queue
                .submit(lesson.label(), async move { downloader.download(&lesson, &dir).await })
                .map_err(|source| CourseError::Queue { source })?;
        }
        info!(
            lessons = course.lessons.len(),
            concurrency = settings.concurrency,
            quality = %settings.quality,
            "queued lessons"
        );

        enter(RunPhase::AwaitDrain);
        let reports = queue.drain().await;

        let mut summary = RunSummary {
            course_title: course.title.clone(),
            course_dir: dir,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        // Task ids follow submission order, which is lesson order.
        for (lesson, report) in course.lessons.into_iter().zip(reports) {
            match report.outcome {
                TaskOutcome::Succeeded(outcome) => summary.succeeded.push((lesson, outcome.output)),
                TaskOutcome::Failed(error) => summary.failed.push(LessonFailure {
                    lesson,
                    reason: error.to_string(),
                }),
                TaskOutcome::Panicked(message) => summary.failed.push(LessonFailure {
                    lesson,
                    reason: format!("task panicked: {message}"),
                }),
            }
        }

        enter(RunPhase::Done);
        if summary.is_complete_success() {
            info!(succeeded = summary.succeeded.len(), "course download finished");
        } else {
            warn!(
                succeeded = summary.succeeded.len(),
                failed = summary.failed.len(),
                "course download finished with failures"
            );
        }
        Ok(summary)
    }
}

fn enter(phase: RunPhase) {
    debug!(?phase, "entering phase");
}

async fn ensure_dir(path: &Path) -> Result<(), CourseError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| CourseError::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "course directory ready");
    Ok(())
}
