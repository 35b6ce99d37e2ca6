//! The per-lesson download task.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::error::LessonError;
use super::filename::lesson_file_name;
use super::remux::{RemuxOutcome, Remuxer, RequestHeaders};
use crate::auth::AuthContext;
use crate::manifest::ManifestResolver;
use crate::model::Lesson;
use crate::platform::Platform;

/// Resolves a lesson's manifest and remuxes it to disk.
///
/// Cheap to clone; all clones share the resolver's API client, the cookie jar
/// and the remuxer's throttle.
#[derive(Debug, Clone)]
pub struct LessonDownloader {
    resolver: ManifestResolver,
    auth: AuthContext,
    platform: Platform,
    remuxer: Remuxer,
}

impl LessonDownloader {
    /// Creates a downloader from its shared collaborators.
    #[must_use]
    pub fn new(
        resolver: ManifestResolver,
        auth: AuthContext,
        platform: Platform,
        remuxer: Remuxer,
    ) -> Self {
        Self {
            resolver,
            auth,
            platform,
            remuxer,
        }
    }

    /// Output path of `lesson` inside `course_dir`.
    #[must_use]
    pub fn output_path(course_dir: &Path, lesson: &Lesson) -> PathBuf {
        course_dir.join(lesson_file_name(lesson.index, &lesson.title))
    }

    /// Downloads one lesson into `course_dir`.
    ///
    /// The header snapshot is taken after the manifest is resolved, so it
    /// carries the cookies current at that point for the manifest's host.
    ///
    /// # Errors
    ///
    /// Returns [`LessonError::Resolve`] or [`LessonError::Remux`] with the
    /// lesson's index and title attached.
    #[instrument(skip_all, fields(lesson = lesson.index, hash = %lesson.hash))]
    pub async fn download(
        &self,
        lesson: &Lesson,
        course_dir: &Path,
    ) -> Result<RemuxOutcome, LessonError> {
        let manifest =
            self.resolver
                .resolve(&lesson.hash)
                .await
                .map_err(|source| LessonError::Resolve {
                    index: lesson.index,
                    title: lesson.title.clone(),
                    source,
                })?;

        let headers = RequestHeaders::for_url(&self.platform, &self.auth, manifest.as_url());
        let output = Self::output_path(course_dir, lesson);
        info!(lesson = %lesson.label(), output = %output.display(), "downloading");

        let outcome = self
            .remuxer
            .run(manifest.as_url(), &headers, &output)
            .await
            .map_err(|source| LessonError::Remux {
                index: lesson.index,
                title: lesson.title.clone(),
                source,
            })?;

        info!(lesson = %lesson.label(), "finished");
        Ok(outcome)
    }
}
