//! Catalog and video API client.
//!
//! One [`CatalogClient`] is built per run and shared by the orchestrator and
//! every lesson task, so all requests reuse one connection pool and one cookie
//! jar. Each request carries the platform's `Origin`/`Referer` headers; the
//! `Cookie` header comes from the jar.

mod error;

pub use error::ApiError;

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ORIGIN, REFERER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::auth::AuthContext;
use crate::model::{Course, Lesson};
use crate::platform::{self, Platform};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Course metadata as returned by `GET {api}/courses/{slug}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseResponse {
    title: String,
    #[serde(default)]
    lesson_data: HashMap<String, LessonData>,
}

#[derive(Debug, Deserialize)]
struct LessonData {
    title: String,
    index: u32,
}

impl From<CourseResponse> for Course {
    fn from(response: CourseResponse) -> Self {
        let lessons = response
            .lesson_data
            .into_iter()
            .map(|(hash, data)| Lesson::new(hash, data.title, data.index))
            .collect();
        Course::new(response.title, lessons)
    }
}

/// Manifest source as returned by `GET {api}/video/{hash}/source?f=m3u8`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSource {
    /// Family-level manifest URL, when present.
    #[serde(default)]
    pub url: Option<String>,
}

/// Authenticated client for the catalog/video API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    platform: Platform,
}

impl CatalogClient {
    /// Creates a client that sends the context's cookies with every request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip_all, fields(api = platform.api_base()))]
    pub fn new(platform: Platform, auth: &AuthContext) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(platform::user_agent())
            .gzip(true)
            .cookie_provider(auth.jar())
            .build()
            .map_err(|source| ApiError::ClientBuild { source })?;
        Ok(Self { client, platform })
    }

    /// Returns the platform this client talks to.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Fetches course metadata for a course slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or a body
    /// that is not a course document.
    #[instrument(skip(self))]
    pub async fn fetch_course(&self, slug: &str) -> Result<Course, ApiError> {
        let url = self.platform.course_url(slug);
        let response: CourseResponse = self.get_json(&url).await?;
        let course = Course::from(response);
        debug!(title = %course.title, lessons = course.lessons.len(), "fetched course metadata");
        Ok(course)
    }

    /// Fetches the manifest source document for a lesson.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or a body
    /// that is not a JSON object.
    #[instrument(skip(self))]
    pub async fn fetch_manifest_source(&self, lesson_hash: &str) -> Result<ManifestSource, ApiError> {
        let url = self.platform.manifest_source_url(lesson_hash);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .header(ORIGIN, self.platform.origin_header())
            .header(REFERER, self.platform.referer_header())
            .send()
            .await
            .map_err(|e| ApiError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(url, e))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::decode(url, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_course_response_into_course() {
        let raw = r#"{
            "title": "Complete Intro to Rust",
            "slug": "rust",
            "lessonData": {
                "h2": {"title": "Ownership", "index": 1, "slug": "ownership"},
                "h1": {"title": "Introduction", "index": 0}
            }
        }"#;
        let response: CourseResponse = serde_json::from_str(raw).unwrap();
        let course = Course::from(response);
        assert_eq!(course.title, "Complete Intro to Rust");
        assert_eq!(
            course.lessons,
            vec![
                Lesson::new("h1", "Introduction", 0),
                Lesson::new("h2", "Ownership", 1),
            ]
        );
    }

    #[test]
    fn test_course_without_lessons() {
        let response: CourseResponse = serde_json::from_str(r#"{"title": "Empty"}"#).unwrap();
        assert!(Course::from(response).lessons.is_empty());
    }

    #[test]
    fn test_course_response_requires_title() {
        assert!(serde_json::from_str::<CourseResponse>(r#"{"lessonData": {}}"#).is_err());
    }

    #[test]
    fn test_manifest_source_without_url() {
        let source: ManifestSource = serde_json::from_str("{}").unwrap();
        assert!(source.url.is_none());
    }
}
