//! Lesson manifest resolution.
//!
//! The video API returns a family-level manifest URL for a lesson; the
//! resolver swaps its last path segment for the rendition chosen by
//! [`Quality`]. The query string, if any, is kept.
//!
//! # Example
//!
//! ```
//! use course_downloader::manifest::{Quality, select_rendition};
//!
//! let url = select_rendition("https://cdn.example.com/v/abc/index.m3u8", Quality::P720).unwrap();
//! assert_eq!(url.as_str(), "https://cdn.example.com/v/abc/index_720_Q8_5mbps.m3u8");
//! ```

mod error;
mod quality;

pub use error::ResolveError;
pub use quality::Quality;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};
use url::Url;

use crate::api::CatalogClient;

/// A resolved, quality-specific manifest URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestUrl(Url);

impl ManifestUrl {
    /// Returns the URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ManifestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Resolves lesson hashes to rendition manifest URLs. Does not retry.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    api: Arc<CatalogClient>,
    quality: Quality,
}

impl ManifestResolver {
    /// Creates a resolver for a fixed quality.
    #[must_use]
    pub fn new(api: Arc<CatalogClient>, quality: Quality) -> Self {
        Self { api, quality }
    }

    /// Returns the configured quality.
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Resolves a lesson's manifest URL at the configured quality.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the API call fails, returns non-2xx, or the
    /// body lacks a usable `url` field.
    #[instrument(skip(self), fields(quality = %self.quality))]
    pub async fn resolve(&self, lesson_hash: &str) -> Result<ManifestUrl, ResolveError> {
        let source = self
            .api
            .fetch_manifest_source(lesson_hash)
            .await
            .map_err(|e| ResolveError::api(lesson_hash, e))?;

        let source_url = source
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ResolveError::missing_url(lesson_hash))?;

        let url = select_rendition(&source_url, self.quality)
            .ok_or_else(|| ResolveError::invalid_url(lesson_hash, &source_url))?;
        debug!(manifest = %url, "resolved manifest");
        Ok(ManifestUrl(url))
    }
}

/// Replaces the last path segment of `source_url` with the rendition file name.
///
/// Returns `None` if the URL cannot be parsed or cannot carry a path.
#[must_use]
pub fn select_rendition(source_url: &str, quality: Quality) -> Option<Url> {
    let mut url = Url::parse(source_url.trim()).ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop().push(&quality.manifest_file_name());
    }
    Some(url)
}
