//! Error types for manifest resolution.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur while resolving a lesson's manifest URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The manifest source request failed (transport, status or body).
    #[error("manifest lookup failed for lesson {lesson_hash}: {source}")]
    Api {
        /// The lesson being resolved.
        lesson_hash: String,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// The response had no usable `url` field.
    #[error("manifest response for lesson {lesson_hash} has no url")]
    MissingUrl {
        /// The lesson being resolved.
        lesson_hash: String,
    },

    /// The `url` field could not be rewritten to a rendition URL.
    #[error("invalid manifest url for lesson {lesson_hash}: {url}")]
    InvalidUrl {
        /// The lesson being resolved.
        lesson_hash: String,
        /// The unusable URL.
        url: String,
    },
}

impl ResolveError {
    /// Creates an API error for a lesson.
    pub fn api(lesson_hash: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            lesson_hash: lesson_hash.into(),
            source,
        }
    }

    /// Creates a missing-url error.
    pub fn missing_url(lesson_hash: impl Into<String>) -> Self {
        Self::MissingUrl {
            lesson_hash: lesson_hash.into(),
        }
    }

    /// Creates an invalid-url error.
    pub fn invalid_url(lesson_hash: impl Into<String>, url: impl Into<String>) -> Self {
        Self::InvalidUrl {
            lesson_hash: lesson_hash.into(),
            url: url.into(),
        }
    }
}
