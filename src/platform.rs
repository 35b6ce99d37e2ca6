//! Endpoints and request identity for the course platform.
//!
//! Every outbound request carries the same `Origin`/`Referer` pair derived from
//! the site origin. Both the API base and the site origin can be overridden so
//! the client can be pointed at a mirror or a local mock server.

use url::Url;

/// Default catalog/video API base.
pub const DEFAULT_API_BASE: &str = "https://api.frontendmasters.com/v1/kabuki";

/// Default site origin used for `Origin`/`Referer` and cookie scoping.
pub const DEFAULT_SITE_ORIGIN: &str = "https://frontendmasters.com";

/// Name of the authentication cookie the platform expects.
pub const AUTH_COOKIE_NAME: &str = "fem_auth_mod";

/// Returns the User-Agent sent with API requests.
#[must_use]
pub fn user_agent() -> String {
    format!("course-downloader/{}", env!("CARGO_PKG_VERSION"))
}

/// Immutable description of the remote platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    api_base: String,
    site_origin: Url,
}

impl Platform {
    /// Creates a platform description from an API base and site origin.
    ///
    /// Trailing slashes on the API base are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when either value is not an absolute URL.
    pub fn new(api_base: &str, site_origin: &str) -> Result<Self, url::ParseError> {
        let api_base = api_base.trim().trim_end_matches('/');
        Url::parse(api_base)?;
        let site_origin = Url::parse(site_origin.trim())?;
        Ok(Self {
            api_base: api_base.to_string(),
            site_origin,
        })
    }

    /// Returns the API base without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the site origin URL.
    #[must_use]
    pub fn site_origin(&self) -> &Url {
        &self.site_origin
    }

    /// Value of the `Origin` header, e.g. `https://frontendmasters.com`.
    #[must_use]
    pub fn origin_header(&self) -> String {
        self.site_origin.origin().ascii_serialization()
    }

    /// Value of the `Referer` header, e.g. `https://frontendmasters.com/`.
    #[must_use]
    pub fn referer_header(&self) -> String {
        format!("{}/", self.origin_header())
    }

    /// Static headers sent with every request, in a stable order.
    #[must_use]
    pub fn static_headers(&self) -> [(&'static str, String); 2] {
        [
            ("Origin", self.origin_header()),
            ("Referer", self.referer_header()),
        ]
    }

    /// Course metadata endpoint for a course slug.
    #[must_use]
    pub fn course_url(&self, slug: &str) -> String {
        format!("{}/courses/{slug}", self.api_base)
    }

    /// Manifest source endpoint for a lesson hash.
    #[must_use]
    pub fn manifest_source_url(&self, lesson_hash: &str) -> String {
        format!("{}/video/{lesson_hash}/source?f=m3u8", self.api_base)
    }
}

impl Default for Platform {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_SITE_ORIGIN)
            .expect("default platform URLs are valid")
    }
}
