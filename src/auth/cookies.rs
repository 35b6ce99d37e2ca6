//! Authentication cookie jar shared across concurrent lesson downloads.
//!
//! The platform authenticates with a single long-lived cookie. It is installed
//! once into a `reqwest::cookie::Jar`, which the API client also uses as its
//! cookie provider, so `Set-Cookie` refreshes from the API land in the same
//! store. Header values for the remux tool are derived from the jar per URL.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, instrument};
use url::Url;

use crate::config::ConfigError;
use crate::platform::{AUTH_COOKIE_NAME, Platform};

/// Shared authentication state for one run.
///
/// Cloning is cheap and every clone observes the same jar. The jar serializes
/// writes internally, so a reader sees either the whole cookie set before a
/// refresh or the whole set after it.
///
/// The Debug output never includes cookie values.
#[derive(Clone)]
pub struct AuthContext {
    jar: Arc<Jar>,
    site: Url,
}

impl AuthContext {
    /// Creates the context and installs the initial authentication cookie.
    ///
    /// The cookie is scoped to the site's domain (so API subdomains receive it),
    /// marked `HttpOnly`, and marked `Secure` when the site is served over https.
    /// When the site host is an IP address no `Domain` attribute is set and the
    /// cookie is host-only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] for an empty token and
    /// [`ConfigError::InvalidToken`] for a token that cannot be a cookie value.
    #[instrument(level = "debug", skip_all, fields(site = %platform.site_origin()))]
    pub fn new(platform: &Platform, token: &str) -> Result<Self, ConfigError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if !is_valid_cookie_value(token) {
            return Err(ConfigError::InvalidToken);
        }

        let site = platform.site_origin().clone();
        let jar = Arc::new(Jar::default());
        jar.add_cookie_str(&initial_cookie(&site, token), &site);
        debug!(
            cookie = AUTH_COOKIE_NAME,
            domain = site.domain().unwrap_or("<host-only>"),
            "installed authentication cookie"
        );

        Ok(Self { jar, site })
    }

    /// Returns the `Cookie` header value applicable to `url`, if any.
    ///
    /// Domain, path and secure matching follow the jar's cookie rules; a URL
    /// on an unrelated domain yields `None`.
    #[must_use]
    pub fn cookie_header_for(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
    }

    /// Returns the underlying jar for use as an HTTP client cookie provider.
    #[must_use]
    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("site", &self.site.as_str())
            .field("cookie", &"[REDACTED]")
            .finish()
    }
}

fn initial_cookie(site: &Url, token: &str) -> String {
    let mut cookie = format!("{AUTH_COOKIE_NAME}={token}; Path=/");
    if let Some(domain) = site.domain() {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie.push_str("; HttpOnly");
    if site.scheme() == "https" {
        cookie.push_str("; Secure");
    }
    cookie
}

// RFC 6265 cookie-octet, without quoting support.
fn is_valid_cookie_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}
