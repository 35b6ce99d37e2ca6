//! Run configuration: file loading, layering and validation.
//!
//! Values are layered as defaults ← TOML file ← environment ← CLI flags. The
//! file and CLI layers are both expressed as a [`FileConfig`] of optional
//! fields; [`FileConfig::merge`] stacks them and [`Settings::build`] validates
//! the result into an immutable [`Settings`].

use std::env;
use std::fmt;
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::manifest::Quality;
use crate::platform::{DEFAULT_API_BASE, DEFAULT_SITE_ORIGIN, Platform};
use crate::queue::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Environment variable consulted for the authentication token.
pub const AUTH_TOKEN_ENV: &str = "COURSE_DL_AUTH_TOKEN";

/// Default aggregate bandwidth cap in bytes per second.
pub const DEFAULT_BANDWIDTH_LIMIT: u64 = 1_000_000;

/// Default remux program.
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Name of the application directory under the config root.
const APP_DIR_NAME: &str = "course-downloader";

/// Errors raised while loading or validating configuration. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No authentication token was supplied, or it was empty.
    #[error("missing authentication token (set auth_token, --token or COURSE_DL_AUTH_TOKEN)")]
    MissingToken,

    /// The token contains characters that cannot appear in a cookie value.
    #[error("authentication token contains characters not allowed in a cookie value")]
    InvalidToken,

    /// No course URL or slug was supplied.
    #[error("missing course url")]
    MissingCourseUrl,

    /// The course URL has no usable slug.
    #[error("cannot derive a course slug from '{value}'")]
    InvalidCourseUrl {
        /// The rejected value.
        value: String,
    },

    /// The quality is not one of the supported resolutions.
    #[error("unknown quality '{value}' (expected one of 2160, 1440, 1080, 720, 360)")]
    UnknownQuality {
        /// The rejected value.
        value: String,
    },

    /// Concurrency outside `1..=100`.
    #[error("invalid concurrency {value} (expected 1..=100)")]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },

    /// A URL-valued setting could not be parsed.
    #[error("invalid url for `{field}`: '{value}'")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The config file exists but could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    ReadFile {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{}': {source}", path.display())]
    ParseFile {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// One configuration layer. Every field is optional; unset fields fall through
/// to the layer below.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Authentication cookie value.
    pub auth_token: Option<String>,
    /// Course URL or bare slug.
    pub course_url: Option<String>,
    /// Resolution label (2160, 1440, 1080, 720, 360).
    pub quality: Option<u32>,
    /// Worker count (1..=100).
    pub concurrency: Option<usize>,
    /// Aggregate bytes per second; 0 disables throttling.
    pub bandwidth_limit: Option<u64>,
    /// Root directory for course folders.
    pub download_dir: Option<PathBuf>,
    /// Remux program path.
    pub ffmpeg_path: Option<PathBuf>,
    /// Per-lesson remux deadline in seconds; 0 disables it.
    pub remux_timeout_secs: Option<u64>,
    /// Forward remux stdout to this process's stdout.
    pub passthrough_stdout: Option<bool>,
    /// Exit non-zero when any lesson fails.
    pub fail_on_error: Option<bool>,
    /// API base URL override.
    pub api_base_url: Option<String>,
    /// Site origin override.
    pub site_origin: Option<String>,
}

impl fmt::Debug for FileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileConfig")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("course_url", &self.course_url)
            .field("quality", &self.quality)
            .field("concurrency", &self.concurrency)
            .field("bandwidth_limit", &self.bandwidth_limit)
            .field("download_dir", &self.download_dir)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("remux_timeout_secs", &self.remux_timeout_secs)
            .field("passthrough_stdout", &self.passthrough_stdout)
            .field("fail_on_error", &self.fail_on_error)
            .field("api_base_url", &self.api_base_url)
            .field("site_origin", &self.site_origin)
            .finish()
    }
}

impl FileConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for invalid syntax, wrong value types or unknown keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`] or [`ConfigError::ParseFile`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Stacks `overrides` on top of `self`; set fields in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            auth_token: overrides.auth_token.or(self.auth_token),
            course_url: overrides.course_url.or(self.course_url),
            quality: overrides.quality.or(self.quality),
            concurrency: overrides.concurrency.or(self.concurrency),
            bandwidth_limit: overrides.bandwidth_limit.or(self.bandwidth_limit),
            download_dir: overrides.download_dir.or(self.download_dir),
            ffmpeg_path: overrides.ffmpeg_path.or(self.ffmpeg_path),
            remux_timeout_secs: overrides.remux_timeout_secs.or(self.remux_timeout_secs),
            passthrough_stdout: overrides.passthrough_stdout.or(self.passthrough_stdout),
            fail_on_error: overrides.fail_on_error.or(self.fail_on_error),
            api_base_url: overrides.api_base_url.or(self.api_base_url),
            site_origin: overrides.site_origin.or(self.site_origin),
        }
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/course-downloader/config.toml`
/// 2. `$HOME/.config/course-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(APP_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the file layer.
///
/// An explicit path must exist. Without one, the default path is used when it
/// exists and an empty layer is returned otherwise.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] or [`ConfigError::ParseFile`].
pub fn load_file_layer(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        return FileConfig::load(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.is_file() => FileConfig::load(&path),
        _ => {
            debug!("no config file found, using defaults");
            Ok(FileConfig::default())
        }
    }
}

/// Validated, immutable settings for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// Authentication cookie value (never logged).
    pub auth_token: String,
    /// Course slug derived from the course URL.
    pub course_slug: String,
    /// Selected rendition.
    pub quality: Quality,
    /// Worker count.
    pub concurrency: usize,
    /// Aggregate bandwidth cap; `None` means unlimited.
    pub bandwidth_limit: Option<NonZeroU64>,
    /// Root directory, without trailing slashes.
    pub download_root: PathBuf,
    /// Remux program.
    pub ffmpeg_path: PathBuf,
    /// Per-lesson remux deadline.
    pub remux_timeout: Option<Duration>,
    /// Forward remux stdout.
    pub passthrough_stdout: bool,
    /// Exit non-zero when any lesson fails.
    pub fail_on_error: bool,
    /// Remote endpoints.
    pub platform: Platform,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("auth_token", &"<redacted>")
            .field("course_slug", &self.course_slug)
            .field("quality", &self.quality)
            .field("concurrency", &self.concurrency)
            .field("bandwidth_limit", &self.bandwidth_limit)
            .field("download_root", &self.download_root)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("remux_timeout", &self.remux_timeout)
            .field("passthrough_stdout", &self.passthrough_stdout)
            .field("fail_on_error", &self.fail_on_error)
            .field("platform", &self.platform)
            .finish()
    }
}

impl Settings {
    /// Validates a merged configuration layer.
    ///
    /// Runs before any network use, so a bad quality or missing token never
    /// reaches the API.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn build(config: FileConfig) -> Result<Self, ConfigError> {
        let auth_token = config
            .auth_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let course_url = config
            .course_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingCourseUrl)?;
        let course_slug = course_slug(&course_url)?;

        let quality = match config.quality {
            Some(resolution) => Quality::from_resolution(resolution)?,
            None => Quality::default(),
        };

        let concurrency = config.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(ConfigError::InvalidConcurrency { value: concurrency });
        }

        let bandwidth_limit =
            NonZeroU64::new(config.bandwidth_limit.unwrap_or(DEFAULT_BANDWIDTH_LIMIT));

        let download_root = config
            .download_dir
            .map_or_else(|| PathBuf::from("."), |dir| normalize_dir(&dir));

        let ffmpeg_path = config
            .ffmpeg_path
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG_PATH));

        let remux_timeout = config
            .remux_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let api_base = config.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE);
        let site_origin = config.site_origin.as_deref().unwrap_or(DEFAULT_SITE_ORIGIN);
        Url::parse(api_base.trim()).map_err(|_| ConfigError::InvalidUrl {
            field: "api_base_url",
            value: api_base.to_string(),
        })?;
        let platform = Platform::new(api_base, site_origin).map_err(|_| ConfigError::InvalidUrl {
            field: "site_origin",
            value: site_origin.to_string(),
        })?;

        Ok(Self {
            auth_token,
            course_slug,
            quality,
            concurrency,
            bandwidth_limit,
            download_root,
            ffmpeg_path,
            remux_timeout,
            passthrough_stdout: config.passthrough_stdout.unwrap_or(false),
            fail_on_error: config.fail_on_error.unwrap_or(false),
            platform,
        })
    }
}

/// Extracts the course slug from a course URL or returns a bare slug as is.
///
/// `https://frontendmasters.com/courses/rust/` → `rust`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCourseUrl`] when no non-empty path segment exists.
pub fn course_slug(course_url: &str) -> Result<String, ConfigError> {
    let trimmed = course_url.trim();
    let invalid = || ConfigError::InvalidCourseUrl {
        value: course_url.to_string(),
    };

    let slug = match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_owned),
        _ => trimmed
            .split('/')
            .filter(|s| !s.is_empty())
            .next_back()
            .map(str::to_owned),
    }
    .ok_or_else(invalid)?;

    if slug.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(slug)
}

/// Strips trailing separators so `root/` and `root` name the same directory.
fn normalize_dir(dir: &Path) -> PathBuf {
    let raw = dir.to_string_lossy();
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        if raw.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from("/")
        }
    } else {
        PathBuf::from(trimmed)
    }
}
