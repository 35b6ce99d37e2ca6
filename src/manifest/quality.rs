//! Video quality selection.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// A supported video resolution and its manifest rendition token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    /// 2160p (4K).
    P2160,
    /// 1440p.
    P1440,
    /// 1080p.
    #[default]
    P1080,
    /// 720p.
    P720,
    /// 360p.
    P360,
}

impl Quality {
    /// All supported qualities, highest first.
    pub const ALL: [Self; 5] = [Self::P2160, Self::P1440, Self::P1080, Self::P720, Self::P360];

    /// Looks up a quality by its numeric resolution label.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownQuality`] when the resolution is not one of
    /// the supported keys.
    pub fn from_resolution(resolution: u32) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|q| q.resolution() == resolution)
            .ok_or_else(|| ConfigError::UnknownQuality {
                value: resolution.to_string(),
            })
    }

    /// Numeric resolution label.
    #[must_use]
    pub fn resolution(self) -> u32 {
        match self {
            Self::P2160 => 2160,
            Self::P1440 => 1440,
            Self::P1080 => 1080,
            Self::P720 => 720,
            Self::P360 => 360,
        }
    }

    /// Opaque rendition token used as the manifest file stem.
    #[must_use]
    pub fn rendition(self) -> &'static str {
        match self {
            Self::P2160 => "index_2160p_Q10_20mbps",
            Self::P1440 => "index_1440p_Q10_9mbps",
            Self::P1080 => "index_1080_Q10_7mbps",
            Self::P720 => "index_720_Q8_5mbps",
            Self::P360 => "index_360_Q8_2mbps",
        }
    }

    /// Manifest file name for this rendition.
    #[must_use]
    pub fn manifest_file_name(self) -> String {
        format!("{}.m3u8", self.rendition())
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.resolution())
    }
}

impl FromStr for Quality {
    type Err = ConfigError;

    /// Accepts `1080` or `1080p`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .map_err(|_| ConfigError::UnknownQuality {
                value: s.to_string(),
            })
            .and_then(Self::from_resolution)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_resolution_maps_to_its_token() {
        let expected = [
            (2160, "index_2160p_Q10_20mbps"),
            (1440, "index_1440p_Q10_9mbps"),
            (1080, "index_1080_Q10_7mbps"),
            (720, "index_720_Q8_5mbps"),
            (360, "index_360_Q8_2mbps"),
        ];
        for (resolution, token) in expected {
            let quality = Quality::from_resolution(resolution).unwrap();
            assert_eq!(quality.rendition(), token);
            assert_eq!(quality.resolution(), resolution);
        }
    }

    #[test]
    fn test_unknown_resolution_is_config_error() {
        let err = Quality::from_resolution(480).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownQuality { ref value } if value == "480"));
    }

    #[test]
    fn test_default_is_1080() {
        assert_eq!(Quality::default(), Quality::P1080);
    }

    #[test]
    fn test_from_str_accepts_suffix() {
        assert_eq!("720p".parse::<Quality>().unwrap(), Quality::P720);
        assert_eq!("2160".parse::<Quality>().unwrap(), Quality::P2160);
        assert!("hd".parse::<Quality>().is_err());
        assert!("1000p".parse::<Quality>().is_err());
    }

    #[test]
    fn test_display_and_file_name() {
        assert_eq!(Quality::P360.to_string(), "360p");
        assert_eq!(Quality::P360.manifest_file_name(), "index_360_Q8_2mbps.m3u8");
    }
}
