//! Admin API version used for webhook registration.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A Shopify Admin API version.
///
/// Stable versions are quarterly releases written `YYYY-MM` with a month of
/// 01, 04, 07 or 10. The registration endpoint path embeds this value, so an
/// invalid version is rejected when configuration is loaded rather than when
/// the first storefront installs.
///
/// ```rust
/// use cart_guardian::ApiVersion;
///
/// let version: ApiVersion = "2024-07".parse().unwrap();
/// assert_eq!(version, ApiVersion::default());
/// assert_eq!(version.to_string(), "2024-07");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiVersion {
    /// A quarterly stable release.
    Stable {
        /// Four-digit release year.
        year: u16,
        /// Release month (1, 4, 7 or 10).
        month: u8,
    },
    /// The unstable version, for development stores only.
    Unstable,
}

impl ApiVersion {
    /// Creates a stable version, validating the release month.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiVersion`] for non-release months or
    /// years outside four digits.
    pub fn stable(year: u16, month: u8) -> Result<Self, ConfigError> {
        if !(1000..=9999).contains(&year) || !matches!(month, 1 | 4 | 7 | 10) {
            return Err(ConfigError::InvalidApiVersion {
                version: format!("{year}-{month:02}"),
            });
        }
        Ok(Self::Stable { year, month })
    }

    /// Returns `true` unless this is the unstable version.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        matches!(self, Self::Stable { .. })
    }
}

impl Default for ApiVersion {
    // The release the registration endpoint was first written against.
    fn default() -> Self {
        Self::Stable {
            year: 2024,
            month: 7,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable { year, month } => write!(f, "{year}-{month:02}"),
            Self::Unstable => f.write_str("unstable"),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "unstable" {
            return Ok(Self::Unstable);
        }

        let invalid = || ConfigError::InvalidApiVersion { version: s.clone() };

        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;

        Self::stable(year, month).map_err(|_| invalid())
    }
}
