//! Validated newtype wrappers for configuration and credential values.
//!
//! Each wrapper validates its contents on construction, so a value that
//! reaches the handshake or the stores is already known to be well formed.

use crate::error::ConfigError;
use std::fmt;

/// A validated Shopify API key (the app's OAuth client id).
///
/// # Example
///
/// ```rust
/// use cart_guardian::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key.
///
/// The same secret signs installation callbacks and webhook deliveries. The
/// `Debug` implementation masks the value so it never ends up in logs.
///
/// ```rust
/// use cart_guardian::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// An access credential issued by the platform for one storefront.
///
/// Never empty, so an installation holding one can always be marked active.
/// Masked in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Creates a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAccessToken`] if the token is empty or blank.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyAccessToken);
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// A validated storefront identifier.
///
/// Storefronts are identified by a stable, domain-like string. Input is
/// trimmed and lower-cased; a bare shop name is normalized to
/// `shop-name.myshopify.com`, and anything already containing a dot is kept
/// as given (custom and test domains are accepted).
///
/// ```rust
/// use cart_guardian::StorefrontId;
///
/// let shop = StorefrontId::new("My-Store").unwrap();
/// assert_eq!(shop.as_ref(), "my-store.myshopify.com");
///
/// let shop = StorefrontId::new("demo.example").unwrap();
/// assert_eq!(shop.as_ref(), "demo.example");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorefrontId(String);

impl StorefrontId {
    const SUFFIX: &'static str = ".myshopify.com";

    /// Creates a new validated storefront identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStorefront`] if the value is empty or is
    /// not a plausible host name.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_lowercase();

        if domain.is_empty() {
            return Err(ConfigError::InvalidStorefront { domain });
        }

        let full_domain = if domain.contains('.') {
            domain
        } else {
            format!("{domain}{}", Self::SUFFIX)
        };

        if !full_domain.split('.').all(Self::is_valid_label) {
            return Err(ConfigError::InvalidStorefront {
                domain: full_domain,
            });
        }

        Ok(Self(full_domain))
    }

    /// Returns the first label of the domain (`my-store` for
    /// `my-store.myshopify.com`).
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    // Labels can contain lowercase letters, digits, and inner hyphens.
    fn is_valid_label(label: &str) -> bool {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for StorefrontId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorefrontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated, externally reachable URL of this application.
///
/// The installation redirect URI and the webhook delivery address are built
/// from it. A trailing slash is dropped so paths can be appended directly.
///
/// ```rust
/// use cart_guardian::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/").unwrap();
/// assert_eq!(url.join("/shopify/callback"), "https://myapp.example.com/shopify/callback");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    scheme_end: usize,
}

impl HostUrl {
    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL has no scheme or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidHostUrl { url: url.clone() })?;

        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidHostUrl { url });
        }

        let remainder = &url[scheme_end + 3..];
        let host_len = remainder.find([':', '/', '?', '#']).unwrap_or(remainder.len());
        if host_len == 0 {
            return Err(ConfigError::InvalidHostUrl { url });
        }

        Ok(Self { url, scheme_end })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.scheme_end]
    }

    /// Appends an absolute path to this URL.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.url)
        } else {
            format!("{}/{path}", self.url)
        }
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
