//! Authorization URL for the installation handshake.

use crate::config::{AppConfig, StorefrontId};

/// Builds the URL the merchant's browser is sent to when installing the app.
///
/// ```text
/// https://{shop}/admin/oauth/authorize?client_id=..&scope=..&redirect_uri=..
/// ```
///
/// Scopes are joined with commas; every value is percent-encoded. The result
/// depends only on `config` and `shop`.
///
/// # Example
///
/// ```rust
/// use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl, StorefrontId};
/// use cart_guardian::auth::oauth::begin_auth;
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("app-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://app.example.com").unwrap())
///     .scopes(["read_orders"])
///     .build()
///     .unwrap();
/// let shop = StorefrontId::new("demo.example").unwrap();
///
/// assert_eq!(
///     begin_auth(&config, &shop),
///     "https://demo.example/admin/oauth/authorize?client_id=app-key&scope=read_orders\
///      &redirect_uri=https%3A%2F%2Fapp.example.com%2Fshopify%2Fcallback"
/// );
/// ```
#[must_use]
pub fn begin_auth(config: &AppConfig, shop: &StorefrontId) -> String {
    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().join(",")),
        ("redirect_uri", config.redirect_uri()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn create_test_config() -> AppConfig {
        AppConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .host(HostUrl::new("https://myapp.example.com").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_begin_auth_generates_correct_url_structure() {
        let shop = StorefrontId::new("test-shop").unwrap();
        let url = begin_auth(&create_test_config(), &shop);

        assert!(url.starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=test-api-key"));
    }

    #[test]
    fn test_begin_auth_uses_default_scopes_comma_separated() {
        let shop = StorefrontId::new("demo.example").unwrap();
        let url = begin_auth(&create_test_config(), &shop);

        let expected = urlencoding::encode("read_checkouts,read_orders,write_checkouts,write_orders");
        assert!(url.contains(&format!("scope={expected}")));
    }

    #[test]
    fn test_begin_auth_redirect_uri_is_encoded() {
        let shop = StorefrontId::new("demo.example").unwrap();
        let url = begin_auth(&create_test_config(), &shop);

        let expected = urlencoding::encode("https://myapp.example.com/shopify/callback");
        assert!(url.contains(&format!("redirect_uri={expected}")));
    }

    #[test]
    fn test_begin_auth_honors_callback_path() {
        let config = AppConfig::builder()
            .api_key(ApiKey::new("k").unwrap())
            .api_secret_key(ApiSecretKey::new("s").unwrap())
            .host(HostUrl::new("https://tunnel.example.com").unwrap())
            .callback_path("/auth/done")
            .build()
            .unwrap();
        let url = begin_auth(&config, &StorefrontId::new("demo.example").unwrap());

        assert!(url.ends_with(&format!(
            "redirect_uri={}",
            urlencoding::encode("https://tunnel.example.com/auth/done")
        )));
    }

    #[test]
    fn test_begin_auth_is_deterministic() {
        let config = create_test_config();
        let shop = StorefrontId::new("demo.example").unwrap();
        assert_eq!(begin_auth(&config, &shop), begin_auth(&config, &shop));
    }

    #[test]
    fn test_begin_auth_with_different_shops() {
        let config = create_test_config();
        let a = begin_auth(&config, &StorefrontId::new("shop-a").unwrap());
        let b = begin_auth(&config, &StorefrontId::new("shop-b").unwrap());

        assert!(a.contains("shop-a.myshopify.com"));
        assert!(b.contains("shop-b.myshopify.com"));
    }
}
