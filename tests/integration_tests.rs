//! End-to-end tests: configuration from the environment, installation, then
//! webhook ingestion against the same store.

use std::collections::HashMap;
use std::sync::Arc;

use cart_guardian::auth::oauth::hmac::{compute_signature, compute_signature_base64};
use cart_guardian::auth::oauth::CallbackParams;
use cart_guardian::store::{CheckoutStore, ShopStore, SqliteStore};
use cart_guardian::webhooks::{IngestOutcome, WebhookError};
use cart_guardian::{
    ApiVersion, AppConfig, ConfigError, InstallationNegotiator, StorefrontId, WebhookIngestor,
    WebhookRequest,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "e2e-secret";

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

fn base_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("SHOPIFY_API_KEY", "e2e-key"),
        ("SHOPIFY_API_SECRET", SECRET),
        ("APP_HOST_URL", "https://app.example.com"),
    ]
}

#[test]
fn test_config_from_environment_uses_defaults() {
    let config = AppConfig::from_lookup(env(&base_env())).unwrap();

    assert_eq!(config.api_key().as_ref(), "e2e-key");
    assert_eq!(config.api_version(), ApiVersion::default());
    assert_eq!(config.api_version().to_string(), "2024-07");
    assert_eq!(config.redirect_uri(), "https://app.example.com/shopify/callback");
    assert!(!config.enforce_installed_shops());
    assert_eq!(config.webhook_subscriptions().len(), 1);
}

#[test]
fn test_config_from_environment_reports_missing_secret() {
    let result = AppConfig::from_lookup(env(&[
        ("SHOPIFY_API_KEY", "e2e-key"),
        ("APP_HOST_URL", "https://app.example.com"),
    ]));

    assert!(matches!(
        result,
        Err(ConfigError::MissingEnvVar {
            name: "SHOPIFY_API_SECRET"
        })
    ));
}

#[test]
fn test_config_from_environment_rejects_bad_flag() {
    let mut vars = base_env();
    vars.push(("WEBHOOK_ENFORCE_INSTALLED_SHOPS", "maybe"));

    assert!(matches!(
        AppConfig::from_lookup(env(&vars)),
        Err(ConfigError::InvalidEnvVar { .. })
    ));
}

#[tokio::test]
async fn test_install_then_ingest_with_enforcement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "shpat_e2e",
            "scope": "read_orders,write_orders"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-07/webhooks.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "webhook": { "id": 1, "topic": "checkouts/create" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = server.uri();
    let mut vars: Vec<(&str, &str)> = base_env();
    vars.push(("WEBHOOK_ENFORCE_INSTALLED_SHOPS", "true"));
    vars.push(("SHOPIFY_PLATFORM_BASE_URL", base_url.as_str()));
    let config = AppConfig::from_lookup(env(&vars)).unwrap();

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let negotiator = InstallationNegotiator::from_config(config.clone(), store.clone()).unwrap();
    let ingestor = WebhookIngestor::new(config, store.clone(), store.clone());

    let body = r#"{"id":"c-900","email":"buyer@example.com","abandoned_checkout_url":"https://shop.example/r/900"}"#;
    let delivery = |shop: &str| {
        WebhookRequest::new(
            body.as_bytes().to_vec(),
            compute_signature_base64(body.as_bytes(), SECRET).unwrap(),
        )
        .with_topic("checkouts/create")
        .with_shop_domain(shop)
    };

    // Before installation the storefront is unknown
    let early = ingestor.ingest(&delivery("shop.example"));
    assert_eq!(early.status_code(), 401);
    assert!(matches!(
        early,
        IngestOutcome::Rejected(WebhookError::ShopNotInstalled { .. })
    ));

    let mut params = CallbackParams::from_pairs([
        ("code", "e2e-code"),
        ("shop", "shop.example"),
        ("timestamp", "1700000000"),
    ]);
    let signature = compute_signature(&params.signable_string(), SECRET).unwrap();
    params.push("hmac", signature);

    let completed = negotiator.complete_handshake(&params).await.unwrap();
    assert!(completed.all_webhooks_registered());
    assert_eq!(completed.installation.scope, "read_orders,write_orders");

    let installed = store
        .find_by_shop(&StorefrontId::new("shop.example").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(installed.access_token.as_ref(), "shpat_e2e");

    let outcome = ingestor.ingest(&delivery("shop.example"));
    assert!(matches!(outcome, IngestOutcome::Stored(_)));

    let stored = store.find_by_checkout_id("c-900").unwrap().unwrap();
    assert_eq!(stored.customer_email.as_deref(), Some("buyer@example.com"));
    assert_eq!(stored.shop_domain.as_deref(), Some("shop.example"));

    // A different storefront is still turned away
    assert_eq!(ingestor.ingest(&delivery("other.example")).status_code(), 401);
    assert_eq!(store.count().unwrap(), 1);
}
