//! Webhook subscription registration.
//!
//! After each installation the app subscribes its delivery endpoints through
//! the REST Admin API:
//!
//! ```text
//! POST {base}/admin/api/{version}/webhooks.json
//! X-Shopify-Access-Token: {credential}
//!
//! {"webhook": {"topic": "checkouts/create", "address": "...", "format": "json"}}
//! ```
//!
//! Re-installing an app re-runs registration for topics that already exist;
//! the platform answers those with 422 "address ... has already been taken",
//! which is reported as [`RegistrationStatus::AlreadyRegistered`].

use serde::Serialize;
use tracing::{error, info};

use crate::clients::PlatformHttp;
use crate::config::{AccessToken, AppConfig, StorefrontId};

use super::{RegistrationResult, RegistrationStatus, WebhookError, WebhookTopic};

#[derive(Serialize)]
struct WebhookEnvelope<'a> {
    webhook: WebhookBody<'a>,
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    topic: WebhookTopic,
    address: &'a str,
    format: &'static str,
}

/// Registers the configured webhook topics on a storefront.
#[derive(Clone, Debug)]
pub struct WebhookRegistrar {
    config: AppConfig,
    http: PlatformHttp,
}

// Verify WebhookRegistrar is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookRegistrar>();
};

impl WebhookRegistrar {
    /// Creates a registrar sharing `http` with the rest of the app.
    #[must_use]
    pub const fn new(config: AppConfig, http: PlatformHttp) -> Self {
        Self { config, http }
    }

    /// Subscribes `address` to `topic` on `shop`.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::RegistrationFailed`] for a 4xx/5xx answer other than
    ///   "already taken"
    /// - [`WebhookError::Timeout`] if the call exceeded the configured timeout
    /// - [`WebhookError::Transport`] for any other network failure
    pub async fn register_topic(
        &self,
        shop: &StorefrontId,
        credential: &AccessToken,
        topic: WebhookTopic,
        address: &str,
    ) -> Result<RegistrationStatus, WebhookError> {
        let url = self.http.admin_url(
            shop,
            &format!("/admin/api/{}/webhooks.json", self.config.api_version()),
        );
        let body = WebhookEnvelope {
            webhook: WebhookBody {
                topic,
                address,
                format: "json",
            },
        };

        let response = self.http.post_json(&url, &body, Some(credential)).await?;

        if response.is_success() {
            return Ok(RegistrationStatus::Created);
        }
        if response.status == 422 && is_already_taken(&response.body) {
            return Ok(RegistrationStatus::AlreadyRegistered);
        }

        Err(WebhookError::RegistrationFailed {
            status: response.status,
            message: response.body,
        })
    }

    /// Registers every configured subscription, one at a time.
    ///
    /// Failures are logged and returned alongside successes; none of them
    /// stops the remaining registrations.
    pub async fn register_all(
        &self,
        shop: &StorefrontId,
        credential: &AccessToken,
    ) -> Vec<RegistrationResult> {
        let mut results = Vec::with_capacity(self.config.webhook_subscriptions().len());

        for subscription in self.config.webhook_subscriptions() {
            let address = self.config.webhook_address(subscription);
            let outcome = self
                .register_topic(shop, credential, subscription.topic, &address)
                .await;

            match &outcome {
                Ok(status) => info!(
                    shop = %shop,
                    topic = %subscription.topic,
                    status = ?status,
                    "Webhook registered"
                ),
                Err(e) => error!(
                    shop = %shop,
                    topic = %subscription.topic,
                    error = %e,
                    "Webhook registration failed"
                ),
            }

            results.push(RegistrationResult {
                topic: subscription.topic,
                address,
                outcome,
            });
        }

        results
    }
}

fn is_already_taken(body: &str) -> bool {
    body.to_ascii_lowercase().contains("already been taken")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, ApiVersion, HostUrl, WebhookSubscription};
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registrar(server: &MockServer, subscriptions: Option<Vec<WebhookSubscription>>) -> WebhookRegistrar {
        let mut builder = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
            .api_version(ApiVersion::stable(2024, 7).unwrap())
            .request_timeout(Duration::from_millis(300))
            .platform_base_url(HostUrl::new(server.uri()).unwrap());
        if let Some(subscriptions) = subscriptions {
            builder = builder.webhook_subscriptions(subscriptions);
        }
        let config = builder.build().unwrap();
        let http = PlatformHttp::new(&config).unwrap();
        WebhookRegistrar::new(config, http)
    }

    fn shop() -> StorefrontId {
        StorefrontId::new("demo.example").unwrap()
    }

    fn token() -> AccessToken {
        AccessToken::new("tok_1").unwrap()
    }

    #[tokio::test]
    async fn test_register_topic_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2024-07/webhooks.json"))
            .and(header("X-Shopify-Access-Token", "tok_1"))
            .and(body_json(serde_json::json!({
                "webhook": {
                    "topic": "checkouts/create",
                    "address": "https://app.example.com/webhooks/checkouts/create",
                    "format": "json"
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "webhook": {"id": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = registrar(&server, None)
            .register_topic(
                &shop(),
                &token(),
                WebhookTopic::CheckoutsCreate,
                "https://app.example.com/webhooks/checkouts/create",
            )
            .await
            .unwrap();

        assert_eq!(status, RegistrationStatus::Created);
    }

    #[tokio::test]
    async fn test_register_topic_treats_taken_address_as_registered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": {"address": ["for this topic has already been taken"]}
            })))
            .mount(&server)
            .await;

        let status = registrar(&server, None)
            .register_topic(&shop(), &token(), WebhookTopic::CheckoutsCreate, "https://a/b")
            .await
            .unwrap();

        assert_eq!(status, RegistrationStatus::AlreadyRegistered);
    }

    #[tokio::test]
    async fn test_register_topic_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        let error = registrar(&server, None)
            .register_topic(&shop(), &token(), WebhookTopic::CheckoutsCreate, "https://a/b")
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            WebhookError::RegistrationFailed { status: 403, ref message } if message == "Forbidden"
        ));
    }

    #[tokio::test]
    async fn test_register_topic_reports_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let error = registrar(&server, None)
            .register_topic(&shop(), &token(), WebhookTopic::CheckoutsCreate, "https://a/b")
            .await
            .unwrap_err();

        assert!(matches!(error, WebhookError::Timeout));
    }

    #[tokio::test]
    async fn test_register_all_continues_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "webhook": {
                    "topic": "checkouts/create",
                    "address": "https://app.example.com/webhooks/checkouts/create",
                    "format": "json"
                }
            })))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "webhook": {
                    "topic": "app/uninstalled",
                    "address": "https://app.example.com/webhooks/app/uninstalled",
                    "format": "json"
                }
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let registrar = registrar(
            &server,
            Some(vec![
                WebhookSubscription::new(WebhookTopic::CheckoutsCreate, "/webhooks/checkouts/create"),
                WebhookSubscription::new(WebhookTopic::AppUninstalled, "/webhooks/app/uninstalled"),
            ]),
        );

        let results = registrar.register_all(&shop(), &token()).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].topic, WebhookTopic::CheckoutsCreate);
        assert!(matches!(
            results[0].outcome,
            Err(WebhookError::RegistrationFailed { status: 500, .. })
        ));
        assert_eq!(results[1].topic, WebhookTopic::AppUninstalled);
        assert!(results[1].is_success());
        assert_eq!(
            results[1].address,
            "https://app.example.com/webhooks/app/uninstalled"
        );
    }

    #[test]
    fn test_is_already_taken() {
        assert!(is_already_taken(
            r#"{"errors":{"address":["for this topic has already been taken"]}}"#
        ));
        assert!(!is_already_taken(r#"{"errors":{"topic":["Invalid topic"]}}"#));
    }
}
