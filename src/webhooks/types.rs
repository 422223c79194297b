//! Webhook topics, delivery payloads, and registration results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::WebhookError;

/// Webhook topics this app subscribes to.
///
/// Serializes to the platform's topic string.
///
/// ```rust
/// use cart_guardian::webhooks::WebhookTopic;
///
/// let topic = WebhookTopic::CheckoutsCreate;
/// assert_eq!(serde_json::to_string(&topic).unwrap(), "\"checkouts/create\"");
/// assert_eq!("checkouts/create".parse::<WebhookTopic>().unwrap(), topic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookTopic {
    /// Triggered when a checkout is created.
    #[serde(rename = "checkouts/create")]
    CheckoutsCreate,
    /// Triggered when a checkout is updated.
    #[serde(rename = "checkouts/update")]
    CheckoutsUpdate,
    /// Triggered when the app is uninstalled from a storefront.
    #[serde(rename = "app/uninstalled")]
    AppUninstalled,
}

impl WebhookTopic {
    /// Returns the platform's topic string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckoutsCreate => "checkouts/create",
            Self::CheckoutsUpdate => "checkouts/update",
            Self::AppUninstalled => "app/uninstalled",
        }
    }
    /// Returns `true` for topics whose payload is a checkout.
    #[must_use]
    pub const fn is_checkout(self) -> bool {
        matches!(self, Self::CheckoutsCreate | Self::CheckoutsUpdate)
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookTopic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkouts/create" => Ok(Self::CheckoutsCreate),
            "checkouts/update" => Ok(Self::CheckoutsUpdate),
            "app/uninstalled" => Ok(Self::AppUninstalled),
            other => Err(format!("unknown webhook topic '{other}'")),
        }
    }
}

/// The platform's checkout id, sent as a JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckoutId {
    Number(u64),
    Text(String),
}

impl fmt::Display for CheckoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The fields of a checkout delivery this app uses. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutPayload {
    pub id: CheckoutId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub abandoned_checkout_url: Option<String>,
}

impl CheckoutPayload {
    /// Returns the customer email, or `None` if absent or blank.
    #[must_use]
    pub fn contact_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

/// How a successful registration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// A new subscription was created.
    Created,
    /// The platform already had a subscription for this topic and address.
    AlreadyRegistered,
}

/// Result of registering one topic during [`register_all`](super::WebhookRegistrar::register_all).
#[derive(Debug)]
pub struct RegistrationResult {
    pub topic: WebhookTopic,
    /// Delivery address that was registered.
    pub address: String,
    pub outcome: Result<RegistrationStatus, WebhookError>,
}

impl RegistrationResult {
    /// Returns `true` if the topic is registered on the platform.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_checkout_topics_carry_checkouts() {
        assert!(WebhookTopic::CheckoutsCreate.is_checkout());
        assert!(WebhookTopic::CheckoutsUpdate.is_checkout());
        assert!(!WebhookTopic::AppUninstalled.is_checkout());
    }

    #[test]
    fn test_topic_string_forms_agree() {
        for topic in [
            WebhookTopic::CheckoutsCreate,
            WebhookTopic::CheckoutsUpdate,
            WebhookTopic::AppUninstalled,
        ] {
            assert_eq!(
                serde_json::to_string(&topic).unwrap(),
                format!("\"{}\"", topic.as_str())
            );
            assert_eq!(topic.to_string().parse::<WebhookTopic>().unwrap(), topic);
        }
        assert!("orders/create".parse::<WebhookTopic>().is_err());
    }

    #[test]
    fn test_payload_accepts_numeric_and_string_ids() {
        let numeric: CheckoutPayload = serde_json::from_str(r#"{"id":555}"#).unwrap();
        assert_eq!(numeric.id.to_string(), "555");

        let text: CheckoutPayload = serde_json::from_str(r#"{"id":"abc-555"}"#).unwrap();
        assert_eq!(text.id.to_string(), "abc-555");
    }

    #[test]
    fn test_payload_ignores_unknown_fields() {
        let payload: CheckoutPayload = serde_json::from_str(
            r#"{"id":1,"email":"a@b.com","token":"t","line_items":[{"title":"Hat"}],"abandoned_checkout_url":"https://x/1"}"#,
        )
        .unwrap();
        assert_eq!(payload.contact_email(), Some("a@b.com"));
        assert_eq!(payload.abandoned_checkout_url.as_deref(), Some("https://x/1"));
    }

    #[test]
    fn test_payload_requires_id() {
        assert!(serde_json::from_str::<CheckoutPayload>(r#"{"email":"a@b.com"}"#).is_err());
        assert!(serde_json::from_str::<CheckoutPayload>(r#"{"id":null}"#).is_err());
    }

    #[test]
    fn test_contact_email_treats_blank_as_absent() {
        let payload: CheckoutPayload = serde_json::from_str(r#"{"id":1,"email":"  "}"#).unwrap();
        assert_eq!(payload.contact_email(), None);

        let payload: CheckoutPayload = serde_json::from_str(r#"{"id":1,"email":null}"#).unwrap();
        assert_eq!(payload.contact_email(), None);
    }

    #[test]
    fn test_registration_result_success() {
        let result = RegistrationResult {
            topic: WebhookTopic::CheckoutsCreate,
            address: "https://app.example.com/webhooks/checkouts/create".to_string(),
            outcome: Ok(RegistrationStatus::AlreadyRegistered),
        };
        assert!(result.is_success());

        let result = RegistrationResult {
            outcome: Err(WebhookError::Timeout),
            ..result
        };
        assert!(!result.is_success());
    }
}
