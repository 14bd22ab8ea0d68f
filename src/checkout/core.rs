//! Creation of checkout sessions against the hosted payment page.
//!
//! Payment itself is owned by the external checkout collaborator; this module
//! only builds the session the browser is redirected to. The session ID is a
//! deterministic digest of the user, price and creation time so that the
//! hosted page can correlate the redirect with the paying user.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::UserId};

/// The configuration for the hosted checkout collaborator.
#[derive(Debug, Clone, Default)]
pub struct CheckoutConfig {
    /// The URL of the hosted checkout page the browser is redirected to.
    pub checkout_url: String,
    /// The ID of the price the user subscribes to.
    pub price_id: String,
}

/// Whether a checkout is a one-off payment or starts a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// A one-off payment.
    Payment,
    /// A recurring subscription.
    Subscription,
}

impl Display for CheckoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutMode::Payment => write!(f, "payment"),
            CheckoutMode::Subscription => write!(f, "subscription"),
        }
    }
}

/// The parameters for creating a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// The user the session is created for.
    pub user_id: UserId,
    /// The ID of the price to charge.
    pub price_id: String,
    /// Whether to perform a one-off payment or start a subscription.
    pub mode: CheckoutMode,
    /// Where the hosted page sends the browser after a successful payment.
    pub success_url: String,
    /// Where the hosted page sends the browser if the user cancels.
    pub cancel_url: String,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// The ID of the session.
    pub session_id: String,
    /// The URL of the hosted payment page for this session.
    pub url: String,
}

/// Create a checkout session for `request` at time `now`.
///
/// # Errors
/// Returns an [Error::CheckoutNotConfigured] if the checkout URL or the price
/// ID is missing from the configuration, or an
/// [Error::JsonSerializationError] if the session parameters cannot be
/// encoded into the URL.
pub fn create_checkout_session(
    request: &CheckoutRequest,
    config: &CheckoutConfig,
    now: OffsetDateTime,
) -> Result<CheckoutSession, Error> {
    if config.checkout_url.is_empty() || request.price_id.is_empty() {
        return Err(Error::CheckoutNotConfigured);
    }

    let digest = md5::compute(format!(
        "{}:{}:{}",
        request.user_id,
        request.price_id,
        now.unix_timestamp()
    ));
    let session_id = format!("cs_{digest:x}");

    let mode = request.mode.to_string();
    let query = serde_urlencoded::to_string([
        ("session_id", session_id.as_str()),
        ("price_id", request.price_id.as_str()),
        ("mode", mode.as_str()),
        ("success_url", request.success_url.as_str()),
        ("cancel_url", request.cancel_url.as_str()),
    ])
    .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    Ok(CheckoutSession {
        url: format!("{}?{}", config.checkout_url, query),
        session_id,
    })
}

#[cfg(test)]
mod checkout_tests {
    use time::macros::datetime;

    use crate::{Error, auth::UserId};

    use super::{CheckoutConfig, CheckoutMode, CheckoutRequest, create_checkout_session};

    fn test_config() -> CheckoutConfig {
        CheckoutConfig {
            checkout_url: "https://pay.example.com/checkout".to_owned(),
            price_id: "price_123".to_owned(),
        }
    }

    fn test_request() -> CheckoutRequest {
        CheckoutRequest {
            user_id: UserId::new(7),
            price_id: "price_123".to_owned(),
            mode: CheckoutMode::Subscription,
            success_url: "/subscription".to_owned(),
            cancel_url: "/subscription".to_owned(),
        }
    }

    const NOW: time::OffsetDateTime = datetime!(2025-01-01 00:00:00 UTC);

    #[test]
    fn session_url_contains_session_id_and_encoded_params() {
        let session = create_checkout_session(&test_request(), &test_config(), NOW).unwrap();

        assert!(session.session_id.starts_with("cs_"));
        assert!(session.url.starts_with("https://pay.example.com/checkout?"));
        assert!(session.url.contains(&format!("session_id={}", session.session_id)));
        assert!(session.url.contains("mode=subscription"));
        assert!(session.url.contains("success_url=%2Fsubscription"));
    }

    #[test]
    fn session_id_is_deterministic_for_same_inputs() {
        let first = create_checkout_session(&test_request(), &test_config(), NOW).unwrap();
        let second = create_checkout_session(&test_request(), &test_config(), NOW).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn session_id_differs_per_user() {
        let mut other_request = test_request();
        other_request.user_id = UserId::new(8);

        let first = create_checkout_session(&test_request(), &test_config(), NOW).unwrap();
        let second = create_checkout_session(&other_request, &test_config(), NOW).unwrap();

        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn missing_configuration_is_rejected() {
        let result = create_checkout_session(&test_request(), &CheckoutConfig::default(), NOW);

        assert_eq!(result, Err(Error::CheckoutNotConfigured));
    }
}
