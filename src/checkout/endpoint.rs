//! Defines the endpoint that creates a checkout session and redirects to it.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use time::OffsetDateTime;

use crate::{
    AppState, endpoints,
    auth::UserId,
    checkout::core::{CheckoutConfig, CheckoutMode, CheckoutRequest, create_checkout_session},
};

/// The state needed to create a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutState {
    /// The config for the hosted checkout collaborator.
    pub checkout_config: CheckoutConfig,
}

impl FromRef<AppState> for CheckoutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            checkout_config: state.checkout_config.clone(),
        }
    }
}

/// A route handler that creates a checkout session for the current user and
/// redirects the browser to the hosted payment page.
pub async fn checkout_endpoint(
    State(state): State<CheckoutState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let request = CheckoutRequest {
        user_id,
        price_id: state.checkout_config.price_id.clone(),
        mode: CheckoutMode::Subscription,
        success_url: endpoints::SUBSCRIPTION_VIEW.to_owned(),
        cancel_url: endpoints::SUBSCRIPTION_VIEW.to_owned(),
    };

    match create_checkout_session(&request, &state.checkout_config, OffsetDateTime::now_utc()) {
        Ok(session) => {
            tracing::info!(
                "created checkout session {} for user {user_id}",
                session.session_id
            );
            (HxRedirect(session.url), StatusCode::SEE_OTHER).into_response()
        }
        Err(error) => {
            tracing::error!("Could not create checkout session for user {user_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod checkout_endpoint_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_htmx::HX_REDIRECT;

    use crate::{auth::UserId, checkout::core::CheckoutConfig};

    use super::{CheckoutState, checkout_endpoint};

    #[tokio::test]
    async fn redirects_to_hosted_checkout() {
        let state = CheckoutState {
            checkout_config: CheckoutConfig {
                checkout_url: "https://pay.example.com/checkout".to_owned(),
                price_id: "price_123".to_owned(),
            },
        };

        let response = checkout_endpoint(State(state), Extension(UserId::new(1))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let redirect = response.headers().get(HX_REDIRECT).unwrap().to_str().unwrap();
        assert!(redirect.starts_with("https://pay.example.com/checkout?"));
    }

    #[tokio::test]
    async fn unconfigured_checkout_returns_error() {
        let state = CheckoutState {
            checkout_config: CheckoutConfig::default(),
        };

        let response = checkout_endpoint(State(state), Extension(UserId::new(1))).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
