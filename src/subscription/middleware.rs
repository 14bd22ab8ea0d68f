//! Middleware that gates the functional pages behind an active subscription.
//!
//! The guard runs after the auth guard, re-evaluates the subscription flags
//! on every request (a trial that was active an hour ago may have expired by
//! now) and redirects users without access to the subscription page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, endpoints,
    auth::UserId,
    subscription::core::{evaluate, get_subscription},
};

/// The state needed for the subscription guard middleware.
#[derive(Clone)]
pub struct SubscriptionGuardState {
    /// The database connection for reading subscriptions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SubscriptionGuardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[inline]
async fn subscription_guard_internal(
    state: SubscriptionGuardState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let Some(&user_id) = request.extensions().get::<UserId>() else {
        tracing::error!(
            "subscription guard ran without a user ID; is the auth guard applied first?"
        );
        return get_redirect(endpoints::LOG_IN_VIEW);
    };

    let subscription = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_redirect(endpoints::SUBSCRIPTION_VIEW);
            }
        };

        match get_subscription(user_id, &connection) {
            Ok(subscription) => subscription,
            Err(error) => {
                tracing::error!("could not fetch subscription for user {user_id}: {error}");
                return get_redirect(endpoints::SUBSCRIPTION_VIEW);
            }
        }
    };

    let flags = evaluate(subscription.as_ref(), OffsetDateTime::now_utc());

    if !flags.has_active_subscription {
        return get_redirect(endpoints::SUBSCRIPTION_VIEW);
    }

    next.run(request).await
}

/// Middleware function that redirects users without an active subscription or
/// trial to the subscription page.
///
/// Must be layered inside the auth guard so that the user ID extension is set.
pub async fn subscription_guard(
    State(state): State<SubscriptionGuardState>,
    request: Request,
    next: Next,
) -> Response {
    subscription_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware function like [subscription_guard] that redirects via the
/// HX-Redirect header for HTMX-initiated requests.
pub async fn subscription_guard_hx(
    State(state): State<SubscriptionGuardState>,
    request: Request,
    next: Next,
) -> Response {
    subscription_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}
