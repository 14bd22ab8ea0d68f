//! Defines the endpoint for starting the free trial.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    subscription::core::start_trial,
};

/// The state needed to start a trial.
#[derive(Debug, Clone)]
pub struct StartTrialState {
    /// The database connection for managing subscriptions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StartTrialState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that starts the free trial for the current user and
/// redirects to the dashboard on success.
pub async fn start_trial_endpoint(
    State(state): State<StartTrialState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let result = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_response(),
        };

        start_trial(user_id, OffsetDateTime::now_utc(), &connection)
    };

    match result {
        Ok(_) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not start trial for user {user_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod start_trial_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        subscription::core::{SubscriptionStatus, get_subscription},
        test_utils::create_test_user,
    };

    use super::{StartTrialState, start_trial_endpoint};

    #[tokio::test]
    async fn starts_trial_and_redirects_to_dashboard() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let state = StartTrialState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = start_trial_endpoint(State(state.clone()), Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::DASHBOARD_VIEW
        );

        let connection = state.db_connection.lock().unwrap();
        let subscription = get_subscription(user_id, &connection).unwrap().unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Trial);
    }

    #[tokio::test]
    async fn second_trial_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let state = StartTrialState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let first = start_trial_endpoint(State(state.clone()), Extension(user_id)).await;
        assert_eq!(first.status(), StatusCode::SEE_OTHER);

        let second = start_trial_endpoint(State(state), Extension(user_id)).await;
        assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
