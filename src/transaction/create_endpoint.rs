//! Defines the endpoint for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of failing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    timezone::get_local_date,
    transaction::{core::create_transaction, form::TransactionFormData},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction, redirects to the transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let Some(today) = get_local_date(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let builder = match form.into_builder(today) {
        Ok(builder) => builder,
        Err(error) => return error.into_response(),
    };

    let result = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_response(),
        };

        create_transaction(builder, user_id, &connection)
    };

    if let Err(error) = result {
        tracing::error!("Could not create transaction: {error}");
        return error.into_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
