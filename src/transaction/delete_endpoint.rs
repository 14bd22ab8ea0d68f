//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    database_id::TransactionId,
    transaction::core::delete_transaction,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction, redirects to the transactions view on success.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let result = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_response(),
        };

        delete_transaction(transaction_id, user_id, &connection)
    };

    match result {
        Ok(()) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DeleteMissingTransaction) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}
