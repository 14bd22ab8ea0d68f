//! Defines the endpoint for updating an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    database_id::TransactionId,
    timezone::get_local_date,
    transaction::{core::update_transaction, form::TransactionFormData},
};

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to the transactions view on success.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
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

        update_transaction(transaction_id, builder, user_id, &connection)
    };

    match result {
        Ok(()) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingTransaction) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod edit_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::Path, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        test_utils::create_test_user,
        transaction::{
            Account, Transaction, TransactionKind, core::create_transaction, core::get_transaction,
            form::TransactionFormData,
        },
    };

    use super::{EditTransactionState, edit_transaction_endpoint};

    #[tokio::test]
    async fn updates_transaction_fields() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let transaction = create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                45.99,
                date!(2025 - 01 - 15),
                "Coffee beans",
            ),
            user_id,
            &conn,
        )
        .unwrap();
        let state = EditTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let form = TransactionFormData {
            kind: TransactionKind::Income,
            amount: 100.0,
            date: date!(2025 - 01 - 16),
            description: "Refund".to_owned(),
            account: Account::Business,
            category_id: None,
        };

        let response = edit_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction.id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let updated = get_transaction(transaction.id, user_id, &connection).unwrap();
        assert_eq!(updated.kind, TransactionKind::Income);
        assert_eq!(updated.amount, 100.0);
        assert_eq!(updated.description, "Refund");
        assert_eq!(updated.account, Account::Business);
    }

    #[tokio::test]
    async fn missing_transaction_returns_not_found() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let state = EditTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let form = TransactionFormData {
            kind: TransactionKind::Income,
            amount: 100.0,
            date: date!(2025 - 01 - 16),
            description: "Ghost".to_owned(),
            account: Account::Personal,
            category_id: None,
        };

        let response =
            edit_transaction_endpoint(State(state), Extension(user_id), Path(999), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
