//! Defines the route handler for the page for editing an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::{Category, get_all_categories},
    database_id::TransactionId,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{
        Transaction,
        core::get_transaction,
        form::{FormAction, transaction_form},
    },
};

fn edit_transaction_view(
    transaction: &Transaction,
    max_date: Date,
    available_categories: &[Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let form = transaction_form(
        FormAction::Edit(transaction.id),
        Some(transaction),
        max_date,
        available_categories,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base("Edit Transaction", &[], &content)
}

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    /// The database connection for accessing transactions and categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let (transaction, available_categories) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction = get_transaction(transaction_id, user_id, &connection)?;
        let available_categories = get_all_categories(user_id, &connection)?;

        (transaction, available_categories)
    };

    let max_date = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(edit_transaction_view(&transaction, max_date, &available_categories).into_response())
}
