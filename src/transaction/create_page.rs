//! Defines the route handler for the page for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::{Category, get_all_categories},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::form::{FormAction, transaction_form},
};

fn create_transaction_view(max_date: Date, available_categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let form = transaction_form(FormAction::Create, None, max_date, available_categories);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base("Create Transaction", &[], &content)
}

/// The state needed for the create new transaction page.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    /// The database connection for accessing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let available_categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new transaction page: {error}")
        })?
    };

    let max_date = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone)
    })?;

    Ok(create_transaction_view(max_date, &available_categories).into_response())
}
