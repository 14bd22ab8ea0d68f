//! Defines the endpoint for deleting a category.

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
    category::{CategoryId, db::delete_category},
};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a category, redirects to the categories view on success.
///
/// Transactions that referenced the category are kept and become uncategorized.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let result = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_response(),
        };

        delete_category(category_id, user_id, &connection)
    };

    match result {
        Ok(()) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DeleteMissingCategory) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not delete category {category_id}: {error}");
            error.into_response()
        }
    }
}
