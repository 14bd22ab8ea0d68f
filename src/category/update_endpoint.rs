//! Defines the endpoint for renaming an existing category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::{CategoryFormData, CategoryId, CategoryName, db::update_category},
};

/// The state needed to update a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for renaming a category, redirects to the categories view on success.
pub async fn update_category_endpoint(
    State(state): State<UpdateCategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_response(),
    };

    let result = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_response(),
        };

        update_category(category_id, user_id, name, &connection)
    };

    match result {
        Ok(()) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingCategory) => Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("Could not update category {category_id}: {error}");
            error.into_response()
        }
    }
}
