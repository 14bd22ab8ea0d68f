//! Defines the endpoint for creating a new category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::{CategoryFormData, CategoryName, db::create_category},
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new category, redirects to the categories view on success.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserId>,
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

        create_category(name, user_id, &connection)
    };

    if let Err(error) = result {
        tracing::error!("Could not create category: {error}");
        return error.into_response();
    }

    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        category::{CategoryFormData, get_all_categories},
        db::initialize,
        endpoints,
        test_utils::create_test_user,
    };

    use super::{CreateCategoryState, create_category_endpoint};

    #[tokio::test]
    async fn creates_category_and_redirects() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = create_category_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(CategoryFormData {
                name: "Groceries".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::CATEGORIES_VIEW
        );

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(user_id, &connection).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Groceries");
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let state = CreateCategoryState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = create_category_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(CategoryFormData {
                name: "   ".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(user_id, &connection).unwrap();
        assert!(categories.is_empty());
    }
}
