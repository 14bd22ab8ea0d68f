//! The page for editing an existing category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::{Category, CategoryId, db::get_category},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner,
    },
    navigation::NavBar,
};

fn edit_category_view(category: &Category) -> Markup {
    let update_route = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category.id);
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_route)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#name, #submit-button"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Category" }

                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        name="name"
                        id="name"
                        type="text"
                        value=(category.name)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Save Category"
                }
            }
        }
    };

    base("Edit Category", &[], &content)
}

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    /// The database connection for accessing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a category.
pub async fn get_edit_category_page(
    State(state): State<EditCategoryPageState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let category = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_category(category_id, user_id, &connection)?
    };

    Ok(edit_category_view(&category).into_response())
}

#[cfg(test)]
mod edit_category_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::Path, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error,
        category::{CategoryName, create_category},
        db::initialize,
        test_utils::{create_test_user, parse_html_response},
    };

    use super::{EditCategoryPageState, get_edit_category_page};

    #[tokio::test]
    async fn page_prefills_category_name() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let category =
            create_category(CategoryName::new_unchecked("Groceries"), user_id, &conn).unwrap();

        let state = EditCategoryPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_edit_category_page(State(state), Extension(user_id), Path(category.id))
            .await
            .unwrap();

        let html = parse_html_response(response).await;
        assert!(html.html().contains("value=\"Groceries\""));
    }

    #[tokio::test]
    async fn missing_category_returns_not_found() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");

        let state = EditCategoryPageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result = get_edit_category_page(State(state), Extension(user_id), Path(999)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
