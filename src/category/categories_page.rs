//! The page for listing and creating categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::{Category, db::get_all_categories},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, loading_spinner,
    },
    navigation::NavBar,
};

fn new_category_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_CATEGORY)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#name, #submit-button"
            class="flex items-end gap-2 w-full max-w-md mb-6"
        {
            div class="grow"
            {
                label for="name" class=(FORM_LABEL_STYLE) { "New category" }

                input
                    name="name"
                    id="name"
                    type="text"
                    placeholder="e.g. Groceries"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Add"
            }
        }
    }
}

fn categories_table(categories: &[Category]) -> Markup {
    html! {
        @if categories.is_empty() {
            p class="text-gray-500 dark:text-gray-400"
            {
                "You have no categories yet. Create one above to organize your transactions."
            }
        } @else {
            table class="w-full max-w-md text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for category in categories {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (category.name) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                a
                                    href=(endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id))
                                    class=(LINK_STYLE)
                                {
                                    "Edit"
                                }

                                " "

                                button
                                    hx-delete=(endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id))
                                    hx-confirm="Delete this category? Its transactions will become uncategorized."
                                    hx-target-error="#alert-container"
                                    class=(BUTTON_DELETE_STYLE)
                                {
                                    "Delete"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn categories_view(categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Categories" }

            (new_category_form())
            (categories_table(categories))
        }
    };

    base("Categories", &[], &content)
}

/// The state needed to display the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    /// The database connection for accessing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page listing the user's categories.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for categories page: {error}")
        })?
    };

    Ok(categories_view(&categories).into_response())
}
