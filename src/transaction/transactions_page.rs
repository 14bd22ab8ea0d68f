//! Defines the route handler for the page that displays transactions as a table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::UNCATEGORIZED_LABEL,
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators},
    transaction::{
        TransactionKind, TransactionRow,
        core::{count_transactions, get_transaction_rows_page},
    },
};

/// The maximum number of grapheme clusters of a description shown in the table.
const DESCRIPTION_DISPLAY_LIMIT: usize = 40;

/// Truncate `description` for display in the table.
fn truncate_description(description: &str) -> String {
    let graphemes: Vec<&str> = description.graphemes(true).collect();

    if graphemes.len() <= DESCRIPTION_DISPLAY_LIMIT {
        description.to_owned()
    } else {
        format!("{}…", graphemes[..DESCRIPTION_DISPLAY_LIMIT].concat())
    }
}

fn signed_amount(row: &TransactionRow) -> Markup {
    match row.kind {
        TransactionKind::Income => html! {
            span class="text-green-600 dark:text-green-400" { "+" (format_currency(row.amount)) }
        },
        TransactionKind::Expense => html! {
            span class="text-red-600 dark:text-red-400" { "-" (format_currency(row.amount)) }
        },
    }
}

fn transaction_table_row(row: &TransactionRow) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, row.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, row.id);
    let category_label = row
        .category_name
        .as_ref()
        .map_or(UNCATEGORIZED_LABEL, |name| name.as_ref());

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (row.date) }
            td class=(TABLE_CELL_STYLE) title=(row.description) { (truncate_description(&row.description)) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (category_label) }
            }
            td class=(TABLE_CELL_STYLE) { (row.account) }
            td class=(TABLE_CELL_STYLE) { (signed_amount(row)) }
            td class=(TABLE_CELL_STYLE)
            {
                a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                " "

                button
                    hx-delete=(delete_url)
                    hx-confirm="Delete this transaction?"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn pagination_view(indicators: &[PaginationIndicator]) -> Markup {
    let page_url = |page: u64| format!("{}?page={}", endpoints::TRANSACTIONS_VIEW, page);

    html! {
        nav class="flex items-center gap-2 mt-4" aria-label="Transaction pages"
        {
            @for indicator in indicators {
                @match indicator {
                    PaginationIndicator::BackButton(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { "Previous" }
                    }
                    PaginationIndicator::Page(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { (page) }
                    }
                    PaginationIndicator::CurrPage(page) => {
                        span class="font-bold" { (page) }
                    }
                    PaginationIndicator::Ellipsis => {
                        span { "…" }
                    }
                    PaginationIndicator::NextButton(page) => {
                        a href=(page_url(*page)) class=(LINK_STYLE) { "Next" }
                    }
                }
            }
        }
    }
}

fn transactions_view(rows: &[TransactionRow], indicators: &[PaginationIndicator]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="flex w-full max-w-4xl justify-between items-center mb-4"
            {
                h1 class="text-2xl font-bold" { "Transactions" }

                a
                    href=(endpoints::NEW_TRANSACTION_VIEW)
                    class=(LINK_STYLE)
                {
                    "New transaction"
                }
            }

            @if rows.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "No transactions yet. Create your first one to get started."
                }
            } @else {
                div class="w-full max-w-4xl overflow-x-auto shadow-md sm:rounded-lg"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (transaction_table_row(row))
                            }
                        }
                    }
                }

                (pagination_view(indicators))
            }
        }
    };

    base("Transactions", &[], &content)
}

/// The query parameters accepted by the transactions page.
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    /// The page of transactions to display.
    pub page: Option<u64>,
}

/// The state needed to display the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
    /// The database connection for accessing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            pagination_config: state.pagination_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the paginated table of the user's transactions.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let page_size = state.pagination_config.default_page_size;
    let page = query
        .page
        .unwrap_or(state.pagination_config.default_page)
        .max(1);

    let (rows, transaction_count) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let rows =
            get_transaction_rows_page(user_id, page_size, (page - 1) * page_size, &connection)?;
        let transaction_count = count_transactions(user_id, &connection)?;

        (rows, transaction_count)
    };

    let page_count = transaction_count.div_ceil(page_size).max(1);
    let indicators =
        create_pagination_indicators(page.min(page_count), page_count, state.pagination_config.max_pages);

    Ok(transactions_view(&rows, &indicators).into_response())
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::Query, extract::State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        pagination::PaginationConfig,
        test_utils::{create_test_user, parse_html_response},
        transaction::{Transaction, TransactionKind, core::create_transaction},
    };

    use super::{TransactionsPageState, TransactionsQuery, get_transactions_page, truncate_description};

    fn test_state(conn: Connection) -> TransactionsPageState {
        TransactionsPageState {
            pagination_config: PaginationConfig::default(),
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn page_lists_transactions_with_amounts() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        create_transaction(
            Transaction::build(
                TransactionKind::Income,
                1250.0,
                date!(2025 - 01 - 15),
                "Invoice paid",
            ),
            user_id,
            &conn,
        )
        .unwrap();

        let response = get_transactions_page(
            State(test_state(conn)),
            Extension(user_id),
            Query(TransactionsQuery { page: None }),
        )
        .await
        .unwrap();

        let html = parse_html_response(response).await;
        let rendered = html.html();
        assert!(rendered.contains("Invoice paid"));
        assert!(rendered.contains("$1,250.00"));
    }

    #[tokio::test]
    async fn page_shows_empty_state_without_transactions() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");

        let response = get_transactions_page(
            State(test_state(conn)),
            Extension(user_id),
            Query(TransactionsQuery { page: None }),
        )
        .await
        .unwrap();

        let html = parse_html_response(response).await;
        assert!(html.html().contains("No transactions yet"));
    }

    #[test]
    fn short_description_is_unchanged() {
        assert_eq!(truncate_description("Lunch"), "Lunch");
    }

    #[test]
    fn long_description_is_truncated() {
        let description = "a".repeat(100);

        let truncated = truncate_description(&description);

        assert!(truncated.ends_with('…'));
        assert!(truncated.chars().count() < description.chars().count());
    }
}
