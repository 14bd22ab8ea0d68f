//! Dashboard HTTP handlers and view rendering.
//!
//! The dashboard shows the selected month's summary cards, the category
//! breakdown chart and the month's most recent transactions. The month is
//! selected via query parameters and defaults to the current month in the
//! configured timezone.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Month;

use crate::{
    AppState, Error, endpoints,
    auth::UserId,
    category::UNCATEGORIZED_LABEL,
    dashboard::{
        aggregation::{
            CategoryShare, MonthlySummary, category_breakdown, monthly_summary,
            transactions_in_month,
        },
        cards::{account_cards_view, summary_cards_view},
        charts::{
            DashboardChart, breakdown_list_view, category_chart, chart_container, charts_script,
        },
    },
    html::{CARD_STYLE, HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, link},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{TransactionKind, TransactionRow, get_transaction_rows},
};

/// How many of the month's transactions are shown on the dashboard.
const RECENT_TRANSACTIONS_LIMIT: usize = 5;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters accepted by the dashboard page.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// The calendar month to display, 1-12.
    pub month: Option<u8>,
    /// The year to display.
    pub year: Option<i32>,
    /// Which kind of transactions the category chart shows.
    pub chart: Option<TransactionKind>,
}

fn dashboard_url(month: Month, year: i32, chart_kind: TransactionKind) -> String {
    format!(
        "{}?month={}&year={}&chart={}",
        endpoints::DASHBOARD_VIEW,
        u8::from(month),
        year,
        chart_kind
    )
}

fn month_selector_view(month: Month, year: i32, chart_kind: TransactionKind) -> Markup {
    let (previous_month, previous_year) = match month {
        Month::January => (Month::December, year - 1),
        month => (month.previous(), year),
    };
    let (next_month, next_year) = match month {
        Month::December => (Month::January, year + 1),
        month => (month.next(), year),
    };

    html! {
        div class="flex justify-center items-center space-x-4 bg-white dark:bg-gray-800 rounded-lg p-3 shadow-sm mb-4"
        {
            a
                href=(dashboard_url(previous_month, previous_year, chart_kind))
                aria-label="Previous month"
                class=(LINK_STYLE)
            {
                "←"
            }

            h2 class="text-lg font-medium" { (month) " " (year) }

            a
                href=(dashboard_url(next_month, next_year, chart_kind))
                aria-label="Next month"
                class=(LINK_STYLE)
            {
                "→"
            }
        }
    }
}

fn chart_kind_toggle_view(month: Month, year: i32, selected: TransactionKind) -> Markup {
    html! {
        div class="flex justify-center space-x-2 mb-4"
        {
            @for (kind, label) in [
                (TransactionKind::Expense, "Expenses"),
                (TransactionKind::Income, "Income"),
            ] {
                @if kind == selected {
                    span class="px-3 py-1 rounded-md text-sm font-medium bg-blue-100 text-blue-600 dark:bg-blue-900/30 dark:text-blue-200"
                    {
                        (label)
                    }
                } @else {
                    a
                        href=(dashboard_url(month, year, kind))
                        class="px-3 py-1 rounded-md text-sm font-medium text-gray-600 hover:bg-gray-200 dark:text-gray-300"
                    {
                        (label)
                    }
                }
            }
        }
    }
}

fn recent_transactions_view(month_transactions: &[TransactionRow]) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-lg font-medium mb-4" { "Latest Transactions" }

            @if month_transactions.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No transactions this month." }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for transaction in month_transactions.iter().take(RECENT_TRANSACTIONS_LIMIT) {
                        li class="py-2 flex justify-between text-sm"
                        {
                            span
                            {
                                (transaction.description)

                                " "

                                span class="text-gray-400"
                                {
                                    "("
                                    (transaction
                                        .category_name
                                        .as_ref()
                                        .map_or(UNCATEGORIZED_LABEL, |name| name.as_ref()))
                                    ")"
                                }
                            }

                            @if transaction.kind == TransactionKind::Income {
                                span class="text-green-600 dark:text-green-400"
                                {
                                    "+" (format_currency(transaction.amount))
                                }
                            } @else {
                                span class="text-red-600 dark:text-red-400"
                                {
                                    "-" (format_currency(transaction.amount))
                                }
                            }
                        }
                    }
                }

                p class="mt-4 text-center"
                {
                    (link(endpoints::TRANSACTIONS_VIEW, "View all transactions"))
                }
            }
        }
    }
}

fn breakdown_section_view(
    breakdown: &[CategoryShare],
    chart: Option<&DashboardChart>,
    month: Month,
    year: i32,
    chart_kind: TransactionKind,
) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h2 class="text-lg font-medium mb-4" { "Categories" }

            (chart_kind_toggle_view(month, year, chart_kind))

            @if breakdown.is_empty() {
                p class="text-center py-6 text-gray-500 dark:text-gray-400"
                {
                    "There is no data to display for this period."
                }
            } @else {
                @if let Some(chart) = chart {
                    (chart_container(chart))
                }

                (breakdown_list_view(breakdown))
            }
        }
    }
}

fn dashboard_view(
    summary: &MonthlySummary,
    breakdown: &[CategoryShare],
    month_transactions: &[TransactionRow],
    month: Month,
    year: i32,
    chart_kind: TransactionKind,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let (charts, head_elements): (Vec<DashboardChart>, Vec<HeadElement>) = if breakdown.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let chart_title = match chart_kind {
            TransactionKind::Expense => "Expenses by category",
            TransactionKind::Income => "Income by category",
        };
        let charts = vec![DashboardChart {
            id: "category-chart",
            options: category_chart(breakdown, chart_title).to_string(),
        }];
        let script = charts_script(&charts);

        (
            charts,
            vec![
                HeadElement::ScriptLink("/static/echarts-5.5.1-min.js".to_owned()),
                script,
            ],
        )
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                div class="flex justify-between items-center mb-4"
                {
                    h1 class="text-2xl font-bold" { "Dashboard" }

                    (link(endpoints::NEW_TRANSACTION_VIEW, "New transaction"))
                }

                (month_selector_view(month, year, chart_kind))
                (summary_cards_view(summary))
                (account_cards_view(summary))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (breakdown_section_view(breakdown, charts.first(), month, year, chart_kind))
                    (recent_transactions_view(month_transactions))
                }
            }
        }
    };

    base("Dashboard", &head_elements, &content)
}

/// Renders the dashboard page for the selected (or current) month.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let month = query
        .month
        .and_then(|month| Month::try_from(month).ok())
        .unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());
    let chart_kind = query.chart.unwrap_or(TransactionKind::Expense);

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transaction_rows(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve transactions for dashboard: {error}")
        })?
    };

    let summary = monthly_summary(&transactions, month, year);
    let month_transactions = transactions_in_month(&transactions, month, year);
    let breakdown = category_breakdown(&month_transactions, chart_kind);

    Ok(dashboard_view(
        &summary,
        &breakdown,
        &month_transactions,
        month,
        year,
        chart_kind,
    )
    .into_response())
}

#[cfg(test)]
mod dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::Query, extract::State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        test_utils::{create_test_user, parse_html_response},
        transaction::{Account, Transaction, TransactionKind, create_transaction},
    };

    use super::{DashboardQuery, DashboardState, get_dashboard_page};

    fn test_state(conn: Connection) -> DashboardState {
        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn query(month: u8, year: i32) -> DashboardQuery {
        DashboardQuery {
            month: Some(month),
            year: Some(year),
            chart: None,
        }
    }

    #[tokio::test]
    async fn dashboard_shows_monthly_totals() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");

        create_transaction(
            Transaction::build(
                TransactionKind::Income,
                100.0,
                date!(2025 - 03 - 05),
                "Salary",
            ),
            user_id,
            &conn,
        )
        .unwrap();
        create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                40.0,
                date!(2025 - 03 - 10),
                "Hosting",
            )
            .account(Account::Business),
            user_id,
            &conn,
        )
        .unwrap();

        let response = get_dashboard_page(
            State(test_state(conn)),
            Extension(user_id),
            Query(query(3, 2025)),
        )
        .await
        .unwrap();

        let html = parse_html_response(response).await;
        let rendered = html.html();
        // balance 60, income 100, expense 40, business -40
        assert!(rendered.contains("$60.00"));
        assert!(rendered.contains("$100.00"));
        assert!(rendered.contains("$40.00"));
        assert!(rendered.contains("-$40.00"));
        assert!(rendered.contains("March 2025"));
    }

    #[tokio::test]
    async fn dashboard_excludes_other_months() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");

        create_transaction(
            Transaction::build(
                TransactionKind::Expense,
                20.0,
                date!(2025 - 04 - 01),
                "April expense",
            ),
            user_id,
            &conn,
        )
        .unwrap();

        let response = get_dashboard_page(
            State(test_state(conn)),
            Extension(user_id),
            Query(query(3, 2025)),
        )
        .await
        .unwrap();

        let html = parse_html_response(response).await;
        let rendered = html.html();
        assert!(!rendered.contains("April expense"));
        assert!(rendered.contains("No transactions this month."));
    }

    #[tokio::test]
    async fn dashboard_shows_empty_breakdown_message_without_data() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");

        let response = get_dashboard_page(
            State(test_state(conn)),
            Extension(user_id),
            Query(query(3, 2025)),
        )
        .await
        .unwrap();

        let html = parse_html_response(response).await;
        assert!(html.html().contains("There is no data to display for this period."));
    }
}
