//! Dashboard module
//!
//! Provides an overview page showing the selected month's income, expenses
//! and balances split by account, together with a category breakdown chart.

mod aggregation;
mod cards;
mod charts;
mod handlers;

pub use aggregation::{CategoryShare, MonthlySummary, category_breakdown, monthly_summary};
pub use handlers::get_dashboard_page;
