//! Card components for the monthly summary figures.

use maud::{Markup, html};

use crate::{
    dashboard::aggregation::MonthlySummary,
    html::{CARD_STYLE, format_currency},
};

fn summary_card(title: &str, amount: f64, extra_style: &str) -> Markup {
    html! {
        div class=(format!("{CARD_STYLE} {extra_style}"))
        {
            p class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class="mt-1 text-2xl font-semibold" { (format_currency(amount)) }
        }
    }
}

/// Renders the three headline cards: balance, income and expenses.
pub(super) fn summary_cards_view(summary: &MonthlySummary) -> Markup {
    html! {
        section class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 md:grid-cols-3 gap-4"
            {
                (summary_card("Balance", summary.balance, ""))
                (summary_card("Income", summary.income, "bg-green-50 dark:bg-green-900/20"))
                (summary_card("Expenses", summary.expense, "bg-red-50 dark:bg-red-900/20"))
            }
        }
    }
}

/// Renders the personal/business account cards.
pub(super) fn account_cards_view(summary: &MonthlySummary) -> Markup {
    html! {
        section class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 md:grid-cols-2 gap-4"
            {
                (summary_card("Personal Account", summary.personal_balance, ""))
                (summary_card("Business Account", summary.business_balance, ""))
            }
        }
    }
}
