//! Aggregation of transactions into the monthly figures shown on the dashboard.
//!
//! Provides functions to select the transactions of a calendar month, total
//! them into income/expense/balance figures split by account, and group them
//! by category for proportional display.

use std::collections::HashMap;

use time::Month;

use crate::{
    category::UNCATEGORIZED_LABEL,
    transaction::{Account, TransactionKind, TransactionRow},
};

/// The fixed palette cycled through when assigning colors to category groups,
/// indexed by rank.
pub(super) const CHART_PALETTE: [&str; 10] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
    "#6366F1", "#D946EF",
];

/// The income, expense and balance figures of a single calendar month.
///
/// All figures are in the same currency unit as the input amounts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlySummary {
    /// The sum of all income amounts in the month.
    pub income: f64,
    /// The sum of all expense amounts in the month.
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
    /// The income minus expenses of the personal account.
    pub personal_balance: f64,
    /// The income minus expenses of the business account.
    pub business_balance: f64,
}

/// Select the transactions whose date falls within the given calendar month.
///
/// The match is on the transaction's stored calendar date, so a transaction
/// dated on the first or last day of the month is included.
pub(super) fn transactions_in_month(
    transactions: &[TransactionRow],
    month: Month,
    year: i32,
) -> Vec<TransactionRow> {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.date.month() == month && transaction.date.year() == year
        })
        .cloned()
        .collect()
}

/// Total the transactions of the given calendar month.
///
/// An empty selection yields an all-zero summary, not an error.
pub fn monthly_summary(transactions: &[TransactionRow], month: Month, year: i32) -> MonthlySummary {
    let mut income = 0.0;
    let mut expense = 0.0;
    let mut personal_income = 0.0;
    let mut personal_expense = 0.0;
    let mut business_income = 0.0;
    let mut business_expense = 0.0;

    for transaction in transactions {
        if transaction.date.month() != month || transaction.date.year() != year {
            continue;
        }

        match transaction.kind {
            TransactionKind::Income => {
                income += transaction.amount;
                match transaction.account {
                    Account::Personal => personal_income += transaction.amount,
                    Account::Business => business_income += transaction.amount,
                }
            }
            TransactionKind::Expense => {
                expense += transaction.amount;
                match transaction.account {
                    Account::Personal => personal_expense += transaction.amount,
                    Account::Business => business_expense += transaction.amount,
                }
            }
        }
    }

    MonthlySummary {
        income,
        expense,
        balance: income - expense,
        personal_balance: personal_income - personal_expense,
        business_balance: business_income - business_expense,
    }
}

/// A category's share of the month's income or expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    /// The name of the category, or the uncategorized label.
    pub name: String,
    /// The summed amount of the category's transactions.
    pub value: f64,
    /// The category's share of the total, rounded to whole percent.
    pub percent: i64,
    /// The display color assigned from the palette by rank.
    pub color: &'static str,
}

/// Group the transactions of `kind` by category name and sum their amounts.
///
/// Groups are sorted by value descending; ties keep the order in which the
/// category was first encountered. Transactions without a category (or whose
/// category was deleted) are grouped under the uncategorized label.
///
/// If the total is zero no entries are produced, so callers can render an
/// empty state instead of dividing by zero.
pub fn category_breakdown(
    transactions: &[TransactionRow],
    kind: TransactionKind,
) -> Vec<CategoryShare> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for transaction in transactions {
        if transaction.kind != kind {
            continue;
        }

        let name = transaction
            .category_name
            .as_ref()
            .map_or(UNCATEGORIZED_LABEL, |name| name.as_ref());

        match index_by_name.get(name) {
            Some(&index) => totals[index].1 += transaction.amount,
            None => {
                index_by_name.insert(name.to_owned(), totals.len());
                totals.push((name.to_owned(), transaction.amount));
            }
        }
    }

    let total: f64 = totals.iter().map(|(_, value)| value).sum();

    if total == 0.0 {
        return Vec::new();
    }

    // Stable sort keeps first-encountered order for equal values.
    totals.sort_by(|a, b| b.1.partial_cmp(&a.1).expect("amounts are never NaN"));

    totals
        .into_iter()
        .enumerate()
        .map(|(rank, (name, value))| CategoryShare {
            name,
            value,
            percent: (100.0 * value / total).round() as i64,
            color: CHART_PALETTE[rank % CHART_PALETTE.len()],
        })
        .collect()
}
