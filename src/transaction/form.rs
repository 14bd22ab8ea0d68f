//! The shared form for creating and editing transactions.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, endpoints,
    category::{Category, CategoryId},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    transaction::{Account, Transaction, TransactionBuilder, TransactionKind},
};

/// The form data for creating or editing a transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionFormData {
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The value of the transaction.
    pub amount: f64,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Text detailing the transaction.
    pub description: String,
    /// The account the transaction belongs to.
    pub account: Account,
    /// The ID of the category to assign the transaction to.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

impl TransactionFormData {
    /// Validate the form data and convert it into a [TransactionBuilder].
    ///
    /// Amounts are stored as positive magnitudes, so zero and negative
    /// amounts are rejected here at the write boundary rather than stored
    /// as-is.
    ///
    /// # Errors
    /// Returns an:
    /// - [Error::NonPositiveAmount] if the amount is zero, negative or not a number,
    /// - [Error::EmptyDescription] if the description is empty,
    /// - [Error::FutureDate] if the date is after `today`.
    pub fn into_builder(self, today: Date) -> Result<TransactionBuilder, Error> {
        if !(self.amount > 0.0) || !self.amount.is_finite() {
            return Err(Error::NonPositiveAmount(self.amount));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }

        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(
            Transaction::build(self.kind, self.amount, self.date, description)
                .account(self.account)
                .category_id(self.category_id),
        )
    }
}

/// Which endpoint the transaction form submits to.
pub(super) enum FormAction {
    /// Create a new transaction.
    Create,
    /// Edit the transaction with the given ID.
    Edit(crate::database_id::TransactionId),
}

fn kind_radio(selected: TransactionKind) -> Markup {
    html! {
        div
        {
            label class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for (kind, label) in [
                    (TransactionKind::Income, "Income"),
                    (TransactionKind::Expense, "Expense"),
                ] {
                    div class="flex-1 flex"
                    {
                        input
                            type="radio"
                            name="kind"
                            id=(format!("kind-{kind}"))
                            value=(kind)
                            checked[selected == kind]
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(format!("kind-{kind}")) class=(FORM_RADIO_LABEL_STYLE) { (label) }
                    }
                }
            }
        }
    }
}

fn account_radio(selected: Account) -> Markup {
    html! {
        div
        {
            label class=(FORM_LABEL_STYLE) { "Account" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for (account, label) in [
                    (Account::Personal, "Personal"),
                    (Account::Business, "Business"),
                ] {
                    div class="flex-1 flex"
                    {
                        input
                            type="radio"
                            name="account"
                            id=(format!("account-{account}"))
                            value=(account)
                            checked[selected == account]
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(format!("account-{account}")) class=(FORM_RADIO_LABEL_STYLE) { (label) }
                    }
                }
            }
        }
    }
}

/// Render the transaction form, prefilled from `prefill` when editing.
pub(super) fn transaction_form(
    action: FormAction,
    prefill: Option<&Transaction>,
    max_date: Date,
    available_categories: &[Category],
) -> Markup {
    let selected_kind = prefill.map_or(TransactionKind::Income, |transaction| transaction.kind);
    let selected_account = prefill.map_or(Account::Personal, |transaction| transaction.account);
    let date = prefill.map_or(max_date, |transaction| transaction.date);
    let (title, submit_label) = match action {
        FormAction::Create => ("New Transaction", "Create Transaction"),
        FormAction::Edit(_) => ("Edit Transaction", "Save Transaction"),
    };

    let form_body = html! {
        h2 class="text-xl font-bold" { (title) }

        (kind_radio(selected_kind))

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            input
                name="amount"
                id="amount"
                type="number"
                step="0.01"
                min="0.01"
                placeholder="0.00"
                value=[prefill.map(|transaction| transaction.amount)]
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="date" class=(FORM_LABEL_STYLE) { "Date" }

            input
                name="date"
                id="date"
                type="date"
                max=(max_date)
                required
                value=(date)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Description" }

            input
                name="description"
                id="description"
                type="text"
                placeholder="Description"
                value=[prefill.map(|transaction| &transaction.description)]
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        @if !available_categories.is_empty() {
            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    name="category_id"
                    id="category_id"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "Select a category" }

                    @for category in available_categories {
                        option
                            value=(category.id)
                            selected[prefill.is_some_and(|transaction| transaction.category_id == Some(category.id))]
                        {
                            (category.name)
                        }
                    }
                }
            }
        }

        (account_radio(selected_account))

        button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
        {
            span
                id="indicator"
                class="inline htmx-indicator"
            {
                (loading_spinner())
            }
            " " (submit_label)
        }
    };

    // Submissions are disabled while a request is in flight so that rapid
    // double-clicks cannot create the same transaction twice.
    match action {
        FormAction::Create => html! {
            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
            }
        },
        FormAction::Edit(transaction_id) => html! {
            form
                hx-put=(endpoints::format_endpoint(endpoints::PUT_TRANSACTION, transaction_id))
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4 md:space-y-6"
            {
                (form_body)
            }
        },
    }
}

#[cfg(test)]
mod transaction_form_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{Account, TransactionKind},
    };

    use super::TransactionFormData;

    fn form_data(amount: f64, description: &str, date: time::Date) -> TransactionFormData {
        TransactionFormData {
            kind: TransactionKind::Expense,
            amount,
            date,
            description: description.to_owned(),
            account: Account::Personal,
            category_id: None,
        }
    }

    const TODAY: time::Date = date!(2025 - 06 - 15);

    #[test]
    fn valid_form_becomes_builder() {
        let builder = form_data(12.5, "Lunch", TODAY).into_builder(TODAY).unwrap();

        assert_eq!(builder.amount, 12.5);
        assert_eq!(builder.description, "Lunch");
    }

    #[test]
    fn zero_amount_is_rejected() {
        let result = form_data(0.0, "Lunch", TODAY).into_builder(TODAY);

        assert_eq!(result, Err(Error::NonPositiveAmount(0.0)));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result = form_data(-5.0, "Lunch", TODAY).into_builder(TODAY);

        assert_eq!(result, Err(Error::NonPositiveAmount(-5.0)));
    }

    #[test]
    fn nan_amount_is_rejected() {
        let result = form_data(f64::NAN, "Lunch", TODAY).into_builder(TODAY);

        assert!(matches!(result, Err(Error::NonPositiveAmount(_))));
    }

    #[test]
    fn empty_description_is_rejected() {
        let result = form_data(12.5, "  ", TODAY).into_builder(TODAY);

        assert_eq!(result, Err(Error::EmptyDescription));
    }

    #[test]
    fn future_date_is_rejected() {
        let tomorrow = TODAY.next_day().unwrap();

        let result = form_data(12.5, "Lunch", tomorrow).into_builder(TODAY);

        assert_eq!(result, Err(Error::FutureDate(tomorrow)));
    }

    #[test]
    fn date_of_today_is_accepted() {
        let result = form_data(12.5, "Lunch", TODAY).into_builder(TODAY);

        assert!(result.is_ok());
    }

    // The category select posts an empty string when nothing is chosen, which
    // must deserialize as no category rather than fail.
    #[test]
    fn empty_category_id_deserializes_as_none() {
        let form: TransactionFormData = serde_html_form::from_str(
            "kind=expense&amount=12.5&date=2025-06-15&description=Lunch&account=personal&category_id=",
        )
        .unwrap();

        assert_eq!(form.category_id, None);
        assert_eq!(form.kind, TransactionKind::Expense);
        assert_eq!(form.account, Account::Personal);
        assert_eq!(form.date, TODAY);
    }
}
