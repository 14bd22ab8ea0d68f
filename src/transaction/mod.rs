//! Transaction management for the cash-flow application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model with its kind (income/expense) and account
//!   (personal/business) enums
//! - Database functions for storing, querying, and managing transactions
//! - View handlers for the transaction pages and endpoints

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod transactions_page;

pub use core::{
    Account, Transaction, TransactionBuilder, TransactionKind, TransactionRow,
    create_transaction_table, get_transaction_rows,
};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use form::TransactionFormData;
pub use transactions_page::get_transactions_page;

pub(crate) use core::create_transaction;
