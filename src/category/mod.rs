//! Category management for grouping transactions.
//!
//! This module contains everything related to categories:
//! - The `Category` model and validated `CategoryName`
//! - Database functions for storing, querying, and managing categories
//! - View handlers for the category pages and endpoints

mod categories_page;
mod create_endpoint;
mod db;
mod delete_endpoint;
mod domain;
mod edit_page;
mod update_endpoint;

pub use categories_page::get_categories_page;
pub use create_endpoint::create_category_endpoint;
pub use db::{create_category_table, get_all_categories};
pub use delete_endpoint::delete_category_endpoint;
pub use domain::{Category, CategoryFormData, CategoryId, CategoryName, UNCATEGORIZED_LABEL};
pub use edit_page::get_edit_category_page;
pub use update_endpoint::update_category_endpoint;

pub(crate) use db::create_category;

#[cfg(test)]
pub(crate) use db::get_category;
