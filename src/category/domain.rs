//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, auth::UserId};

/// The label used for transactions that have no category, e.g. because the
/// category was deleted.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty
    /// invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A category for grouping transactions (e.g., 'Groceries', 'Salary').
///
/// Categories are owned by a single user and are only visible to that user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    pub name: CategoryName,
}

/// Form data for category creation and editing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
}
