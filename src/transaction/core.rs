//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::Type,
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserId,
    category::{CategoryId, CategoryName},
    database_id::TransactionId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brings money in or takes money out.
///
/// The amount of a transaction is always a positive magnitude; the direction
/// of the money flow comes from this kind, never from the sign of the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in, e.g. a salary payment.
    Income,
    /// Money going out, e.g. a grocery purchase.
    Expense,
}

impl TransactionKind {
    /// The kind as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction kind \"{other}\"")),
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The account a transaction belongs to.
///
/// Users track their personal and business money separately; every
/// transaction is assigned to exactly one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    /// The user's personal account.
    Personal,
    /// The user's business account.
    Business,
}

impl Account {
    /// The account as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Personal => "personal",
            Account::Business => "business",
        }
    }
}

impl FromStr for Account {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Account::Personal),
            "business" => Ok(Account::Business),
            other => Err(format!("unknown account \"{other}\"")),
        }
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The amount of money as a positive magnitude.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The account the transaction belongs to.
    pub account: Account,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount: f64,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            date,
            description: description.to_owned(),
            account: Account::Personal,
            category_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Optional fields default to the personal account with no category. Pass the
/// builder to [create_transaction] to insert the transaction into the
/// database.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The amount of money as a positive magnitude.
    pub amount: f64,
    /// The date when the transaction occurred.
    pub date: Date,
    /// A human-readable description of the transaction.
    pub description: String,
    /// The account the transaction belongs to.
    pub account: Account,
    /// The category of the transaction, e.g. "Groceries", "Rent".
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the account for the transaction.
    pub fn account(mut self, account: Account) -> Self {
        self.account = account;
        self
    }

    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// A transaction together with the name of its category, if any.
///
/// This is the row shape used for the transactions table and the dashboard
/// aggregations, where the category is displayed by name rather than by ID.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The amount of money as a positive magnitude.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The account the transaction belongs to.
    pub account: Account,
    /// The name of the transaction's category. `None` if the transaction has
    /// no category or the category was deleted.
    pub category_name: Option<CategoryName>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Check that `category_id` refers to a category owned by `user_id`.
fn validate_category_owner(
    category_id: Option<CategoryId>,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    let exists: bool = connection
        .prepare("SELECT EXISTS (SELECT 1 FROM category WHERE id = :id AND user_id = :user_id)")?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            |row| row.get(0),
        )?;

    if exists {
        Ok(())
    } else {
        Err(Error::InvalidCategory(Some(category_id)))
    }
}

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidCategory] if the specified category ID does not refer to
///   a category owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_category_owner(builder.category_id, user_id, connection)?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, kind, amount, date, description, account, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, kind, amount, date, description, account, category_id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.kind.as_str(),
                builder.amount,
                builder.date,
                builder.description,
                builder.account.as_str(),
                builder.category_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` by its `id`.
///
/// # Errors
/// This function will return an:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, kind, amount, date, description, account, category_id
             FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(&[(":id", &id), (":user_id", &user_id.as_i64())], map_transaction_row)?;

    Ok(transaction)
}

/// Overwrite the fields of an existing transaction owned by `user_id`.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidCategory] if the specified category ID does not refer to
///   a category owned by `user_id`,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a
///   transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    validate_category_owner(builder.category_id, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET kind = ?1, amount = ?2, date = ?3, description = ?4, account = ?5, category_id = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            builder.kind.as_str(),
            builder.amount,
            builder.date,
            builder.description,
            builder.account.as_str(),
            builder.category_id,
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// This function will return an:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a
///   transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Retrieve all of a user's transactions with their category names, newest first.
pub fn get_transaction_rows(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.kind, t.amount, t.date, t.description, t.account, c.name
             FROM \"transaction\" t
             LEFT JOIN category c ON t.category_id = c.id
             WHERE t.user_id = :user_id
             ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row_with_category)?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a single page of a user's transactions with their category names, newest first.
pub fn get_transaction_rows_page(
    user_id: UserId,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.kind, t.amount, t.date, t.description, t.account, c.name
             FROM \"transaction\" t
             LEFT JOIN category c ON t.category_id = c.id
             WHERE t.user_id = ?1
             ORDER BY t.date DESC, t.id DESC
             LIMIT ?2 OFFSET ?3",
        )?
        .query_map(
            (user_id.as_i64(), limit as i64, offset as i64),
            map_row_with_category,
        )?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of transactions owned by `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
pub fn count_transactions(user_id: UserId, connection: &Connection) -> Result<u64, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = :user_id;",
        &[(":user_id", &user_id.as_i64())],
        |row| row.get(0),
    )?;

    Ok(count as u64)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                account TEXT NOT NULL,
                category_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Composite index used by the transactions page and dashboard queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

fn parse_text_column<T: FromStr>(row: &Row, index: usize) -> Result<T, rusqlite::Error>
where
    T::Err: Display,
{
    let raw: String = row.get(index)?;

    raw.parse().map_err(|error: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            error.to_string().into(),
        )
    })
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let kind = parse_text_column(row, 2)?;
    let amount = row.get(3)?;
    let date = row.get(4)?;
    let description = row.get(5)?;
    let account = parse_text_column(row, 6)?;
    let category_id = row.get(7)?;

    Ok(Transaction {
        id,
        user_id: UserId::new(raw_user_id),
        kind,
        amount,
        date,
        description,
        account,
        category_id,
    })
}

fn map_row_with_category(row: &Row) -> Result<TransactionRow, rusqlite::Error> {
    let id = row.get(0)?;
    let kind = parse_text_column(row, 1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let description = row.get(4)?;
    let account = parse_text_column(row, 5)?;
    let raw_category_name: Option<String> = row.get(6)?;

    Ok(TransactionRow {
        id,
        kind,
        amount,
        date,
        description,
        account,
        category_name: raw_category_name
            .as_deref()
            .map(CategoryName::new_unchecked),
    })
}

#[cfg(test)]
mod transaction_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        auth::UserId,
        category::{CategoryName, create_category},
        db::initialize,
        test_utils::create_test_user,
    };

    use super::{
        Account, Transaction, TransactionKind, count_transactions, create_transaction,
        delete_transaction, get_transaction, get_transaction_rows, get_transaction_rows_page,
        update_transaction,
    };

    fn get_test_db_connection() -> (Connection, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user_id = create_test_user(&connection, "owner@example.com");

        (connection, user_id)
    }

    #[test]
    fn create_and_get_transaction() {
        let (connection, user_id) = get_test_db_connection();
        let builder = Transaction::build(
            TransactionKind::Expense,
            45.99,
            date!(2025 - 01 - 15),
            "Coffee beans",
        )
        .account(Account::Business);

        let created = create_transaction(builder, user_id, &connection).unwrap();
        let fetched = get_transaction(created.id, user_id, &connection).unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.kind, TransactionKind::Expense);
        assert_eq!(fetched.account, Account::Business);
        assert_eq!(fetched.amount, 45.99);
    }

    #[test]
    fn create_transaction_with_category() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            user_id,
            &connection,
        )
        .unwrap();

        let builder = Transaction::build(
            TransactionKind::Expense,
            25.50,
            date!(2025 - 01 - 15),
            "Weekly groceries",
        )
        .category_id(Some(category.id));

        let created = create_transaction(builder, user_id, &connection).unwrap();

        assert_eq!(created.category_id, Some(category.id));
    }

    #[test]
    fn create_transaction_with_other_users_category_fails() {
        let (connection, user_id) = get_test_db_connection();
        let other_user_id = create_test_user(&connection, "other@example.com");
        let category = create_category(
            CategoryName::new_unchecked("Private"),
            other_user_id,
            &connection,
        )
        .unwrap();

        let builder =
            Transaction::build(TransactionKind::Expense, 10.0, date!(2025 - 01 - 15), "Sneaky")
                .category_id(Some(category.id));

        let result = create_transaction(builder, user_id, &connection);

        assert_eq!(result, Err(Error::InvalidCategory(Some(category.id))));
    }

    #[test]
    fn get_transaction_of_other_user_fails() {
        let (connection, user_id) = get_test_db_connection();
        let other_user_id = create_test_user(&connection, "other@example.com");
        let builder =
            Transaction::build(TransactionKind::Income, 100.0, date!(2025 - 01 - 15), "Salary");
        let created = create_transaction(builder, user_id, &connection).unwrap();

        let result = get_transaction(created.id, other_user_id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_transaction_overwrites_fields() {
        let (connection, user_id) = get_test_db_connection();
        let builder =
            Transaction::build(TransactionKind::Income, 100.0, date!(2025 - 01 - 15), "Salary");
        let created = create_transaction(builder, user_id, &connection).unwrap();

        let update = Transaction::build(
            TransactionKind::Expense,
            55.0,
            date!(2025 - 01 - 20),
            "Correction",
        )
        .account(Account::Business);
        update_transaction(created.id, update, user_id, &connection).unwrap();

        let fetched = get_transaction(created.id, user_id, &connection).unwrap();
        assert_eq!(fetched.kind, TransactionKind::Expense);
        assert_eq!(fetched.amount, 55.0);
        assert_eq!(fetched.date, date!(2025 - 01 - 20));
        assert_eq!(fetched.account, Account::Business);
    }

    #[test]
    fn update_missing_transaction_fails() {
        let (connection, user_id) = get_test_db_connection();
        let update =
            Transaction::build(TransactionKind::Expense, 55.0, date!(2025 - 01 - 20), "Ghost");

        let result = update_transaction(999, update, user_id, &connection);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_transaction_removes_row() {
        let (connection, user_id) = get_test_db_connection();
        let builder =
            Transaction::build(TransactionKind::Income, 100.0, date!(2025 - 01 - 15), "Salary");
        let created = create_transaction(builder, user_id, &connection).unwrap();

        delete_transaction(created.id, user_id, &connection).unwrap();

        assert_eq!(count_transactions(user_id, &connection), Ok(0));
    }

    #[test]
    fn delete_transaction_of_other_user_fails() {
        let (connection, user_id) = get_test_db_connection();
        let other_user_id = create_test_user(&connection, "other@example.com");
        let builder =
            Transaction::build(TransactionKind::Income, 100.0, date!(2025 - 01 - 15), "Salary");
        let created = create_transaction(builder, user_id, &connection).unwrap();

        let result = delete_transaction(created.id, other_user_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
        assert_eq!(count_transactions(user_id, &connection), Ok(1));
    }

    #[test]
    fn transaction_rows_include_category_name_and_sort_newest_first() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            user_id,
            &connection,
        )
        .unwrap();

        create_transaction(
            Transaction::build(TransactionKind::Expense, 20.0, date!(2025 - 01 - 10), "Older")
                .category_id(Some(category.id)),
            user_id,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(TransactionKind::Income, 100.0, date!(2025 - 01 - 20), "Newer"),
            user_id,
            &connection,
        )
        .unwrap();

        let rows = get_transaction_rows(user_id, &connection).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Newer");
        assert_eq!(rows[0].category_name, None);
        assert_eq!(rows[1].description, "Older");
        assert_eq!(
            rows[1].category_name,
            Some(CategoryName::new_unchecked("Groceries"))
        );
    }

    #[test]
    fn transaction_rows_page_applies_limit_and_offset() {
        let (connection, user_id) = get_test_db_connection();

        for day in 1..=5 {
            create_transaction(
                Transaction::build(
                    TransactionKind::Expense,
                    day as f64,
                    date!(2025 - 01 - 01).replace_day(day).unwrap(),
                    "Daily",
                ),
                user_id,
                &connection,
            )
            .unwrap();
        }

        let page = get_transaction_rows_page(user_id, 2, 2, &connection).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].amount, 3.0);
        assert_eq!(page[1].amount, 2.0);
    }
}
