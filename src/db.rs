//! Database initialization for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, auth::create_user_table, category::create_category_table,
    subscription::{create_plan_table, create_subscription_table, seed_default_plan},
    transaction::create_transaction_table,
};

/// Create the tables for the domain models and seed the default plan.
///
/// This function is idempotent: it can be run against an existing database
/// without destroying data.
///
/// # Errors
/// Returns an error if any of the tables cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_plan_table(&transaction)?;
    create_subscription_table(&transaction)?;

    seed_default_plan(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("could not initialize database");

        let mut statement = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .unwrap();
        let table_names: Vec<String> = statement
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|name| name.unwrap())
            .collect();

        for table in ["user", "category", "transaction", "plan", "subscription"] {
            assert!(
                table_names.iter().any(|name| name == table),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).expect("first initialize failed");
        initialize(&conn).expect("second initialize failed");
    }
}
