//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserId,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category for `user_id` and return it with its generated ID.
pub fn create_category(
    name: CategoryName,
    user_id: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, user_id) VALUES (?1, ?2);",
        (name.as_ref(), user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, user_id, name })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
/// Returns an [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM category WHERE id = :id AND user_id = :user_id;")?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of a user's categories ordered alphabetically by name.
pub fn get_all_categories(user_id: UserId, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM category WHERE user_id = :user_id ORDER BY name ASC;")?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update the name of a category owned by `user_id`.
///
/// # Errors
/// Returns an [Error::UpdateMissingCategory] if the category does not exist
/// or belongs to another user.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1 WHERE id = ?2 AND user_id = ?3",
        (new_name.as_ref(), category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category owned by `user_id`.
///
/// Transactions that reference the category keep existing and are rendered as
/// uncategorized.
///
/// # Errors
/// Returns an [Error::DeleteMissingCategory] if the category does not exist
/// or belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    // Foreign key enforcement is off by default in SQLite, so the ON DELETE
    // SET NULL clause alone cannot be relied on to clear references.
    connection.execute(
        "UPDATE \"transaction\" SET category_id = NULL WHERE category_id = ?1",
        [category_id],
    )?;

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id, name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id,
        user_id: UserId::new(raw_user_id),
        name: CategoryName::new_unchecked(&raw_name),
    })
}
