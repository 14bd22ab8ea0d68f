//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::Email, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The email the user registered with.
    pub email: Email,
    /// The user's display name. May be empty.
    pub name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns an [Error::DuplicateEmail] if a user with `email` already exists,
/// or an [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    email: Email,
    name: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, name, password) VALUES (?1, ?2, ?3)",
        (email.as_ref(), name, password_hash.as_ref()),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        name: name.to_owned(),
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database registered with `email`.
///
/// # Errors
///
/// This function will return an [Error::NotFound] if no user is registered
/// with `email`, or an [Error::SqlError] if there was some other SQL error.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, name, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email.as_ref())], map_user_row)
        .map_err(|error| error.into())
}

/// Set the display name of the user with `user_id` to `name`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if `user_id` does not belong to a registered
/// user, or an [Error::SqlError] if an SQL related error occurred.
pub fn update_user_name(user_id: UserId, name: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET name = ?1 WHERE id = ?2",
        (name, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let name = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserId::new(raw_id),
        email: Email::new_unchecked(&raw_email),
        name,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
