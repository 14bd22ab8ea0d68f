//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth::DEFAULT_COOKIE_DURATION, checkout::CheckoutConfig, db::initialize,
    pagination::PaginationConfig,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// The config for the hosted checkout collaborator.
    pub checkout_config: CheckoutConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "America/Sao_Paulo".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
        checkout_config: CheckoutConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            checkout_config,
            db_connection: connection,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{checkout::CheckoutConfig, pagination::PaginationConfig};

    use super::AppState;

    #[test]
    fn new_initializes_database() {
        let conn = Connection::open_in_memory().unwrap();

        let state = AppState::new(
            conn,
            "42",
            "Etc/UTC",
            PaginationConfig::default(),
            CheckoutConfig::default(),
        )
        .expect("could not create app state");

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                ('user', 'category', 'transaction', 'plan', 'subscription')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 5);
    }
}
