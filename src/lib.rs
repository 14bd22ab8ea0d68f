//! Cashflow is a web app for tracking personal and small-business cash flow.
//!
//! Users register, record income and expense transactions against a personal
//! or business account, review monthly summaries on a dashboard, and manage
//! the trial/paid subscription that gates the functional pages.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod checkout;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod pagination;
mod profile;
mod routing;
mod subscription;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Email, PasswordHash, User, UserId, ValidatedPassword};
pub use checkout::CheckoutConfig;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use routing::build_router;

use crate::{
    alert::Alert,
    category::CategoryId,
    internal_server_error::get_internal_server_error_response,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The auth cookie contents could not be parsed as a token.
    ///
    /// The inner string is the parse error, which should only be logged on
    /// the server.
    #[error("could not parse auth token: {0}")]
    InvalidToken(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string used to create an email address was not a valid email.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email used to register already belongs to another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An empty string was used as a display name.
    #[error("Name cannot be empty")]
    EmptyName,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The category ID used to create a transaction did not match a valid
    /// category owned by the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A zero or negative amount was used to create a transaction.
    ///
    /// Amounts are stored as positive magnitudes; the direction of the money
    /// flow comes from the transaction kind.
    #[error("{0} is not a positive amount")]
    NonPositiveAmount(f64),

    /// An empty description was used to create a transaction.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to create a subscription for a user that already has one.
    ///
    /// The store enforces at most one subscription per user, so a second
    /// trial can never be created for the same owner.
    #[error("the user already has a subscription")]
    DuplicateSubscription,

    /// The plan needed to start a trial does not exist in the database.
    #[error("the plan \"{0}\" does not exist in the database")]
    MissingPlan(String),

    /// The checkout collaborator is missing its configuration.
    #[error("checkout is not configured")]
    CheckoutNotConfigured,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JsonSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("subscription.user_id") =>
            {
                Error::DuplicateSubscription
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidCredentials
            | Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::EmptyName
            | Error::EmptyCategoryName
            | Error::InvalidCategory(_)
            | Error::NonPositiveAmount(_)
            | Error::EmptyDescription
            | Error::FutureDate(_)
            | Error::DuplicateSubscription => Alert::error(
                "Invalid input",
                &self.to_string(),
            )
            .into_response_with_status(StatusCode::UNPROCESSABLE_ENTITY),
            error => {
                tracing::error!("request failed with an internal error: {error}");
                get_internal_server_error_response()
            }
        }
    }
}
