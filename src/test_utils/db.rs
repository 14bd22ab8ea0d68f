//! Helpers for setting up test database fixtures.

use rusqlite::Connection;

use crate::auth::{Email, PasswordHash, UserId, create_user};

/// A bcrypt hash of an arbitrary password, precomputed so tests don't pay the
/// hashing cost. Do not use outside of tests.
const TEST_PASSWORD_HASH: &str = "$2y$04$ohxu9pkSIaUx8cfMPBtoPeT0o6awdH4xrdGRbaa/7dtE4PxWq1S2y";

/// Insert a user with the given email and return its ID.
///
/// The database must already be initialized.
pub(crate) fn create_test_user(connection: &Connection, email: &str) -> UserId {
    create_user(
        Email::new_unchecked(email),
        "Test User",
        PasswordHash::new_unchecked(TEST_PASSWORD_HASH),
        connection,
    )
    .expect("could not create test user")
    .id
}
