//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it is a strong password.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password is considered too weak.
    /// The error message will explain why the password is considered too weak and suggest how to
    /// make it stronger.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        let password_analysis = zxcvbn(raw_password_string, &[]);

        match password_analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password_string.to_string())),
            _ => Err(Error::TooWeak(
                password_analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password_string` is a valid and secure password.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid
    /// password is provided it may cause incorrect behaviour but will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the
    /// recommended cost.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash
    /// is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Try to create a password hash from a raw password string.
    ///
    /// This is a convenience function that removes the need to manually create
    /// the intermediate `ValidatedPassword` type.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        let validated_password = ValidatedPassword::new(raw_password)?;
        PasswordHash::new(validated_password, cost)
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidCredentials] if the password does not match, or an
    /// [Error::HashingError] if an error occurred in the underlying hashing library.
    pub fn verify(&self, raw_password: &str) -> Result<(), Error> {
        match verify(raw_password, &self.0) {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::InvalidCredentials),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod password_tests {
    use crate::Error;

    use super::{PasswordHash, ValidatedPassword};

    /// Low cost to keep the test suite fast. Do not use outside of tests.
    const TEST_COST: u32 = 4;

    #[test]
    fn validation_rejects_weak_password() {
        let password = ValidatedPassword::new("password123");

        assert!(matches!(password, Err(Error::TooWeak(_))));
    }

    #[test]
    fn validation_accepts_strong_password() {
        let password = ValidatedPassword::new("kY8#mQz!vR2pW9xN");

        assert!(password.is_ok());
    }

    #[test]
    fn verify_accepts_matching_password() {
        let raw_password = "averygoodandlongpassword";
        let hash = PasswordHash::new(ValidatedPassword::new_unchecked(raw_password), TEST_COST)
            .expect("could not hash password");

        assert_eq!(hash.verify(raw_password), Ok(()));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = PasswordHash::new(
            ValidatedPassword::new_unchecked("averygoodandlongpassword"),
            TEST_COST,
        )
        .expect("could not hash password");

        assert_eq!(hash.verify("notthepassword"), Err(Error::InvalidCredentials));
    }

    #[test]
    fn display_hides_raw_password() {
        let password = ValidatedPassword::new_unchecked("hunter2hunter2");

        assert_eq!(password.to_string(), "********");
    }
}
