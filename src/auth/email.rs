//! A validated email address.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A validated email address used to identify a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidEmail] if `raw_email` is
    /// not a valid email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let raw_email = raw_email.trim();

        let (local, domain) = raw_email
            .split_once('@')
            .ok_or_else(|| Error::InvalidEmail(raw_email.to_string()))?;

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidEmail(raw_email.to_string()));
        }

        Ok(Self(raw_email.to_string()))
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted email address.
    /// For emails coming from the user (e.g., via the REST API), this function should **not** be
    /// used, instead use the checked version.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an incorrectly
    /// formatted email is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_string())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod email_tests {
    use crate::Error;

    use super::Email;

    #[test]
    fn create_email_success() {
        let email = Email::new("foo@bar.baz");

        assert!(email.is_ok())
    }

    #[test]
    fn create_email_trims_whitespace() {
        let email = Email::new("  foo@bar.baz ").unwrap();

        assert_eq!(email.as_ref(), "foo@bar.baz");
    }

    #[test]
    fn create_email_fails_with_no_at_symbol() {
        let email = Email::new("foobar.baz");

        assert!(matches!(email, Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn create_email_fails_with_empty_string() {
        let email = Email::new("");

        assert!(matches!(email, Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn create_email_fails_with_empty_local_part() {
        let email = Email::new("@bar.baz");

        assert!(matches!(email, Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn create_email_fails_with_two_at_symbols() {
        let email = Email::new("foo@bar@baz");

        assert!(matches!(email, Err(Error::InvalidEmail(_))));
    }
}
