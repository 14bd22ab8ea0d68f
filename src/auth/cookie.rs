//! Defines functions for handling user authentication with cookies.
//!
//! The auth cookie is a private (encrypted and signed) cookie holding a JSON
//! [Token] with the user ID and the expiry time. The expiry is checked on the
//! server side in addition to the cookie's own expires attribute, since the
//! latter is enforced only by the browser.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserId, auth::token::Token};

pub(crate) const COOKIE_TOKEN: &str = "token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the expiry of the cookie to `duration` from the current time.
/// You can use [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns an [Error::JsonSerializationError] if the token cannot be serialized.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserId,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = Token {
        user_id,
        expires_at,
    };
    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the
/// cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the auth token from the cookies in `jar`.
///
/// # Errors
///
/// Returns an:
/// - [Error::CookieMissing] if the auth cookie is not in the cookie jar or the token has expired.
/// - [Error::InvalidToken] if the cookie contents could not be parsed as a token.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token = serde_json::from_str(cookie.value())
        .map_err(|error| Error::InvalidToken(error.to_string()))?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::CookieMissing);
    }

    Ok(token)
}

/// Extend the auth cookie so that it expires no earlier than `duration` from now.
///
/// A cookie that already expires later than that is left unchanged.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns an:
/// - [Error::CookieMissing] if the auth cookie is not in the cookie jar or the token has expired.
/// - [Error::InvalidToken] if the cookie contents could not be parsed as a token.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let minimum_expiry = OffsetDateTime::now_utc() + duration;

    if token.expires_at >= minimum_expiry {
        return Ok(jar);
    }

    let remaining = minimum_expiry - OffsetDateTime::now_utc();

    set_auth_cookie(jar, token.user_id, remaining)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, auth::UserId};

    use super::{
        COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, extend_auth_cookie_duration_if_needed,
        get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::generate())
    }

    #[test]
    fn set_and_get_auth_cookie() {
        let jar = get_jar();
        let user_id = UserId::new(1);

        let jar = set_auth_cookie(jar, user_id, DEFAULT_COOKIE_DURATION).unwrap();
        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, user_id);
        assert!(token.expires_at > OffsetDateTime::now_utc());
    }

    #[test]
    fn get_token_fails_without_cookie() {
        let jar = get_jar();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::CookieMissing));
    }

    #[test]
    fn get_token_fails_with_expired_token() {
        let jar = get_jar();
        let jar = set_auth_cookie(jar, UserId::new(1), Duration::minutes(-5)).unwrap();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::CookieMissing));
    }

    #[test]
    fn invalidated_cookie_is_rejected() {
        let jar = get_jar();
        let jar = set_auth_cookie(jar, UserId::new(1), DEFAULT_COOKIE_DURATION).unwrap();

        let jar = invalidate_auth_cookie(jar);

        assert!(matches!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn extend_pushes_expiry_forward() {
        let jar = get_jar();
        let jar = set_auth_cookie(jar, UserId::new(1), Duration::minutes(1)).unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(10)).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert!(token.expires_at > OffsetDateTime::now_utc() + Duration::minutes(9));
    }

    #[test]
    fn extend_keeps_later_expiry() {
        let jar = get_jar();
        let jar = set_auth_cookie(jar, UserId::new(1), Duration::days(7)).unwrap();
        let want = get_token_from_cookies(&jar).unwrap().expires_at;

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(10)).unwrap();

        let got = get_token_from_cookies(&jar).unwrap().expires_at;
        assert_eq!(got, want);
        // The cookie value should be byte-identical since the jar was not modified.
        assert!(jar.get(COOKIE_TOKEN).is_some());
    }
}
