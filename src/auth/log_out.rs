//! The route handler for logging out the current user.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::cookie::invalidate_auth_cookie, endpoints};

/// Invalidate the auth cookie and redirect to the log-in page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
