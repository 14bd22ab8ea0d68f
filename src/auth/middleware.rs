//! Authentication middleware that validates cookies, extends sessions, and handles redirects.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState, endpoints,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
};

/// How far into the future the auth cookie expiry is pushed on each request.
const COOKIE_EXTENSION: Duration = Duration::minutes(5);

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid authorization cookie.
/// The user ID is placed into the request and then the request executed normally if the cookie is
/// valid, otherwise a redirect to the log-in page is returned using `get_redirect`.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    });

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => return get_redirect(&log_in_redirect_url),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), COOKIE_EXTENSION) {
        Ok(updated_jar) => updated_jar,
        Err(err) => {
            tracing::error!("Error extending cookie duration: {err:?}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks for a valid authorization cookie.
/// The user ID is placed into the request and then the request executed normally if the cookie is
/// valid, otherwise a redirect to the log-in page is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware function that checks for a valid authorization cookie.
/// The user ID is placed into the request and then the request executed normally if the cookie is
/// valid, otherwise a HTMX redirect to the log-in page is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}
