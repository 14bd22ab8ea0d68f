//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, endpoints,
    auth::{
        Email,
        cookie::set_auth_cookie,
        redirect::normalize_redirect_url,
        user::get_user_by_email,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

fn email_input(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="email"
                class=(FORM_LABEL_STYLE)
            {
                "Email"
            }

            input
                type="email"
                name="email"
                id="email"
                placeholder="you@example.com"
                value=(email)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_none()]
            ;
        }
    }
}

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target-error="this"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (email_input(email, error_message))
            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

/// The query parameters accepted by the log-in page.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    /// The page to return to after logging in.
    pub redirect_url: Option<String>,
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for logging in.
#[derive(Serialize, Deserialize)]
pub struct LogInForm {
    /// The email the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
    /// Whether to keep the user logged in for a week.
    #[serde(default)]
    pub remember_me: Option<String>,
    /// The page to return to after logging in.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Log in the user with the credentials in `form` and set the auth cookie.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let redirect_url = parse_redirect_url(form.redirect_url.as_deref(), "log-in form");

    let log_in_result = verify_credentials(&state, &form.email, &form.password);

    let user = match log_in_result {
        Ok(user) => user,
        Err(Error::InvalidCredentials | Error::NotFound | Error::InvalidEmail(_)) => {
            let log_in_form = log_in_form(
                &form.email,
                Some("Incorrect email or password."),
                redirect_url.as_deref(),
            );

            return (StatusCode::UNPROCESSABLE_ENTITY, log_in_form).into_response();
        }
        Err(error) => {
            tracing::error!("An error occurred while logging in: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let cookie_duration = if form.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let redirect_url = redirect_url.unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

    (jar, HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
}

fn verify_credentials(
    state: &LogInState,
    raw_email: &str,
    raw_password: &str,
) -> Result<crate::auth::User, Error> {
    let email = Email::new(raw_email)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_email(&email, &connection)?
    };

    user.password_hash.verify(raw_password)?;

    Ok(user)
}
