//! The registration page and endpoint for creating a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, endpoints,
    auth::{Email, PasswordHash, cookie::set_auth_cookie, user::create_user},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
};

/// The minimum number of characters the password should have to be considered valid on the client
/// side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

/// Validation errors to display inline in the registration form.
#[derive(Debug, Default)]
struct RegistrationErrors<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn text_input(
    field: &str,
    label: &str,
    input_type: &str,
    value: &str,
    placeholder: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label
                for=(field)
                class=(FORM_LABEL_STYLE)
            {
                (label)
            }

            input
                type=(input_type)
                name=(field)
                id=(field)
                placeholder=(placeholder)
                value=(value)
                class=(FORM_TEXT_INPUT_STYLE)
                required;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(name: &str, email: &str, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-target-error="this"
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#name, #email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("name", "Name", "text", name, "Your name", errors.name))
            (text_input("email", "Email", "email", email, "you@example.com", errors.email))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", &RegistrationErrors::default());
    let content = log_in_register("Create your account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for registering a new user.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The user's display name.
    pub name: String,
    /// The email to register with.
    pub email: String,
    /// The password to register with.
    pub password: String,
    /// A repeat of the password to catch typos.
    pub confirm_password: String,
}

fn render_form_error(name: &str, email: &str, errors: RegistrationErrors) -> Response {
    let form = registration_form(name, email, &errors);

    (StatusCode::UNPROCESSABLE_ENTITY, form).into_response()
}

/// Create a new user account, log it in and redirect to the subscription page.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.name.trim().is_empty() {
        return render_form_error(
            &form.name,
            &form.email,
            RegistrationErrors {
                name: Some("Please enter your name."),
                ..Default::default()
            },
        );
    }

    let email = match Email::new(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return render_form_error(
                &form.name,
                &form.email,
                RegistrationErrors {
                    email: Some("Please enter a valid email address."),
                    ..Default::default()
                },
            );
        }
    };

    if form.password != form.confirm_password {
        return render_form_error(
            &form.name,
            &form.email,
            RegistrationErrors {
                confirm_password: Some("Passwords do not match."),
                ..Default::default()
            },
        );
    }

    let password_hash = match PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)
    {
        Ok(password_hash) => password_hash,
        Err(Error::TooWeak(feedback)) => {
            let message = format!("Password is too weak: {feedback}");
            return render_form_error(
                &form.name,
                &form.email,
                RegistrationErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            );
        }
        Err(error) => {
            tracing::error!("An error occurred while hashing the password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return get_internal_server_error_redirect();
            }
        };

        match create_user(email, form.name.trim(), password_hash, &connection) {
            Ok(user) => user,
            Err(Error::DuplicateEmail) => {
                return render_form_error(
                    &form.name,
                    &form.email,
                    RegistrationErrors {
                        email: Some("This email is already registered. Try logging in instead."),
                        ..Default::default()
                    },
                );
            }
            Err(error) => {
                tracing::error!("An error occurred while creating the user: {error}");
                return get_internal_server_error_redirect();
            }
        }
    };

    let jar = match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            return get_internal_server_error_redirect();
        }
    };

    (
        jar,
        HxRedirect(endpoints::SUBSCRIPTION_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
