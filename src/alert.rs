//! Alert partials for displaying success and error messages to users.
//!
//! Alerts are rendered as htmx out-of-band swaps targeting the alert
//! container in the base layout, so any endpoint can surface a message
//! without re-rendering the page around it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertType {
    Success,
    Error,
}

/// An alert message with a headline and optional details.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    alert_type: AlertType,
    message: &'a str,
    details: &'a str,
}

impl<'a> Alert<'a> {
    /// Create a new success alert
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    /// Render the alert as an out-of-band swap for the alert container.
    pub fn into_html(self) -> Markup {
        let (container_style, heading_style) = match self.alert_type {
            AlertType::Success => (
                "p-4 text-green-800 border border-green-300 rounded-lg bg-green-50 \
                 dark:bg-gray-800 dark:text-green-400 dark:border-green-800",
                "text-sm font-semibold",
            ),
            AlertType::Error => (
                "p-4 text-red-800 border border-red-300 rounded-lg bg-red-50 \
                 dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                "text-sm font-semibold",
            ),
        };

        html! {
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    p class=(heading_style) { (self.message) }

                    @if !self.details.is_empty() {
                        p class="mt-1 text-sm" { (self.details) }
                    }
                }
            }
        }
    }

    /// Render the alert as an HTTP response with the given status code.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}

impl IntoResponse for Alert<'_> {
    fn into_response(self) -> Response {
        self.into_response_with_status(StatusCode::OK)
    }
}
