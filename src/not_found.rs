//! The 404 not found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// A route handler that renders the 404 not found page.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Get a response containing the rendered 404 not found page.
pub fn get_404_not_found_response() -> Response {
    let view = error_view(
        "Not Found",
        "404",
        "Something's missing.",
        "Sorry, we can't find that page. You'll find lots to explore on the dashboard.",
    );

    (StatusCode::NOT_FOUND, view).into_response()
}
