//! The 500 internal server error page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// A route handler that renders the internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    get_internal_server_error_response()
}

/// Get a response containing the rendered 500 error page.
pub fn get_internal_server_error_response() -> Response {
    let view = error_view(
        "Error",
        "500",
        "Sorry, something went wrong.",
        "Try again later or check the server logs.",
    );

    (StatusCode::INTERNAL_SERVER_ERROR, view).into_response()
}

/// Get a response that will redirect the client to the internal server error 500 page.
///
/// **Note**: This redirect is intended to be served as a response to a POST request initiated by
/// HTMX. Route handlers using GET should use `axum::response::Redirect` to redirect via a response.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::http::StatusCode;
    use axum_htmx::HX_REDIRECT;

    use super::{get_internal_server_error_page, get_internal_server_error_redirect};

    #[tokio::test]
    async fn renders_error_page() {
        let response = get_internal_server_error_page().await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn redirect_sets_hx_redirect_header() {
        let response = get_internal_server_error_redirect();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            crate::endpoints::INTERNAL_ERROR_VIEW
        );
    }
}
