//! Helpers for asserting on rendered HTML responses.

use axum::response::Response;
use scraper::Html;

/// Read the body of `response` and parse it as an HTML document.
pub(crate) async fn parse_html_response(response: Response) -> Html {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("could not read response body");
    let text = String::from_utf8_lossy(&body);

    Html::parse_document(&text)
}
