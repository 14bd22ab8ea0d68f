//! Helpers for building safe redirect URLs back to the page a user was trying to reach.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Validate a redirect URL supplied by the client.
///
/// Only same-site absolute paths are allowed: the URL must start with a single
/// '/' and parse as a valid URI. Anything else (including protocol-relative
/// URLs such as '//evil.example') is rejected to prevent open redirects.
pub(crate) fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    if !raw_url.starts_with('/') || raw_url.starts_with("//") {
        return None;
    }

    raw_url.parse::<Uri>().ok()?;

    Some(raw_url.to_owned())
}

/// Build a log-in page URL that redirects back to `target` after logging in.
pub(crate) fn build_log_in_redirect_url_from_target(target: &str) -> Option<String> {
    let query = serde_urlencoded::to_string([("redirect_url", target)]).ok()?;

    Some(format!("{}?{}", endpoints::LOG_IN_VIEW, query))
}

/// Build a log-in page URL that redirects back to the page the request was for.
///
/// Returns `None` for requests that do not target a page (e.g., API calls),
/// since redirecting back to an API endpoint after log-in would render a bare
/// fragment instead of a page.
pub(crate) fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let path = request.uri().path();

    if path.starts_with("/api") {
        return None;
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str())?;
    let target = normalize_redirect_url(target)?;

    build_log_in_redirect_url_from_target(&target)
}
