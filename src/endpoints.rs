//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}/edit',
//! use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in, subscribed users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for listing and creating categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page showing the user's plan, trial state and checkout actions.
pub const SUBSCRIPTION_VIEW: &str = "/subscription";
/// The page for viewing and editing the user's profile.
pub const PROFILE_VIEW: &str = "/profile";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register a new user.
pub const USERS: &str = "/api/users";
/// The route to update the current user's profile.
pub const PROFILE_API: &str = "/api/profile";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update a transaction.
pub const PUT_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete a transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to update a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to start the free trial for the current user.
pub const START_TRIAL: &str = "/api/subscription/trial";
/// The route to create a checkout session and redirect to the payment page.
pub const CHECKOUT: &str = "/api/checkout";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transactions/{transaction_id}/edit',
/// '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
