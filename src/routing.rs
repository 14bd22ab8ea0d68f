//! Application router configuration with the three route tiers: public,
//! account-only, and subscription-gated.

use axum::{
    Router,
    middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, update_category_endpoint,
    },
    checkout::checkout_endpoint,
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    profile::{get_profile_page, update_profile_endpoint},
    subscription::{
        get_subscription_page, start_trial_endpoint, subscription_guard, subscription_guard_hx,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_create_transaction_page, get_edit_transaction_page, get_transactions_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    // Pages that require a logged in user but work without a subscription, so
    // that new and lapsed users can still manage their account.
    let account_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::SUBSCRIPTION_VIEW, get(get_subscription_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT routes need to use the HX-Redirect header for auth
    // redirects to work properly for HTMX requests.
    let account_api_routes = Router::new()
        .route(endpoints::START_TRIAL, post(start_trial_endpoint))
        .route(endpoints::CHECKOUT, post(checkout_endpoint))
        .route(endpoints::PROFILE_API, put(update_profile_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    // The functional pages, gated behind an active subscription or trial. The
    // auth guard is layered outermost so the subscription guard can read the
    // user ID it extracts.
    let subscribed_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            subscription_guard,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let subscribed_api_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(endpoints::PUT_TRANSACTION, put(edit_transaction_endpoint))
        .route(
            endpoints::DELETE_TRANSACTION,
            delete(delete_transaction_endpoint),
        )
        .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
        .route(endpoints::PUT_CATEGORY, put(update_category_endpoint))
        .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            subscription_guard_hx,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    account_routes
        .merge(account_api_routes)
        .merge(subscribed_routes)
        .merge(subscribed_api_routes)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, CheckoutConfig, PaginationConfig, build_router, endpoints,
    };

    fn test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(
            conn,
            "42",
            "Etc/UTC",
            PaginationConfig::default(),
            CheckoutConfig::default(),
        )
        .expect("could not create app state");

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn log_in_and_register_pages_are_public() {
        let server = test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
        server.get(endpoints::REGISTER_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn functional_pages_redirect_anonymous_users_to_log_in() {
        let server = test_server();

        for endpoint in [
            endpoints::DASHBOARD_VIEW,
            endpoints::TRANSACTIONS_VIEW,
            endpoints::NEW_TRANSACTION_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::SUBSCRIPTION_VIEW,
            endpoints::PROFILE_VIEW,
        ] {
            let response = server.get(endpoint).await;

            response.assert_status(StatusCode::SEE_OTHER);
            assert!(
                response
                    .header("location")
                    .to_str()
                    .unwrap()
                    .starts_with(endpoints::LOG_IN_VIEW),
                "{endpoint} should redirect to the log in page"
            );
        }
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard_for_anonymous_users() {
        let server = test_server();

        let response = server.get(endpoints::ROOT).await;

        // Anonymous users are bounced by the auth guard before the redirect
        // to the dashboard is reached.
        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn unknown_path_renders_not_found_page() {
        let server = test_server();

        let response = server.get("/definitely/not/a/page").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_then_trial_unlocks_the_dashboard() {
        let server = test_server();

        let registration = server
            .post(endpoints::USERS)
            .form(&crate::auth::RegisterForm {
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
                password: "kY8#mQz!vR2pW9xN".to_owned(),
                confirm_password: "kY8#mQz!vR2pW9xN".to_owned(),
            })
            .await;

        registration.assert_status(StatusCode::SEE_OTHER);
        let auth_cookie = registration.cookie("token");

        // Without a subscription the dashboard bounces to the subscription page.
        let dashboard = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(auth_cookie.clone())
            .await;
        dashboard.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(
            dashboard.header("location").to_str().unwrap(),
            endpoints::SUBSCRIPTION_VIEW
        );

        let trial = server
            .post(endpoints::START_TRIAL)
            .add_cookie(auth_cookie.clone())
            .await;
        trial.assert_status(StatusCode::SEE_OTHER);

        let dashboard = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(auth_cookie)
            .await;
        dashboard.assert_status_ok();
    }
}
