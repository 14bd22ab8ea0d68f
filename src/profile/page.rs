//! The profile page: display name, account email and subscription summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, endpoints,
    auth::{User, UserId, get_user_by_id},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, link, loading_spinner,
    },
    navigation::NavBar,
    subscription::{SubscriptionFlags, evaluate, get_subscription_with_plan},
};

fn profile_form(user: &User) -> Markup {
    html! {
        form
            hx-put=(endpoints::PROFILE_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#name, #submit-button"
            class="space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    name="name"
                    id="name"
                    type="text"
                    value=(user.name)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label class=(FORM_LABEL_STYLE) { "Email" }
                p class="text-sm text-gray-500 dark:text-gray-400" { (user.email) }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Save"
            }
        }
    }
}

fn subscription_summary(flags: SubscriptionFlags, plan_name: Option<&str>) -> Markup {
    let status_label = if flags.is_trial_active {
        "In trial period"
    } else if flags.has_active_subscription {
        "Active"
    } else {
        "Inactive"
    };

    html! {
        div class="space-y-2"
        {
            p class="text-sm"
            {
                "Plan: "
                (plan_name.unwrap_or("None"))
            }

            p class="text-sm" { "Status: " (status_label) }

            p
            {
                (link(endpoints::SUBSCRIPTION_VIEW, "Manage subscription"))
            }
        }
    }
}

fn profile_view(user: &User, flags: SubscriptionFlags, plan_name: Option<&str>) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Your Profile" }

            div class="grid grid-cols-1 md:grid-cols-2 gap-6 w-full max-w-2xl"
            {
                div class=(CARD_STYLE)
                {
                    h2 class="text-lg font-medium mb-4" { "Personal Information" }
                    (profile_form(user))
                }

                div class=(CARD_STYLE)
                {
                    h2 class="text-lg font-medium mb-4" { "Subscription" }
                    (subscription_summary(flags, plan_name))
                }
            }
        }
    };

    base("Profile", &[], &content)
}

/// The state needed to display the profile page.
#[derive(Debug, Clone)]
pub struct ProfilePageState {
    /// The database connection for reading the user and subscription.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfilePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the profile page for the current user.
pub async fn get_profile_page(
    State(state): State<ProfilePageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let (user, subscription_with_plan) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)?;
        let subscription_with_plan = get_subscription_with_plan(user_id, &connection)?;

        (user, subscription_with_plan)
    };

    let flags = evaluate(
        subscription_with_plan
            .as_ref()
            .map(|subscription_with_plan| &subscription_with_plan.subscription),
        OffsetDateTime::now_utc(),
    );
    let plan_name = subscription_with_plan
        .as_ref()
        .map(|subscription_with_plan| subscription_with_plan.plan.name.as_str());

    Ok(profile_view(&user, flags, plan_name).into_response())
}

#[cfg(test)]
mod profile_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        test_utils::{create_test_user, parse_html_response},
    };

    use super::{ProfilePageState, get_profile_page};

    #[tokio::test]
    async fn page_shows_name_and_email() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = create_test_user(&conn, "owner@example.com");
        let state = ProfilePageState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = get_profile_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let html = parse_html_response(response).await;
        let rendered = html.html();
        assert!(rendered.contains("owner@example.com"));
        assert!(rendered.contains("Test User"));
    }
}
