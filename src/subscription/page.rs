//! The subscription page: plan details, trial state and checkout actions.

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
    auth::UserId,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, base, format_currency,
        loading_spinner,
    },
    navigation::NavBar,
    subscription::core::{
        DEFAULT_PLAN_NAME, Plan, SubscriptionFlags, SubscriptionWithPlan, evaluate,
        get_plan_by_name, get_subscription_with_plan,
    },
};

/// The features listed on the plan card.
const PLAN_FEATURES: [&str; 6] = [
    "Track income and expenses",
    "Custom categories",
    "Separate personal and business accounts",
    "Monthly summaries",
    "Dashboard with charts",
    "Email support",
];

fn format_trial_date(timestamp: Option<OffsetDateTime>) -> String {
    timestamp.map_or_else(|| "N/A".to_owned(), |timestamp| timestamp.date().to_string())
}

fn start_trial_view(plan: &Plan) -> Markup {
    html! {
        div class="text-center mb-8"
        {
            h2 class="text-xl font-semibold" { "Welcome to Cashflow" }
            p class="text-gray-500 dark:text-gray-400"
            {
                "Start now with a free 7-day trial, no commitment!"
            }
        }

        div class=(format!("{CARD_STYLE} max-w-md mx-auto"))
        {
            h3 class="text-lg font-medium text-center" { (plan.name) " Plan" }
            p class="mt-4 text-sm text-gray-500 dark:text-gray-400 text-center" { (plan.description) }

            p class="mt-8 flex justify-center items-baseline"
            {
                span class="text-3xl font-extrabold" { (format_currency(plan.price)) }
                span class="text-sm font-medium text-gray-500 dark:text-gray-400" { "/month" }
            }

            ul class="mt-6 space-y-2"
            {
                @for feature in PLAN_FEATURES {
                    li class="flex text-sm text-gray-500 dark:text-gray-400"
                    {
                        span class="text-green-500 mr-2" { "✓" }
                        (feature)
                    }
                }
            }

            form
                hx-post=(endpoints::START_TRIAL)
                hx-target-error="#alert-container"
                hx-indicator="#indicator"
                hx-disabled-elt="#submit-button"
                class="mt-8"
            {
                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                    " Start free 7-day trial"
                }
            }

            p class="mt-2 text-xs text-gray-500 dark:text-gray-400 text-center"
            {
                "No commitment. Cancel anytime."
            }
        }
    }
}

fn current_subscription_view(
    subscription_with_plan: &SubscriptionWithPlan,
    flags: SubscriptionFlags,
) -> Markup {
    let subscription = &subscription_with_plan.subscription;
    let plan = &subscription_with_plan.plan;

    let status_label = if flags.is_trial_active {
        "In trial period"
    } else if flags.has_active_subscription {
        "Active"
    } else {
        "Inactive"
    };

    html! {
        div class=(format!("{CARD_STYLE} w-full max-w-2xl"))
        {
            div class="flex items-center justify-between pb-6 border-b border-gray-200 dark:border-gray-700"
            {
                div
                {
                    h2 class="text-xl font-semibold" { "Your current plan: " (plan.name) }
                    p class="mt-1 text-sm text-gray-500 dark:text-gray-400" { "Status: " (status_label) }
                }

                span class="inline-flex items-center px-3 py-1 rounded-full text-sm font-medium bg-blue-100 text-blue-800 dark:bg-blue-900 dark:text-blue-300"
                {
                    (format_currency(plan.price)) " /month"
                }
            }

            @if flags.is_trial_active {
                div class="mt-6 p-4 bg-yellow-50 dark:bg-yellow-900/20 rounded-lg"
                {
                    h3 class="text-sm font-medium text-yellow-800 dark:text-yellow-300" { "Trial period active" }
                    p class="mt-2 text-sm text-yellow-700 dark:text-yellow-400"
                    {
                        "Your trial ends on "
                        (format_trial_date(subscription.trial_end))
                        ". After that date you will need to subscribe to keep using the app."
                    }
                }
            }

            div class="mt-6"
            {
                h3 class="text-lg font-medium" { "Plan details" }
                dl class="mt-2 space-y-4"
                {
                    div class="flex justify-between"
                    {
                        dt class="text-sm font-medium text-gray-500 dark:text-gray-400" { "Trial start" }
                        dd class="text-sm" { (format_trial_date(subscription.trial_start)) }
                    }
                    div class="flex justify-between"
                    {
                        dt class="text-sm font-medium text-gray-500 dark:text-gray-400" { "Trial end" }
                        dd class="text-sm" { (format_trial_date(subscription.trial_end)) }
                    }
                }
            }

            div class="mt-6"
            {
                form
                    hx-post=(endpoints::CHECKOUT)
                    hx-target-error="#alert-container"
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                {
                    button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                        " Subscribe now"
                    }
                }
            }
        }
    }
}

fn subscription_view(
    subscription_with_plan: Option<&SubscriptionWithPlan>,
    flags: SubscriptionFlags,
    default_plan: &Plan,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::SUBSCRIPTION_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Subscription" }

            @if let Some(subscription_with_plan) = subscription_with_plan {
                (current_subscription_view(subscription_with_plan, flags))
            } @else {
                (start_trial_view(default_plan))
            }
        }
    };

    base("Subscription", &[], &content)
}

/// The state needed to display the subscription page.
#[derive(Debug, Clone)]
pub struct SubscriptionPageState {
    /// The database connection for reading subscriptions and plans.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SubscriptionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the subscription page for the current user.
pub async fn get_subscription_page(
    State(state): State<SubscriptionPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let (subscription_with_plan, default_plan) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let subscription_with_plan = get_subscription_with_plan(user_id, &connection)?;
        let default_plan = get_plan_by_name(DEFAULT_PLAN_NAME, &connection).map_err(|error| {
            match error {
                Error::NotFound => Error::MissingPlan(DEFAULT_PLAN_NAME.to_owned()),
                error => error,
            }
        })?;

        (subscription_with_plan, default_plan)
    };

    let flags = evaluate(
        subscription_with_plan
            .as_ref()
            .map(|subscription_with_plan| &subscription_with_plan.subscription),
        OffsetDateTime::now_utc(),
    );

    Ok(subscription_view(subscription_with_plan.as_ref(), flags, &default_plan).into_response())
}
