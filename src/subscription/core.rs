//! Defines the subscription and plan models, their database queries, and the
//! pure evaluation of a subscription's access flags.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::UserId,
    database_id::{PlanId, SubscriptionId},
};

/// The name of the plan that trials are started on.
///
/// The plan is seeded by [seed_default_plan] when the database is initialized.
pub const DEFAULT_PLAN_NAME: &str = "Standard";

/// How long a free trial lasts: exactly seven 24-hour days.
pub const TRIAL_DURATION: Duration = Duration::days(7);

// ============================================================================
// MODELS
// ============================================================================

/// The status of a subscription as reported by the billing collaborator.
///
/// Statuses this application does not know about are preserved as
/// [SubscriptionStatus::Other] rather than rejected, since the billing
/// collaborator owns the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// The subscription is paid and active.
    Active,
    /// The subscription was canceled.
    Canceled,
    /// The subscription is in its free trial period.
    Trial,
    /// A provider-defined status this application does not interpret.
    #[serde(untagged)]
    Other(String),
}

impl SubscriptionStatus {
    /// The status as the lowercase string stored in the database.
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Other(other) => other,
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "active" => SubscriptionStatus::Active,
            "canceled" => SubscriptionStatus::Canceled,
            "trial" => SubscriptionStatus::Trial,
            other => SubscriptionStatus::Other(other.to_owned()),
        })
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A paid plan that users subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// The ID of the plan.
    pub id: PlanId,
    /// The display name of the plan.
    pub name: String,
    /// The monthly price of the plan.
    pub price: f64,
    /// A short description of what the plan includes.
    pub description: String,
}

/// A user's subscription record.
///
/// Each user has at most one subscription; the store enforces this with a
/// unique constraint on the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// The ID of the subscription.
    pub id: SubscriptionId,
    /// The user that owns the subscription.
    pub user_id: UserId,
    /// The plan the subscription is for.
    pub plan_id: PlanId,
    /// The current status of the subscription.
    pub status: SubscriptionStatus,
    /// When the free trial started, if one was started.
    pub trial_start: Option<OffsetDateTime>,
    /// When the free trial ends, if one was started.
    pub trial_end: Option<OffsetDateTime>,
}

/// A subscription joined with its plan for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionWithPlan {
    /// The subscription record.
    pub subscription: Subscription,
    /// The plan the subscription is for.
    pub plan: Plan,
}

/// The access flags derived from a subscription at a point in time.
///
/// The flags are never stored: a trial that was active an hour ago may have
/// expired by now, so they must be recomputed at each evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriptionFlags {
    /// Whether the free trial is currently running.
    pub is_trial_active: bool,
    /// Whether the user has any form of access: a paid subscription or an
    /// active trial.
    pub has_active_subscription: bool,
}

/// Compute the access flags for `subscription` at time `now`.
///
/// This function is pure: `now` is injected rather than read from a global
/// clock, and no I/O is performed.
pub fn evaluate(subscription: Option<&Subscription>, now: OffsetDateTime) -> SubscriptionFlags {
    let Some(subscription) = subscription else {
        return SubscriptionFlags::default();
    };

    let is_trial_active = subscription
        .trial_end
        .is_some_and(|trial_end| trial_end > now);

    SubscriptionFlags {
        is_trial_active,
        has_active_subscription: subscription.status == SubscriptionStatus::Active
            || is_trial_active,
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Retrieve a user's subscription joined with its plan.
///
/// Returns `Ok(None)` if the user has no subscription, since a missing
/// subscription is an expected state and not an error.
pub fn get_subscription_with_plan(
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<SubscriptionWithPlan>, Error> {
    let result = connection
        .prepare(
            "SELECT s.id, s.user_id, s.plan_id, s.status, s.trial_start, s.trial_end,
                    p.id, p.name, p.price, p.description
             FROM subscription s
             INNER JOIN plan p ON s.plan_id = p.id
             WHERE s.user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(SubscriptionWithPlan {
                subscription: map_subscription_row(row)?,
                plan: Plan {
                    id: row.get(6)?,
                    name: row.get(7)?,
                    price: row.get(8)?,
                    description: row.get(9)?,
                },
            })
        });

    match result {
        Ok(subscription_with_plan) => Ok(Some(subscription_with_plan)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Retrieve a user's subscription without its plan.
pub fn get_subscription(
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<Subscription>, Error> {
    let result = connection
        .prepare(
            "SELECT id, user_id, plan_id, status, trial_start, trial_end
             FROM subscription WHERE user_id = :user_id",
        )?
        .query_row(&[(":user_id", &user_id.as_i64())], map_subscription_row);

    match result {
        Ok(subscription) => Ok(Some(subscription)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Retrieve the plan with the given name.
pub fn get_plan_by_name(name: &str, connection: &Connection) -> Result<Plan, Error> {
    connection
        .prepare("SELECT id, name, price, description FROM plan WHERE name = :name")?
        .query_row(&[(":name", &name)], |row| {
            Ok(Plan {
                id: row.get(0)?,
                name: row.get(1)?,
                price: row.get(2)?,
                description: row.get(3)?,
            })
        })
        .map_err(|error| error.into())
}

/// Start the free trial for `user_id` at time `now`.
///
/// The trial runs on the default plan from `now` until exactly
/// [TRIAL_DURATION] later. The store enforces at most one subscription per
/// user, so a second trial can never be created for the same owner.
///
/// # Errors
/// This function will return an:
/// - [Error::MissingPlan] if the default plan does not exist in the database,
/// - [Error::DuplicateSubscription] if the user already has a subscription,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn start_trial(
    user_id: UserId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Subscription, Error> {
    let plan = get_plan_by_name(DEFAULT_PLAN_NAME, connection).map_err(|error| match error {
        Error::NotFound => Error::MissingPlan(DEFAULT_PLAN_NAME.to_owned()),
        error => error,
    })?;

    let trial_start = now;
    let trial_end = now + TRIAL_DURATION;

    let subscription = connection
        .prepare(
            "INSERT INTO subscription (user_id, plan_id, status, trial_start, trial_end)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, plan_id, status, trial_start, trial_end",
        )?
        .query_row(
            (
                user_id.as_i64(),
                plan.id,
                SubscriptionStatus::Trial.as_str(),
                trial_start,
                trial_end,
            ),
            map_subscription_row,
        )
        .map_err(Error::from)?;

    Ok(subscription)
}

/// Create the plan table.
pub fn create_plan_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS plan (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                price REAL NOT NULL,
                description TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create the subscription table.
pub fn create_subscription_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS subscription (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                plan_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                trial_start TEXT,
                trial_end TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(plan_id) REFERENCES plan(id)
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default plan if it does not exist yet.
pub fn seed_default_plan(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "INSERT OR IGNORE INTO plan (name, price, description)
         VALUES (?1, ?2, ?3)",
        (
            DEFAULT_PLAN_NAME,
            14.90,
            "Everything you need to keep track of your cash flow",
        ),
    )?;

    Ok(())
}

fn map_subscription_row(row: &Row) -> Result<Subscription, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let plan_id = row.get(2)?;
    let raw_status: String = row.get(3)?;
    let trial_start = row.get(4)?;
    let trial_end = row.get(5)?;

    let status = raw_status
        .parse()
        .expect("parsing a subscription status is infallible");

    Ok(Subscription {
        id,
        user_id: UserId::new(raw_user_id),
        plan_id,
        status,
        trial_start,
        trial_end,
    })
}

#[cfg(test)]
mod evaluate_tests {
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::auth::UserId;

    use super::{Subscription, SubscriptionStatus, evaluate};

    fn subscription(
        status: SubscriptionStatus,
        trial_end: Option<OffsetDateTime>,
    ) -> Subscription {
        Subscription {
            id: 1,
            user_id: UserId::new(1),
            plan_id: 1,
            status,
            trial_start: None,
            trial_end,
        }
    }

    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00:00 UTC);

    #[test]
    fn trial_ending_in_the_future_is_active() {
        let subscription =
            subscription(SubscriptionStatus::Trial, Some(NOW + Duration::hours(1)));

        let flags = evaluate(Some(&subscription), NOW);

        assert!(flags.is_trial_active);
        assert!(flags.has_active_subscription);
    }

    #[test]
    fn expired_trial_is_inactive() {
        let subscription =
            subscription(SubscriptionStatus::Trial, Some(NOW - Duration::hours(1)));

        let flags = evaluate(Some(&subscription), NOW);

        assert!(!flags.is_trial_active);
        assert!(!flags.has_active_subscription);
    }

    #[test]
    fn trial_ending_exactly_now_is_inactive() {
        let subscription = subscription(SubscriptionStatus::Trial, Some(NOW));

        let flags = evaluate(Some(&subscription), NOW);

        assert!(!flags.is_trial_active);
    }

    #[test]
    fn active_status_grants_access_regardless_of_trial_fields() {
        let subscription = subscription(SubscriptionStatus::Active, None);

        let flags = evaluate(Some(&subscription), NOW);

        assert!(!flags.is_trial_active);
        assert!(flags.has_active_subscription);
    }

    #[test]
    fn active_status_with_expired_trial_still_grants_access() {
        let subscription =
            subscription(SubscriptionStatus::Active, Some(NOW - Duration::days(30)));

        let flags = evaluate(Some(&subscription), NOW);

        assert!(!flags.is_trial_active);
        assert!(flags.has_active_subscription);
    }

    #[test]
    fn canceled_subscription_without_trial_has_no_access() {
        let subscription = subscription(SubscriptionStatus::Canceled, None);

        let flags = evaluate(Some(&subscription), NOW);

        assert!(!flags.has_active_subscription);
    }

    #[test]
    fn missing_subscription_has_no_access() {
        let flags = evaluate(None, NOW);

        assert!(!flags.is_trial_active);
        assert!(!flags.has_active_subscription);
    }

    #[test]
    fn unknown_provider_status_does_not_grant_access() {
        let subscription = subscription(
            SubscriptionStatus::Other("past_due".to_owned()),
            None,
        );

        let flags = evaluate(Some(&subscription), NOW);

        assert!(!flags.has_active_subscription);
    }
}

#[cfg(test)]
mod subscription_query_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error, auth::UserId, db::initialize, subscription::core::TRIAL_DURATION,
        test_utils::create_test_user,
    };

    use super::{
        DEFAULT_PLAN_NAME, SubscriptionStatus, get_plan_by_name, get_subscription,
        get_subscription_with_plan, start_trial,
    };

    fn get_test_db_connection() -> (Connection, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user_id = create_test_user(&connection, "owner@example.com");

        (connection, user_id)
    }

    #[test]
    fn default_plan_is_seeded() {
        let (connection, _) = get_test_db_connection();

        let plan = get_plan_by_name(DEFAULT_PLAN_NAME, &connection).unwrap();

        assert_eq!(plan.name, DEFAULT_PLAN_NAME);
        assert!(plan.price > 0.0);
    }

    #[test]
    fn start_trial_sets_exact_seven_day_window() {
        let (connection, user_id) = get_test_db_connection();
        let now = datetime!(2025-01-01 00:00:00 UTC);

        let subscription = start_trial(user_id, now, &connection).unwrap();

        assert_eq!(subscription.status, SubscriptionStatus::Trial);
        assert_eq!(subscription.trial_start, Some(now));
        assert_eq!(
            subscription.trial_end,
            Some(datetime!(2025-01-08 00:00:00 UTC))
        );
        assert_eq!(subscription.trial_end, Some(now + TRIAL_DURATION));
    }

    #[test]
    fn second_trial_for_same_user_is_rejected() {
        let (connection, user_id) = get_test_db_connection();
        let now = datetime!(2025-01-01 00:00:00 UTC);

        start_trial(user_id, now, &connection).unwrap();
        let result = start_trial(user_id, now, &connection);

        assert_eq!(result, Err(Error::DuplicateSubscription));
    }

    #[test]
    fn get_subscription_returns_none_without_subscription() {
        let (connection, user_id) = get_test_db_connection();

        assert_eq!(get_subscription(user_id, &connection), Ok(None));
        assert_eq!(get_subscription_with_plan(user_id, &connection), Ok(None));
    }

    #[test]
    fn get_subscription_with_plan_joins_the_plan() {
        let (connection, user_id) = get_test_db_connection();
        let now = datetime!(2025-01-01 00:00:00 UTC);
        let created = start_trial(user_id, now, &connection).unwrap();

        let fetched = get_subscription_with_plan(user_id, &connection)
            .unwrap()
            .expect("subscription should exist");

        assert_eq!(fetched.subscription, created);
        assert_eq!(fetched.plan.name, DEFAULT_PLAN_NAME);
    }

    #[test]
    fn round_trips_subscription_timestamps() {
        let (connection, user_id) = get_test_db_connection();
        let now = datetime!(2025-03-05 13:37:42 UTC);
        let created = start_trial(user_id, now, &connection).unwrap();

        let fetched = get_subscription(user_id, &connection).unwrap().unwrap();

        assert_eq!(fetched.trial_start, created.trial_start);
        assert_eq!(fetched.trial_end, created.trial_end);
    }
}
