//! Defines the endpoint for updating the current user's display name.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    alert::Alert,
    auth::{UserId, update_user_name},
};

/// The state needed to update the user's profile.
#[derive(Debug, Clone)]
pub struct UpdateProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for updating the profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileForm {
    /// The new display name.
    pub name: String,
}

/// A route handler that updates the current user's display name and confirms
/// the save with an alert, leaving the user on the profile page.
pub async fn update_profile_endpoint(
    State(state): State<UpdateProfileState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let name = form.name.trim();

    if name.is_empty() {
        return Error::EmptyName.into_response();
    }

    let result = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => return Error::DatabaseLockError.into_response(),
        };

        update_user_name(user_id, name, &connection)
    };

    match result {
        Ok(()) => Alert::success("Profile updated", "Your name was saved.").into_response(),
        Err(error) => {
            tracing::error!("Could not update profile for user {user_id}: {error}");
            error.into_response()
        }
    }
}
