//! User accounts and cookie-based authentication.
//!
//! This module contains everything related to knowing who is making a request:
//! - The `User` model, validated `Email` and password types
//! - Private cookie handling and the auth token
//! - The log-in, log-out and registration pages and endpoints
//! - Middleware that guards routes behind a valid auth cookie

mod cookie;
mod email;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub use email::Email;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{RegisterForm, get_register_page, register_user};
pub use user::{User, UserId, create_user_table, get_user_by_id, update_user_name};

pub(crate) use user::create_user;
