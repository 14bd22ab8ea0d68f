//! Thin plumbing to the external hosted checkout collaborator.

mod core;
mod endpoint;

pub use core::{CheckoutConfig, CheckoutMode, CheckoutRequest, CheckoutSession, create_checkout_session};
pub use endpoint::checkout_endpoint;
