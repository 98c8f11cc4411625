//! Stripe billing: webhook event classification and account updates.

pub mod events;
pub mod service;

pub use events::{BillingUpdate, classify_event, map_stripe_status};
pub use service::BillingService;
