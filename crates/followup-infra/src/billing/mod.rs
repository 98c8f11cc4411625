//! Stripe billing integration.
//!
//! `stripe` creates checkout and billing-portal sessions; `webhook`
//! verifies the `Stripe-Signature` header before any event is processed.

pub mod stripe;
pub mod webhook;

pub use stripe::StripeClient;
