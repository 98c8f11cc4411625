//! Follow Up Boss API integration.

pub mod fub;

pub use fub::FubClient;
