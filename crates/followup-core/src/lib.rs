//! Business logic and repository trait definitions for the FUB Follow-up
//! Assistant.
//!
//! This crate defines the "ports" (repository and gateway traits) that the
//! infrastructure layer implements. It depends only on `followup-types` --
//! never on `followup-infra` or any database/IO crate.

pub mod assist;
pub mod billing;
pub mod crm;
pub mod llm;
pub mod ratelimit;
pub mod repository;
