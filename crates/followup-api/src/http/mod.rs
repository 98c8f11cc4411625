//! HTTP layer: router, error mapping, response envelope, extractors, handlers.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
