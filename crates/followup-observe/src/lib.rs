//! Observability plumbing: tracing subscriber setup and OTel GenAI
//! attribute constants for LLM call instrumentation.

pub mod genai_attrs;
pub mod tracing_setup;
