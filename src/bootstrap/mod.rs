//! Bootstrap layer — modules that run before any pipeline stage.
//!
//! - **logger** — tracing-subscriber initialisation.

pub mod logger;
