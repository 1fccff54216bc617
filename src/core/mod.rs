//! Core infrastructure — shared foundation used across the whole crate.
//!
//! - **config** — configuration loading and resolved types.
//! - **error** — bootstrap-wide error enum and exit codes.

pub mod config;
pub mod error;
