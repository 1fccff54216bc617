//! Configuration loading with env-var overrides.
//!
//! # Module layout
//!
//! - **types** — Resolved configuration structs consumed by the stages
//!   (`Config`, `Paths`, `LoaderConfig`, `LogConfig`).
//! - **raw** — Raw TOML deserialization types and production defaults;
//!   kept private.
//! - **load** — Loading logic: `load`, `load_from`, `Config::rooted_at`.

mod load;
mod raw;
mod types;

pub use load::{load, load_from, CONFIG_ENV, LOG_LEVEL_ENV};
pub use types::*;
