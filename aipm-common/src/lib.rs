//! # AIPM Common Library
//!
//! Shared code for the AIPM planner service:
//! - Error taxonomy
//! - Configuration resolution (env / TOML / default)
//! - Opaque identifier utilities

pub mod config;
pub mod error;
pub mod ids;

pub use error::{Error, Result};
