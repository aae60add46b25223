//! Typed configuration for the Laminar middleware engine.
//!
//! This crate provides the standing options of the engine and the logging
//! setup, with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! Middleware entries are never described here; collaborators register them
//! with the engine in code.
//!
//! # Example
//!
//! ```no_run
//! use laminar_config::{ConfigLoader, EngineConfig};
//!
//! # fn main() -> Result<(), laminar_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("laminar.toml")?
//!     .with_env_prefix("LAMINAR")
//!     .load()?;
//!
//! println!("tracing enabled: {}", config.engine.enable_trace);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [engine]
//! enable_trace = true
//! continue_on_error = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `LAMINAR__ENGINE__ENABLE_TRACE=true`
//! - `LAMINAR__ENGINE__CONTINUE_ON_ERROR=false`
//! - `LAMINAR__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use crate::config::*;
pub use crate::error::ConfigError;
pub use crate::loader::ConfigLoader;
pub use crate::schema::*;
