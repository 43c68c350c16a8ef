//! # Pipebot Config
//!
//! Type-safe configuration management for Pipebot.
//!
//! This crate provides the configuration schema with defaults for every
//! section, YAML loading with environment variable overrides, and
//! validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
