//! # Pipebot Common
//!
//! Shared types, utilities, and common functionality for Pipebot.
//!
//! This crate provides the identifier newtypes, the `Scope` matching
//! primitive, the injectable clock and the error and logging setup used
//! across all other crates in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PipebotError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use types::*;
pub use utils::*;
