//! # Pipebot
//!
//! Chat bot that runs prefixed commands through cooldown admission, user
//! filters and pipe chaining.
//!
//! This is the main binary crate. It wires the command core to a Discord
//! gateway connection and to a local console used during development.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod console;
pub mod discord;
pub mod error;
pub mod handler;

pub use bot::*;
pub use error::*;
pub use handler::MessageHandler;
