//! # Pipebot Commands
//!
//! The command admission and execution pipeline.
//!
//! Every chat invocation passes through the [`CommandDispatcher`]: the
//! command is resolved in the [`CommandRegistry`], admitted by the
//! [`CooldownStore`] and the [`FilterRegistry`], run, and its cooldown is
//! committed. The [`PipeExecutor`] chains several invocations, feeding the
//! reply of each stage into the next.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod builtin;
pub mod context;
pub mod cooldown;
pub mod definition;
pub mod directory;
pub mod dispatcher;
pub mod filter;
pub mod outcome;
pub mod permissions;
pub mod pipe;
pub mod registry;
pub mod storage;

pub use context::{spawn_prune_task, Context, ExecuteOptions, Invocation};
pub use cooldown::{Admission, Cooldown, CooldownStore, Pending, PendingGuard};
pub use definition::{
    CommandBehavior, CommandDefinition, CommandFlags, CooldownDimension, CooldownOverride,
    CooldownSpec, Permission, RawResult,
};
pub use directory::UserDirectory;
pub use dispatcher::CommandDispatcher;
pub use filter::{
    FilterError, FilterId, FilterKey, FilterKind, FilterPatch, FilterRegistry, FilterRule,
};
pub use outcome::{Outcome, ReasonCode};
pub use permissions::Permissions;
pub use pipe::{PipeError, PipeExecutor, PipePlan};
pub use registry::CommandRegistry;
pub use storage::{FilterStore, MemoryFilterStore, SledFilterStore};
