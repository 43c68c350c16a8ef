//! Common type definitions and newtype wrappers for domain modeling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the application.
pub type Timestamp = DateTime<Utc>;

/// A chat channel ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat user ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat platform ID (Discord, console, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformId(pub u64);

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user as seen by a platform adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Platform-unique user ID.
    pub id: UserId,
    /// Display name used when addressing the user.
    pub name: String,
}

impl User {
    /// Creates a new user.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One dimension of a cooldown or filter key.
///
/// `Any` is an explicit wildcard: for cooldowns it matches every value in
/// the dimension, for filter rules it marks the rule as global in that
/// dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope<T> {
    /// Matches any value.
    Any,
    /// Matches exactly this value.
    Exact(T),
}

impl<T: PartialEq> Scope<T> {
    /// Returns whether this scope admits `value`.
    ///
    /// A missing value (e.g. a private message has no channel) is only
    /// admitted by `Any`.
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => value == Some(expected),
        }
    }
}

impl<T> Scope<T> {
    /// Returns true for the wildcard scope.
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl<T> From<Option<T>> for Scope<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Any, Self::Exact)
    }
}

impl<T: fmt::Display> fmt::Display for Scope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Exact(value) => write!(f, "{value}"),
        }
    }
}
