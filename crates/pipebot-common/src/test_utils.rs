//! Test utilities and shared test helpers for Pipebot.
//!
//! Fixtures, a manual clock factory and proptest strategies that the other
//! crates pull in through the `testing` feature.

use crate::{ManualClock, Timestamp};
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Once};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Test fixture for creating a fixed timestamp.
pub fn mock_timestamp(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .unwrap()
}

/// Manual clock frozen at 2024-01-01 12:00:00 UTC.
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(mock_timestamp(2024, 1, 1, 12, 0, 0)))
}

/// Chat-related fixtures.
pub mod chat_fixtures {
    use crate::{ChannelId, PlatformId, User};

    /// The invoking user in most tests.
    pub fn alice() -> User {
        User::new(1001, "alice")
    }

    /// A second user, usually the target.
    pub fn bob() -> User {
        User::new(1002, "bob")
    }

    /// A third user.
    pub fn carol() -> User {
        User::new(1003, "carol")
    }

    /// Primary test channel.
    pub fn channel_a() -> ChannelId {
        ChannelId(501)
    }

    /// Secondary test channel.
    pub fn channel_b() -> ChannelId {
        ChannelId(502)
    }

    /// Test platform.
    pub fn platform() -> PlatformId {
        PlatformId(7)
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use crate::{ChannelId, Scope, UserId};
    use proptest::prelude::*;

    /// Small channel domain so generated entries collide with queries.
    pub fn channel_id_strategy() -> impl Strategy<Value = ChannelId> {
        (1u64..=3).prop_map(ChannelId)
    }

    /// Small user domain.
    pub fn user_id_strategy() -> impl Strategy<Value = UserId> {
        (1u64..=3).prop_map(UserId)
    }

    /// Small command-name domain.
    pub fn command_strategy() -> impl Strategy<Value = String> {
        prop_oneof![Just("say".to_string()), Just("ping".to_string()), Just("pipe".to_string())]
    }

    /// Wraps a strategy so that roughly a third of values are `Scope::Any`.
    pub fn scope_strategy<T: std::fmt::Debug + Clone + 'static>(
        inner: impl Strategy<Value = T> + 'static,
    ) -> impl Strategy<Value = Scope<T>> {
        prop_oneof![
            1 => Just(Scope::Any),
            2 => inner.prop_map(Scope::Exact),
        ]
    }
}
