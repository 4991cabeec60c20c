//! Utilities for telling time
//!
//! Token expiry is decided against a [`Clock`] rather than reading the system
//! time directly, so that expiry decisions can be pinned to a known instant in
//! tests with a [`TestClock`].

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{ops, sync::Arc, time::SystemTime};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unix time
///
/// Unix time as represented by the number of seconds elapsed since the
/// beginning of the Unix epoch on 1970/01/01 at 00:00:00 UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

impl From<SystemTime> for UnixTime {
    /// Times before the epoch saturate to the epoch itself
    #[inline]
    fn from(t: SystemTime) -> Self {
        let time = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        UnixTime(time)
    }
}

/// A span of whole seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct DurationSecs(pub u64);

impl From<DurationSecs> for std::time::Duration {
    #[inline]
    fn from(d: DurationSecs) -> Self {
        std::time::Duration::from_secs(d.0)
    }
}

impl ops::Add<DurationSecs> for UnixTime {
    type Output = UnixTime;

    #[inline]
    fn add(self, rhs: DurationSecs) -> Self::Output {
        UnixTime(self.0.saturating_add(rhs.0))
    }
}

impl ops::Sub<DurationSecs> for UnixTime {
    type Output = UnixTime;

    #[inline]
    fn sub(self, rhs: DurationSecs) -> Self::Output {
        UnixTime(self.0.saturating_sub(rhs.0))
    }
}

impl ops::Sub for UnixTime {
    type Output = DurationSecs;

    /// Saturates to zero if `rhs` is later than `self`
    #[inline]
    fn sub(self, rhs: UnixTime) -> Self::Output {
        DurationSecs(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(any(feature = "serde", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl Serialize for UnixTime {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(any(feature = "serde", doc))]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<'de> Deserialize<'de> for UnixTime {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = u64::deserialize(deserializer)?;
        Ok(Self(s))
    }
}

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> UnixTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}

/// The system clock as provided by `std::time::SystemTime`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A test clock which maintains the current time as internal state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// Creates a new test clock with the specified time
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Updates the clock's current time to `val`
    pub fn set(&mut self, val: UnixTime) {
        self.0 = val;
    }

    /// Increments the clock's current time by `inc` seconds
    pub fn inc(&mut self, inc: u64) {
        (self.0).0 = (self.0).0.saturating_add(inc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_increment_saturates() {
        let mut clock = TestClock::new(UnixTime(u64::MAX - 1));
        clock.inc(10);
        assert_eq!(clock.now(), UnixTime(u64::MAX));
    }

    #[test]
    fn times_before_epoch_saturate() {
        let before = SystemTime::UNIX_EPOCH - std::time::Duration::from_secs(10);
        assert_eq!(UnixTime::from(before), UnixTime(0));
    }

    #[test]
    fn subtracting_a_later_time_saturates_to_zero() {
        assert_eq!(UnixTime(10) - UnixTime(30), DurationSecs(0));
        assert_eq!(UnixTime(30) - UnixTime(10), DurationSecs(20));
    }

    #[test]
    fn test_clock_advances_only_when_told() {
        let mut clock = TestClock::new(UnixTime(1_000));
        assert_eq!(clock.now(), UnixTime(1_000));
        clock.inc(5);
        assert_eq!(clock.now(), UnixTime(1_005));
        clock.set(UnixTime(7));
        assert_eq!((&clock).now(), UnixTime(7));
    }

    #[test]
    fn shared_clocks_delegate() {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(TestClock::new(UnixTime(42)));
        assert_eq!(clock.now(), UnixTime(42));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn unix_time_serializes_as_bare_seconds() {
        let json = serde_json::to_string(&UnixTime(1_700_000_000)).unwrap();
        assert_eq!(json, "1700000000");
        let back: UnixTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UnixTime(1_700_000_000));
    }
}
