//! Whole-second Unix timestamps.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the Unix epoch, UTC. Sub-second precision is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(i64);

impl UnixTimestamp {
    /// Creates a timestamp from epoch seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Creates a timestamp from a UTC instant, truncating sub-seconds.
    #[must_use]
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant.timestamp())
    }

    /// Returns the current time according to `clock`.
    #[must_use]
    pub fn now(clock: &impl Clock) -> Self {
        Self::from_datetime(clock.utc())
    }

    /// Returns the epoch seconds.
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Converts back into a UTC instant.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.0, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Returns this timestamp shifted by `secs` seconds, saturating.
    #[must_use]
    pub const fn plus_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Returns the signed number of seconds from `self` until `later`.
    #[must_use]
    pub const fn secs_until(self, later: Self) -> i64 {
        later.0.saturating_sub(self.0)
    }
}

impl From<DateTime<Utc>> for UnixTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_datetime(instant)
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::UnixTimestamp;
    use chrono::{TimeZone, Timelike, Utc};

    #[test]
    fn from_datetime_truncates_subseconds() {
        let instant = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 5)
            .single()
            .and_then(|dt| dt.with_nanosecond(750_000_000))
            .expect("valid instant");

        let stamp = UnixTimestamp::from_datetime(instant);

        assert_eq!(stamp.to_datetime().nanosecond(), 0);
        assert_eq!(stamp.to_datetime().second(), 5);
    }

    #[test]
    fn secs_until_is_signed() {
        let earlier = UnixTimestamp::from_secs(100);
        let later = UnixTimestamp::from_secs(160);
        assert_eq!(earlier.secs_until(later), 60);
        assert_eq!(later.secs_until(earlier), -60);
    }
}
