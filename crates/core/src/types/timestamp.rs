//! Backend timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// A point in time as the backend reports it: nanoseconds since the Unix
/// epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Wrap a nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since the Unix epoch.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Convert a UTC date-time. Instants before the epoch clamp to zero.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_nanos_opt().map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }

    /// Convert to a UTC date-time.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.0 / NANOS_PER_SECOND).unwrap_or(i64::MAX);
        #[allow(clippy::cast_possible_truncation)]
        let nanos = (self.0 % NANOS_PER_SECOND) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }

    /// Calendar date in `YYYY-MM-DD` form, as shown in reports.
    #[must_use]
    pub fn date_string(&self) -> String {
        self.to_datetime().format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_date_string() {
        // 2024-03-15T10:30:00Z
        let ts = Timestamp::from_nanos(1_710_498_600 * NANOS_PER_SECOND);
        assert_eq!(ts.date_string(), "2024-03-15");
    }

    #[test]
    fn test_epoch() {
        assert_eq!(Timestamp::from_nanos(0).date_string(), "1970-01-01");
    }

    #[test]
    fn test_datetime_conversion_keeps_nanos() {
        let ts = Timestamp::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(Timestamp::from_datetime(ts.to_datetime()), ts);
    }
}
