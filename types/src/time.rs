//! Timestamp type used throughout the ledger.
//!
//! Timestamps are Unix epoch seconds (UTC). The ledger never reads the wall
//! clock itself; the commit time of every transaction is supplied by the caller.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::TypeError;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    ///
    /// A clock set before the Unix epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    fn to_datetime(self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// RFC 3339 rendering, e.g. `2024-06-01T08:30:00Z`.
    pub fn to_rfc3339(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            None => self.to_string(),
        }
    }

    /// Calendar date only, e.g. `2024-06-01`.
    pub fn to_date_string(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.format("%Y-%m-%d").to_string(),
            None => self.to_string(),
        }
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    /// Accepts epoch seconds, a calendar date (`2024-06-01`, midnight UTC)
    /// or an RFC 3339 date-time.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<u64>() {
            return Ok(Self(secs));
        }
        let secs = if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp())
        } else {
            DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp())
        };
        secs.and_then(|secs| u64::try_from(secs).ok())
            .map(Self)
            .ok_or_else(|| TypeError::InvalidTimestamp(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_calendar_forms() {
        let ts = Timestamp::new(1_717_230_600);
        assert_eq!(ts.to_rfc3339(), "2024-06-01T08:30:00Z");
        assert_eq!(ts.to_date_string(), "2024-06-01");
    }

    #[test]
    fn parses_dates_and_seconds() {
        assert_eq!("1717200000".parse::<Timestamp>(), Ok(Timestamp::new(1_717_200_000)));
        assert_eq!("2024-06-01".parse::<Timestamp>(), Ok(Timestamp::new(1_717_200_000)));
        assert_eq!(
            "2024-06-01T08:30:00Z".parse::<Timestamp>(),
            Ok(Timestamp::new(1_717_230_600))
        );
        assert!("1969-12-31".parse::<Timestamp>().is_err());
        assert!("yesterday".parse::<Timestamp>().is_err());
    }

    #[test]
    fn elapsed_saturates() {
        let earlier = Timestamp::new(100);
        assert_eq!(earlier.elapsed_since(Timestamp::new(160)), 60);
        assert_eq!(Timestamp::new(200).elapsed_since(earlier), 0);
    }
}
