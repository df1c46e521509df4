//! Time window resolution
//!
//! The portal expects `timestamp_from` / `timestamp_to` as epoch milliseconds
//! of *local* calendar times. Resolving in the wrong zone silently shifts the
//! whole requested window, so the zone is an explicit input.

use crate::downloader::config::ConfigError;
use chrono::{LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Zone the portal interprets request timestamps in
pub const PORTAL_TIME_ZONE: Tz = chrono_tz::Europe::Berlin;

/// Requested calendar window, `from` strictly before `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: NaiveDateTime,
    to: NaiveDateTime,
}

impl TimeWindow {
    /// Create a window
    ///
    /// # Errors
    /// Returns [`ConfigError::InvertedWindow`] unless `from < to`
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Result<Self, ConfigError> {
        if from >= to {
            return Err(ConfigError::InvertedWindow { from, to });
        }
        Ok(Self { from, to })
    }

    /// Window start
    pub fn from(&self) -> NaiveDateTime {
        self.from
    }

    /// Window end
    pub fn to(&self) -> NaiveDateTime {
        self.to
    }

    /// Convert both boundaries to epoch milliseconds in `zone`
    pub fn resolve(&self, zone: &WindowZone) -> ResolvedWindow {
        let (timestamp_from, timestamp_to) = match zone {
            WindowZone::Local => (
                local_to_epoch_millis(&chrono::Local, self.from),
                local_to_epoch_millis(&chrono::Local, self.to),
            ),
            WindowZone::Named(tz) => (
                local_to_epoch_millis(tz, self.from),
                local_to_epoch_millis(tz, self.to),
            ),
        };

        ResolvedWindow {
            timestamp_from,
            timestamp_to,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.from.format("%Y-%m-%d %H:%M"),
            self.to.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Window boundaries in the API's transport units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    /// Start, epoch milliseconds
    pub timestamp_from: i64,
    /// End, epoch milliseconds
    pub timestamp_to: i64,
}

/// Timezone used to interpret calendar boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowZone {
    /// Host timezone
    Local,
    /// Fixed IANA zone
    Named(Tz),
}

impl Default for WindowZone {
    fn default() -> Self {
        WindowZone::Named(PORTAL_TIME_ZONE)
    }
}

impl fmt::Display for WindowZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowZone::Local => write!(f, "local"),
            WindowZone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl FromStr for WindowZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            return Ok(WindowZone::Local);
        }
        Tz::from_str(s)
            .map(WindowZone::Named)
            .map_err(|e| format!("Invalid timezone '{s}': {e}"))
    }
}

/// Epoch milliseconds of a local calendar time
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// DST gap are moved forward by one hour.
pub fn local_to_epoch_millis<Z: TimeZone>(zone: &Z, at: NaiveDateTime) -> i64 {
    match zone.from_local_datetime(&at) {
        LocalResult::Single(dt) => dt.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => {
            let shifted = at + chrono::Duration::hours(1);
            zone.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.timestamp_millis())
                .unwrap_or_else(|| at.and_utc().timestamp_millis())
        }
    }
}
