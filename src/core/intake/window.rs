//! Discovery window resolution

use crate::domain::{FormbridgeError, Result};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Time range searched for newly approved requisitions
///
/// A requisition qualifies when it started at or after `start` and its last
/// action happened before `end`. A missing `start` leaves the range open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscoveryWindow {
    pub start: Option<NaiveDateTime>,
    pub end: NaiveDateTime,
}

impl DiscoveryWindow {
    /// Resolve configured bounds against `now`
    ///
    /// An explicit start wins over `lookback_days`; the end defaults to `now`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the resolved start is not before the end.
    pub fn resolve(
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        lookback_days: Option<u32>,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let end = end.unwrap_or(now);
        let start = start.or_else(|| lookback_days.map(|days| now - Duration::days(i64::from(days))));

        if let Some(start) = start {
            if start >= end {
                return Err(FormbridgeError::Validation(format!(
                    "discovery window start {start} is not before end {end}"
                )));
            }
        }

        Ok(Self { start, end })
    }

    pub fn contains(&self, time_start: NaiveDateTime, time_last_action: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| time_start >= s) && time_last_action < self.end
    }
}

impl fmt::Display for DiscoveryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start {
            Some(start) => write!(f, "[{start}, {})", self.end),
            None => write!(f, "(open, {})", self.end),
        }
    }
}
