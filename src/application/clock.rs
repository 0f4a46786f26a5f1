//! Source of "today" for lastmod fallbacks.

use chrono_tz::Tz;
use time::{Date, OffsetDateTime};

use crate::util::timezone::localized_date;

pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Wall clock, reporting the calendar date in the forum's timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        localized_date(OffsetDateTime::now_utc(), self.timezone)
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
