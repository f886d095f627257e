use crate::Result;
use chrono::{DateTime, Months, NaiveDate, Utc};
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};

/// The half-open `[start, end)` analysis period of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            bail!("time window start ({start}) must be before its end ({end})");
        }

        Ok(Self { start, end })
    }

    /// Window covering whole days, from midnight of `start` to midnight of `end` (UTC).
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(start.and_time(chrono::NaiveTime::MIN).and_utc(), end.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Window ending at midnight (UTC) of the day containing `now` and spanning `months` calendar months.
    pub fn months_back(now: DateTime<Utc>, months: u32) -> Result<Self> {
        let end = now.date_naive();
        let start = end
            .checked_sub_months(Months::new(months))
            .into_app_err_with(|| format!("cannot go back {months} month(s) from {end}"))?;

        Self::from_dates(start, end)
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `instant` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Start formatted as an RFC 3339 timestamp, suitable for `since` query parameters.
    #[must_use]
    pub fn start_param(&self) -> String {
        self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    /// End formatted as an RFC 3339 timestamp, suitable for `until` query parameters.
    #[must_use]
    pub fn end_param(&self) -> String {
        self.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    /// Range in the search qualifier syntax used by the `created` filter.
    #[must_use]
    pub fn created_range_param(&self) -> String {
        format!("{}..{}", self.start_param(), self.end_param())
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} to {}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}
