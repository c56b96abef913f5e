//! Calendar date ranges for analysis requests.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Wire format for dates: `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar date range.
///
/// Serialized as `["YYYY-MM-DD", "YYYY-MM-DD"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 2]", into = "[String; 2]")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateParseError> {
        if start > end {
            return Err(DateParseError::Reversed {
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateParseError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Default analysis period.
    pub fn default_period() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 10, 2).unwrap_or_default(),
        }
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// Number of days covered, inclusive of both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The year preceding `start`: `[start - 365d, start - 1d]`.
    ///
    /// Used as the historical pattern window for personalized outlooks.
    pub fn preceding_year(&self) -> Self {
        Self {
            start: self.start - Duration::days(365),
            end: self.start - Duration::days(1),
        }
    }

    /// CMR `temporal` query value covering whole days in UTC.
    pub fn to_temporal_query(&self) -> String {
        format!(
            "{}T00:00:00Z,{}T23:59:59Z",
            self.start_str(),
            self.end_str()
        )
    }
}

impl TryFrom<[String; 2]> for DateRange {
    type Error = DateParseError;

    fn try_from(v: [String; 2]) -> Result<Self, Self::Error> {
        Self::parse(&v[0], &v[1])
    }
}

impl From<DateRange> for [String; 2] {
    fn from(r: DateRange) -> Self {
        [r.start_str(), r.end_str()]
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

/// Parse a single `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| DateParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DateParseError {
    #[error("Invalid date: {0}. Expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("Start date {start} is after end date {end}")]
    Reversed { start: String, end: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let range = DateRange::parse("2025-09-01", "2025-10-02").unwrap();
        assert_eq!(range, DateRange::default_period());
        assert_eq!(range.days(), 32);
    }

    #[test]
    fn test_rejects_bad_format() {
        assert!(matches!(
            DateRange::parse("2025/09/01", "2025-10-02"),
            Err(DateParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_preceding_year() {
        let range = DateRange::parse("2025-03-01", "2025-03-31").unwrap();
        let window = range.preceding_year();
        assert_eq!(window.start_str(), "2024-03-01");
        assert_eq!(window.end_str(), "2025-02-28");
    }
}
