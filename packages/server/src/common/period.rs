//! Calendar-month reporting periods (UTC).

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` window covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportingPeriod {
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("Invalid reporting month: {}-{:02}", year, month))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| anyhow!("Reporting month out of range: {}-{:02}", year, month))?;

        Ok(Self {
            start: Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&next.and_time(chrono::NaiveTime::MIN)),
        })
    }

    /// The month containing `at`.
    pub fn containing(at: DateTime<Utc>) -> Result<Self> {
        Self::month(at.year(), at.month())
    }

    /// The last complete month before the one containing `at`.
    pub fn previous(at: DateTime<Utc>) -> Result<Self> {
        let (year, month) = if at.month() == 1 {
            (at.year() - 1, 12)
        } else {
            (at.year(), at.month() - 1)
        };
        Self::month(year, month)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    pub fn label(&self) -> String {
        format!("{}-{:02}", self.start.year(), self.start.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_rolls_into_next_year() {
        let period = ReportingPeriod::month(2025, 12).unwrap();
        assert_eq!(period.start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(period.end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(period.label(), "2025-12");
    }

    #[test]
    fn previous_of_january_is_last_december() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 2, 0, 0).unwrap();
        let period = ReportingPeriod::previous(at).unwrap();
        assert_eq!(period.label(), "2025-12");
        assert!(!period.contains(at));
    }

    #[test]
    fn end_is_exclusive() {
        let period = ReportingPeriod::month(2026, 2).unwrap();
        assert!(period.contains(period.start));
        assert!(!period.contains(period.end));
        assert_eq!(period.end, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_month_thirteen() {
        assert!(ReportingPeriod::month(2026, 13).is_err());
    }
}
