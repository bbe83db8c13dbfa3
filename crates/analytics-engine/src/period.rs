//! Analysis-period arithmetic: the lower time bound of a requested window
//! and the display label of a time-series bucket.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};

/// Accepted period selectors. Unrecognized input falls back to [`Period::Month`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "dia" => Period::Day,
            "semana" => Period::Week,
            "trimestre" => Period::Quarter,
            "ano" => Period::Year,
            _ => Period::Month,
        }
    }

    /// Lower bound of the analysis window ending at `now`.
    ///
    /// `Month` is not a calendar month: billing cycles close on the 5th, so
    /// the window opens on the 5th of the previous month once the current
    /// cycle has started (day >= 5), and on the 5th of two months back
    /// before that.
    pub fn lower_bound(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Day => now - Duration::days(1),
            Period::Week => now - Duration::days(7),
            Period::Quarter => now.checked_sub_months(Months::new(3)).unwrap_or(now),
            Period::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
            Period::Month => {
                let cycles_back = if now.day() >= 5 { 1 } else { 2 };
                let base = now
                    .checked_sub_months(Months::new(cycles_back))
                    .unwrap_or(now);
                Utc.with_ymd_and_hms(base.year(), base.month(), 5, 0, 0, 0)
                    .single()
                    .unwrap_or(base)
            }
        }
    }

    /// Bucket label controlling time-series granularity: hourly for a day,
    /// daily for a week or billing month, weekly for a quarter, monthly for
    /// a year. Labels are display strings; chronological order comes from
    /// the underlying timestamps, not from the labels.
    pub fn bucket_label(self, ts: DateTime<Utc>) -> String {
        match self {
            Period::Day => ts.format("%d/%m %H:00").to_string(),
            Period::Week | Period::Month => ts.format("%d/%m").to_string(),
            Period::Quarter => format!("{:02}/S{}", ts.month(), (ts.day() - 1) / 7 + 1),
            Period::Year => ts.format("%m/%Y").to_string(),
        }
    }
}
