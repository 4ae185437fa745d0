//! Reporting periods derived from instance contexts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A reporting period: a point in time or a dated span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportingPeriod {
    /// Point-in-time period (balance sheet dates)
    Instant {
        /// The measurement date
        date: NaiveDate,
    },
    /// Span between two dates (income statement, cash flow periods)
    Duration {
        /// First day of the span
        start: NaiveDate,
        /// Last day of the span
        end: NaiveDate,
    },
}

/// Coarse classification of a duration by its length in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodClass {
    /// 350–380 days: a fiscal year
    Annual,
    /// 80–100 days: a fiscal quarter
    Quarterly,
    /// 170–190 or 260–290 days: a six- or nine-month year-to-date span
    YearToDate,
    /// Anything else, including instants
    Other,
}

impl ReportingPeriod {
    /// Stable string key: `instant_YYYY-MM-DD` or `duration_START_END`.
    pub fn key(&self) -> String {
        match self {
            Self::Instant { date } => format!("instant_{date}"),
            Self::Duration { start, end } => format!("duration_{start}_{end}"),
        }
    }

    /// Whether this is an instant period.
    pub const fn is_instant(&self) -> bool {
        matches!(self, Self::Instant { .. })
    }

    /// Whether this is a duration period.
    pub const fn is_duration(&self) -> bool {
        matches!(self, Self::Duration { .. })
    }

    /// The date a fact measured over this period refers to.
    pub const fn end_date(&self) -> NaiveDate {
        match self {
            Self::Instant { date } => *date,
            Self::Duration { end, .. } => *end,
        }
    }

    /// Length in days, inclusive of both endpoints; `None` for instants.
    pub fn duration_days(&self) -> Option<i64> {
        match self {
            Self::Instant { .. } => None,
            Self::Duration { start, end } => Some((*end - *start).num_days() + 1),
        }
    }

    /// Classify a duration by its length.
    pub fn classification(&self) -> PeriodClass {
        match self.duration_days() {
            Some(350..=380) => PeriodClass::Annual,
            Some(80..=100) => PeriodClass::Quarterly,
            Some(170..=190) | Some(260..=290) => PeriodClass::YearToDate,
            _ => PeriodClass::Other,
        }
    }

    /// Score how closely this period's end date matches a fiscal year end.
    ///
    /// 100 for an exact month+day match, 75 for the same month within 15
    /// days, 50 for an adjacent month within 15 days, 0 otherwise. Instants
    /// score against their own date.
    pub fn fiscal_alignment(&self, fye_month: u32, fye_day: u32) -> u8 {
        let end = self.end_date();
        if end.month() == fye_month && end.day() == fye_day {
            return 100;
        }
        let distance = month_day_distance(end.month(), end.day(), fye_month, fye_day);
        if end.month() == fye_month && distance <= 15 {
            return 75;
        }
        let month_gap = {
            let diff = (end.month() as i32 - fye_month as i32).rem_euclid(12);
            diff.min(12 - diff)
        };
        if month_gap == 1 && distance <= 15 {
            return 50;
        }
        0
    }

    /// Display label: `Dec 31, 2024` for instants, `FY 2024`-style callers
    /// build their own; durations render as the end date.
    pub fn label(&self) -> String {
        match self {
            Self::Instant { date } => date.format("%b %d, %Y").to_string(),
            Self::Duration { end, .. } => end.format("%b %d, %Y").to_string(),
        }
    }

    /// Fiscal year implied by the period end.
    ///
    /// 52/53-week calendars can end a fiscal year in the first days of
    /// January; period ends on Jan 1–7 are attributed to the prior year.
    pub fn implied_fiscal_year(&self) -> i32 {
        let end = self.end_date();
        if end.month() == 1 && end.day() <= 7 {
            end.year() - 1
        } else {
            end.year()
        }
    }
}

/// Circular distance in days between two (month, day) pairs, using a fixed
/// 365-day calendar.
fn month_day_distance(m1: u32, d1: u32, m2: u32, d2: u32) -> u32 {
    const CUM: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    let a = CUM[(m1 - 1) as usize] + d1;
    let b = CUM[(m2 - 1) as usize] + d2;
    let diff = a.abs_diff(b);
    diff.min(365 - diff)
}

/// Named preset selections over the periods available in an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodView {
    /// Two most recent annual durations
    AnnualComparison,
    /// Three most recent annual durations
    ThreeYearAnnualComparison,
    /// Two most recent periods of any kind
    CurrentVsPrevious,
    /// Most recent quarter and the same quarter one year earlier
    QuarterlyComparison,
    /// Three most recent periods of any kind
    ThreeRecentPeriods,
}

impl PeriodView {
    /// Look up a view by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Annual Comparison" => Some(Self::AnnualComparison),
            "Three-Year Annual Comparison" => Some(Self::ThreeYearAnnualComparison),
            "Current vs Previous" => Some(Self::CurrentVsPrevious),
            "Quarterly Comparison" => Some(Self::QuarterlyComparison),
            "Three Recent Periods" => Some(Self::ThreeRecentPeriods),
            _ => None,
        }
    }

    /// Display name of the view.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AnnualComparison => "Annual Comparison",
            Self::ThreeYearAnnualComparison => "Three-Year Annual Comparison",
            Self::CurrentVsPrevious => "Current vs Previous",
            Self::QuarterlyComparison => "Quarterly Comparison",
            Self::ThreeRecentPeriods => "Three Recent Periods",
        }
    }

    /// All defined views.
    pub const fn all() -> [Self; 5] {
        [
            Self::AnnualComparison,
            Self::ThreeYearAnnualComparison,
            Self::CurrentVsPrevious,
            Self::QuarterlyComparison,
            Self::ThreeRecentPeriods,
        ]
    }

    /// Resolve the view against a set of available periods.
    ///
    /// Returns period keys in most-recent-first order. Views that find no
    /// matching periods return an empty list; they never error.
    pub fn resolve(&self, periods: &[ReportingPeriod]) -> Vec<String> {
        let mut durations: Vec<&ReportingPeriod> =
            periods.iter().filter(|p| p.is_duration()).collect();
        durations.sort_by_key(|p| std::cmp::Reverse(p.end_date()));

        let mut recent: Vec<&ReportingPeriod> = periods.iter().collect();
        recent.sort_by_key(|p| std::cmp::Reverse(p.end_date()));

        match self {
            Self::AnnualComparison => take_annual(&durations, 2),
            Self::ThreeYearAnnualComparison => take_annual(&durations, 3),
            Self::CurrentVsPrevious => recent.iter().take(2).map(|p| p.key()).collect(),
            Self::ThreeRecentPeriods => recent.iter().take(3).map(|p| p.key()).collect(),
            Self::QuarterlyComparison => {
                let quarters: Vec<&&ReportingPeriod> = durations
                    .iter()
                    .filter(|p| p.classification() == PeriodClass::Quarterly)
                    .collect();
                let Some(current) = quarters.first() else {
                    return Vec::new();
                };
                let mut keys = vec![current.key()];
                let end = current.end_date();
                // same quarter one year earlier: end date within 15 days of
                // the anniversary
                if let Some(prior) = quarters.iter().skip(1).find(|p| {
                    let gap = (end - p.end_date()).num_days();
                    (350..=380).contains(&gap)
                }) {
                    keys.push(prior.key());
                }
                keys
            }
        }
    }
}

fn take_annual(durations: &[&ReportingPeriod], n: usize) -> Vec<String> {
    durations
        .iter()
        .filter(|p| p.classification() == PeriodClass::Annual)
        .take(n)
        .map(|p| p.key())
        .collect()
}
