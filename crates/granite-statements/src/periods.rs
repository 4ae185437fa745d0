//! Period selection for statement display.
//!
//! Given a statement type, the filing's fiscal metadata, and the periods
//! available in the instance, picks the columns a statement should show.
//! Balance sheets select instants; duration statements bucket by length and
//! score fiscal alignment against the declared fiscal year end. Filers that
//! recently changed fiscal year end can have transition periods falling
//! outside the annual window; selection then falls back to recency and
//! records the fallback rather than returning nothing.

use chrono::Datelike;
use granite_xbrl::{FiscalMetadata, FiscalPeriod, ReportingPeriod, StatementType};
use tracing::debug;

/// Default maximum number of columns a statement displays.
const DEFAULT_MAX_PERIODS: usize = 3;

/// The annual duration window in days.
const ANNUAL_DAYS: std::ops::RangeInclusive<i64> = 350..=380;

/// The outcome of period selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSelection {
    /// Selected period keys, most recent first
    pub keys: Vec<String>,
    /// Set when the annual window found nothing and selection fell back to
    /// the most recent durations
    pub fallback: bool,
}

impl PeriodSelection {
    fn from_keys(keys: Vec<String>) -> Self {
        Self {
            keys,
            fallback: false,
        }
    }
}

/// Select the periods a statement should display.
///
/// Never returns an empty list when any period of the right kind exists;
/// when no period is selectable at all the list is empty and the caller
/// renders an empty statement rather than an error.
pub fn select_periods(
    statement: StatementType,
    metadata: &FiscalMetadata,
    periods: &[ReportingPeriod],
    max_periods: Option<usize>,
) -> PeriodSelection {
    let max = max_periods.unwrap_or(DEFAULT_MAX_PERIODS);
    let focus = metadata.period_focus();

    let mut instants: Vec<&ReportingPeriod> = periods.iter().filter(|p| p.is_instant()).collect();
    instants.sort_by_key(|p| std::cmp::Reverse(p.end_date()));
    let mut durations: Vec<&ReportingPeriod> =
        periods.iter().filter(|p| p.is_duration()).collect();
    durations.sort_by_key(|p| std::cmp::Reverse(p.end_date()));

    match statement {
        StatementType::BalanceSheet | StatementType::Parenthetical => {
            select_instants(&instants, focus, max)
        }
        StatementType::IncomeStatement
        | StatementType::CashFlow
        | StatementType::Equity
        | StatementType::ComprehensiveIncome => {
            select_durations(&durations, metadata, focus, max)
        }
        StatementType::Cover | StatementType::Notes => {
            let pick = instants.first().or_else(|| durations.first());
            PeriodSelection::from_keys(pick.map(|p| p.key()).into_iter().collect())
        }
        StatementType::Other => {
            let n = if focus.is_some_and(|f| f.is_annual()) {
                2
            } else {
                1
            };
            PeriodSelection::from_keys(durations.iter().take(n).map(|p| p.key()).collect())
        }
    }
}

/// Balance-sheet selection: the latest instant, a comparison instant from
/// the preceding fiscal year, and optionally one further prior year end.
fn select_instants(
    instants: &[&ReportingPeriod],
    focus: Option<FiscalPeriod>,
    max: usize,
) -> PeriodSelection {
    let Some(current) = instants.first() else {
        return PeriodSelection::default();
    };
    let mut keys = vec![current.key()];

    let mut anchor = **current;
    while keys.len() < max.min(if focus.is_some_and(|f| f.is_annual()) { 3 } else { 2 }) {
        let Some(prior) = comparison_instant(&anchor, instants) else {
            break;
        };
        keys.push(prior.key());
        anchor = *prior;
    }
    PeriodSelection::from_keys(keys)
}

/// The instant in the fiscal year preceding `anchor` whose month/day is
/// closest to the anchor's.
fn comparison_instant<'a>(
    anchor: &ReportingPeriod,
    instants: &[&'a ReportingPeriod],
) -> Option<&'a ReportingPeriod> {
    let anchor_date = anchor.end_date();
    instants
        .iter()
        .filter(|p| {
            let gap = (anchor_date - p.end_date()).num_days();
            (250..=480).contains(&gap)
        })
        .min_by_key(|p| {
            let probe = ReportingPeriod::Instant {
                date: p.end_date(),
            };
            // alignment score is higher-is-better; invert for min_by_key
            (
                100 - probe.fiscal_alignment(anchor_date.month(), anchor_date.day()) as i32,
                (anchor_date - p.end_date()).num_days().abs(),
            )
        })
        .copied()
}

/// Duration selection for income, cash flow, equity, and comprehensive
/// statements.
fn select_durations(
    durations: &[&ReportingPeriod],
    metadata: &FiscalMetadata,
    focus: Option<FiscalPeriod>,
    max: usize,
) -> PeriodSelection {
    if durations.is_empty() {
        return PeriodSelection::default();
    }

    if focus.is_some_and(|f| f.is_annual()) {
        let annual: Vec<&&ReportingPeriod> = durations
            .iter()
            .filter(|p| p.duration_days().is_some_and(|d| ANNUAL_DAYS.contains(&d)))
            .collect();
        if annual.is_empty() {
            // fiscal-year-change transition periods land here
            debug!("no duration in the annual window; falling back to recency");
            return PeriodSelection {
                keys: durations.iter().take(max).map(|p| p.key()).collect(),
                fallback: true,
            };
        }

        let fye = metadata.fiscal_year_end.or_else(|| {
            // no declared year end: align against the latest duration's end
            annual
                .first()
                .map(|p| (p.end_date().month(), p.end_date().day()))
        });
        let mut scored: Vec<(u8, &&ReportingPeriod)> = annual
            .into_iter()
            .map(|p| {
                let score = fye.map_or(0, |(m, d)| p.fiscal_alignment(m, d));
                (score, p)
            })
            .collect();
        scored.sort_by_key(|(score, p)| (std::cmp::Reverse(*score), std::cmp::Reverse(p.end_date())));
        return PeriodSelection::from_keys(
            scored.iter().take(max).map(|(_, p)| p.key()).collect(),
        );
    }

    // quarterly (and unknown) focus: most recent durations unchanged; two
    // columns is the expected shape for a 10-Q carrying only the current
    // quarter and year-to-date
    PeriodSelection::from_keys(durations.iter().take(max).map(|p| p.key()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn duration(y1: i32, m1: u32, d1: u32, y2: i32, m2: u32, d2: u32) -> ReportingPeriod {
        ReportingPeriod::Duration {
            start: date(y1, m1, d1),
            end: date(y2, m2, d2),
        }
    }

    fn instant(y: i32, m: u32, d: u32) -> ReportingPeriod {
        ReportingPeriod::Instant {
            date: date(y, m, d),
        }
    }

    fn metadata(focus: Option<FiscalPeriod>, fye: Option<(u32, u32)>) -> FiscalMetadata {
        FiscalMetadata {
            form_type: "10-K".to_string(),
            fiscal_period_focus: focus,
            fiscal_year_end: fye,
            ..FiscalMetadata::default()
        }
    }

    #[test]
    fn test_balance_sheet_two_instants() {
        let periods = vec![
            instant(2024, 12, 31),
            instant(2023, 12, 31),
            instant(2024, 6, 30),
        ];
        let selection = select_periods(
            StatementType::BalanceSheet,
            &metadata(Some(FiscalPeriod::FY), Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(
            selection.keys,
            vec!["instant_2024-12-31", "instant_2023-12-31"]
        );
        assert!(!selection.fallback);
    }

    #[test]
    fn test_balance_sheet_comparison_prefers_matching_month_day() {
        // the June instant is closer in days but the December one matches
        // the anchor's month/day pattern
        let periods = vec![
            instant(2024, 12, 31),
            instant(2024, 2, 29),
            instant(2023, 12, 31),
        ];
        let selection = select_periods(
            StatementType::BalanceSheet,
            &metadata(Some(FiscalPeriod::FY), Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(selection.keys[1], "instant_2023-12-31");
    }

    #[test]
    fn test_annual_focus_keeps_annual_window() {
        let periods = vec![
            duration(2024, 1, 1, 2024, 12, 31),
            duration(2024, 10, 1, 2024, 12, 31),
            duration(2023, 1, 1, 2023, 12, 31),
            duration(2022, 1, 1, 2022, 12, 31),
            duration(2021, 1, 1, 2021, 12, 31),
        ];
        let selection = select_periods(
            StatementType::IncomeStatement,
            &metadata(Some(FiscalPeriod::FY), Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(
            selection.keys,
            vec![
                "duration_2024-01-01_2024-12-31",
                "duration_2023-01-01_2023-12-31",
                "duration_2022-01-01_2022-12-31",
            ]
        );
        assert!(!selection.fallback);
    }

    #[test]
    fn test_june_fiscal_year_end_prefers_aligned_duration() {
        // July–June scores 100 against a June 30 year end; the calendar
        // year scores 0 and loses despite ending later
        let periods = vec![
            duration(2024, 1, 1, 2024, 12, 31),
            duration(2023, 7, 1, 2024, 6, 30),
            duration(2022, 7, 1, 2023, 6, 30),
        ];
        let selection = select_periods(
            StatementType::IncomeStatement,
            &metadata(Some(FiscalPeriod::FY), Some((6, 30))),
            &periods,
            None,
        );
        assert_eq!(selection.keys[0], "duration_2023-07-01_2024-06-30");
        assert_eq!(selection.keys[1], "duration_2022-07-01_2023-06-30");
    }

    #[test]
    fn test_quarterly_two_durations_is_two_columns() {
        let periods = vec![
            duration(2024, 7, 1, 2024, 9, 30),
            duration(2024, 1, 1, 2024, 9, 30),
        ];
        let selection = select_periods(
            StatementType::IncomeStatement,
            &metadata(Some(FiscalPeriod::Q3), Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(
            selection.keys,
            vec![
                "duration_2024-07-01_2024-09-30",
                "duration_2024-01-01_2024-09-30",
            ]
        );
    }

    #[test]
    fn test_fiscal_year_change_falls_back_with_annotation() {
        // a 7-month transition period only
        let periods = vec![duration(2023, 6, 1, 2023, 12, 31)];
        let selection = select_periods(
            StatementType::IncomeStatement,
            &metadata(Some(FiscalPeriod::FY), Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(selection.keys, vec!["duration_2023-06-01_2023-12-31"]);
        assert!(selection.fallback);
    }

    #[test]
    fn test_no_periods_returns_empty_not_error() {
        let selection = select_periods(
            StatementType::IncomeStatement,
            &metadata(Some(FiscalPeriod::FY), Some((12, 31))),
            &[],
            None,
        );
        assert!(selection.keys.is_empty());
    }

    #[rstest]
    #[case(Some(FiscalPeriod::FY), 2)]
    #[case(Some(FiscalPeriod::Q2), 1)]
    fn test_other_statement_counts(#[case] focus: Option<FiscalPeriod>, #[case] expected: usize) {
        let periods = vec![
            duration(2024, 1, 1, 2024, 12, 31),
            duration(2023, 1, 1, 2023, 12, 31),
        ];
        let selection = select_periods(
            StatementType::Other,
            &metadata(focus, Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(selection.keys.len(), expected);
    }

    #[test]
    fn test_cover_takes_single_most_recent_instant() {
        let periods = vec![
            instant(2024, 12, 31),
            instant(2023, 12, 31),
            duration(2024, 1, 1, 2024, 12, 31),
        ];
        let selection = select_periods(
            StatementType::Cover,
            &metadata(Some(FiscalPeriod::FY), Some((12, 31))),
            &periods,
            None,
        );
        assert_eq!(selection.keys, vec!["instant_2024-12-31"]);
    }
}
