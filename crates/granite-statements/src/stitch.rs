//! Multi-filing stitching.
//!
//! Merges statements from several filings of one entity into a single wide
//! view. Periods appearing in more than one filing deduplicate toward the
//! authoritative source: the filing where the period is primary, then the
//! filing with more populated facts, then the latest filing date. Fiscal
//! year labels from the SEC feed are sanity-checked against the period end
//! so the same 52/53-week period never appears under two different years.

use crate::builder::{StatementOptions, build_statement};
use crate::error::{Result, StatementError};
use crate::resolver::StatementCatalog;
use crate::statement::{ColumnProvenance, Statement, StatementColumn, StatementLine};
use chrono::Datelike;
use granite_xbrl::{ParseWarning, ParsedFiling, PeriodClass, ReportingPeriod, StatementType};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A filing with its resolved statement catalog, ready to stitch.
#[derive(Debug, Clone, Copy)]
pub struct Prepared<'a> {
    /// The parsed filing
    pub filing: &'a ParsedFiling,
    /// Its resolved statement catalog
    pub catalog: &'a StatementCatalog,
}

/// One candidate source for a stitched column.
#[derive(Debug)]
struct Candidate {
    filing_idx: usize,
    column_idx: usize,
    period: ReportingPeriod,
    is_primary: bool,
    completeness: usize,
}

/// Stitch one statement type across several filings of the same entity.
///
/// `filings` is ordered oldest→newest; `None` entries are pre-XBRL filings
/// and are silently skipped. Filings whose statement cannot be built are
/// skipped with a warning on the result.
///
/// # Errors
/// [`StatementError::EntityMismatch`] when inputs span different CIKs, and
/// [`StatementError::NoFilings`] when nothing stitchable remains.
pub fn stitch_statements(
    filings: &[Option<Prepared<'_>>],
    statement_type: StatementType,
    options: &StatementOptions,
) -> Result<Statement> {
    let prepared: Vec<Prepared<'_>> = filings.iter().flatten().copied().collect();
    if prepared.is_empty() {
        return Err(StatementError::NoFilings(
            "every input was a pre-XBRL filing",
        ));
    }

    let expected_cik = normalize_cik(&prepared[0].filing.metadata().cik);
    for p in &prepared[1..] {
        let cik = normalize_cik(&p.filing.metadata().cik);
        if cik != expected_cik {
            return Err(StatementError::EntityMismatch {
                expected: expected_cik,
                actual: cik,
            });
        }
    }

    // build each filing's statement independently
    let mut warnings: Vec<ParseWarning> = Vec::new();
    let mut statements: Vec<(Prepared<'_>, Statement)> = Vec::new();
    for p in prepared {
        let statement = build_statement(p.filing, p.catalog, statement_type, options);
        if statement.is_empty() {
            let reason = statement
                .reason
                .unwrap_or_else(|| "statement could not be built".to_string());
            warn!(accession = %p.filing.metadata().accession, %reason, "skipping filing");
            warnings.push(ParseWarning::FilingSkipped {
                accession: p.filing.metadata().accession.clone(),
                reason,
            });
            continue;
        }
        statements.push((p, statement));
    }
    if statements.is_empty() {
        let mut empty = Statement::empty(statement_type, "no filing produced this statement");
        empty.warnings = warnings;
        return Ok(empty);
    }

    // collect column candidates keyed by period end and shape
    let mut groups: HashMap<(chrono::NaiveDate, bool, PeriodClass), Vec<Candidate>> =
        HashMap::new();
    for (filing_idx, (p, statement)) in statements.iter().enumerate() {
        let metadata = p.filing.metadata();
        for (column_idx, column) in statement.columns.iter().enumerate() {
            let Some(period) = p.filing.store().period_by_key(&column.period_key).copied()
            else {
                continue;
            };
            let completeness = statement
                .lines
                .iter()
                .filter(|l| l.values.get(column_idx).copied().flatten().is_some())
                .count();
            groups
                .entry((
                    period.end_date(),
                    period.is_instant(),
                    period.classification(),
                ))
                .or_default()
                .push(Candidate {
                    filing_idx,
                    column_idx,
                    period,
                    is_primary: metadata.period_of_report == Some(period.end_date()),
                    completeness,
                });
        }
    }

    // pick the authoritative candidate per period
    let mut chosen: Vec<Candidate> = Vec::new();
    for (_, mut candidates) in groups {
        candidates.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(b.completeness.cmp(&a.completeness))
                .then_with(|| {
                    let date = |c: &Candidate| statements[c.filing_idx].0.filing.metadata().filing_date;
                    date(b).cmp(&date(a))
                })
                .then(b.filing_idx.cmp(&a.filing_idx))
        });
        if candidates.len() > 1 && candidates[1].is_primary == candidates[0].is_primary {
            let winner = &candidates[0];
            debug!(period = %winner.period.key(), "stitch tiebreak ran");
            warnings.push(ParseWarning::StitchConflict {
                period_key: winner.period.key(),
                resolution: format!(
                    "kept {} (completeness {}, then latest filing date)",
                    statements[winner.filing_idx].0.filing.metadata().accession,
                    winner.completeness
                ),
            });
        }
        chosen.push(candidates.into_iter().next().expect("non-empty group"));
    }
    chosen.sort_by_key(|c| (c.period.end_date(), c.period.is_duration()));

    // union line items, anchored on the newest filing's ordering
    let newest_idx = statements.len() - 1;
    let mut merged: Vec<StatementLine> = statements[newest_idx].1.lines.clone();
    for (_, statement) in statements.iter().rev().skip(1) {
        for (idx, line) in statement.lines.iter().enumerate() {
            let key = line.merge_key();
            if merged.iter().any(|l| l.merge_key() == key) {
                continue;
            }
            let abstract_key = parent_abstract_key(&statement.lines, idx);
            let position = insert_position(&merged, abstract_key.as_deref());
            merged.insert(position, line.clone());
        }
    }

    // assemble columns and re-pull values per merged line
    let mut columns = Vec::with_capacity(chosen.len());
    for candidate in &chosen {
        let (p, _) = &statements[candidate.filing_idx];
        let metadata = p.filing.metadata();
        let reported = if candidate.is_primary {
            metadata.fiscal_year
        } else {
            None
        };
        let fiscal_year = guarded_fiscal_year(&candidate.period, reported);
        let period_label = if candidate.period.classification() == PeriodClass::Annual {
            format!("FY {fiscal_year}")
        } else {
            candidate.period.label()
        };
        columns.push(StatementColumn {
            period_key: candidate.period.key(),
            period_label,
            fiscal_year: Some(fiscal_year),
            duration_days: candidate.period.duration_days(),
            provenance: Some(ColumnProvenance {
                source_accession: metadata.accession.clone(),
                is_primary: candidate.is_primary,
                filing_date: metadata.filing_date,
            }),
        });
    }

    for line in &mut merged {
        let key = line.merge_key();
        line.values = chosen
            .iter()
            .map(|candidate| {
                statements[candidate.filing_idx]
                    .1
                    .lines
                    .iter()
                    .find(|l| l.merge_key() == key)
                    .and_then(|l| l.values.get(candidate.column_idx).copied().flatten())
            })
            .collect();
    }

    Ok(Statement {
        statement_type: Some(statement_type),
        role: statements[newest_idx].1.role.clone(),
        lines: merged,
        columns,
        period_fallback: statements.iter().any(|(_, s)| s.period_fallback),
        reason: None,
        warnings,
    })
}

/// Fiscal-year label guard.
///
/// A reported label ≥2 years away from the period end's calendar year is
/// feed noise; period ends on Jan 1–7 belong to the prior fiscal year on
/// 52/53-week calendars regardless of what the feed claims.
fn guarded_fiscal_year(period: &ReportingPeriod, reported: Option<i32>) -> i32 {
    let end = period.end_date();
    let implied = period.implied_fiscal_year();
    match reported {
        Some(fy) if (fy - end.year()).abs() >= 2 => {
            debug!(reported = fy, implied, "rejecting implausible fiscal-year label");
            implied
        }
        Some(fy) if end.month() == 1 && end.day() <= 7 && fy != implied => {
            debug!(reported = fy, implied, "applying 52/53-week January convention");
            implied
        }
        Some(fy) => fy,
        None => implied,
    }
}

/// Merge key of the nearest preceding abstract heading of `lines[idx]`.
fn parent_abstract_key(lines: &[StatementLine], idx: usize) -> Option<String> {
    let level = lines[idx].level;
    lines[..idx]
        .iter()
        .rev()
        .find(|l| l.is_abstract && l.level < level)
        .map(StatementLine::merge_key)
}

/// Position after the last line of the abstract group identified by
/// `abstract_key`, or the end when the group is absent.
fn insert_position(merged: &[StatementLine], abstract_key: Option<&str>) -> usize {
    let Some(key) = abstract_key else {
        return merged.len();
    };
    let Some(abstract_idx) = merged
        .iter()
        .position(|l| l.is_abstract && l.merge_key() == key)
    else {
        return merged.len();
    };
    let abstract_level = merged[abstract_idx].level;
    let mut position = abstract_idx + 1;
    while position < merged.len() && merged[position].level > abstract_level {
        position += 1;
    }
    position
}

fn normalize_cik(cik: &str) -> String {
    let stripped = cik.trim().trim_start_matches('0');
    if stripped.is_empty() { "0" } else { stripped }.to_string()
}
