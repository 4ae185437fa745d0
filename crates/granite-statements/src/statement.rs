//! Tabular statement output.

use crate::error::Result;
use crate::standardize::CanonicalConcept;
use chrono::NaiveDate;
use granite_xbrl::{ParseWarning, StatementType};
use polars::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Where a stitched column's data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProvenance {
    /// Accession number of the source filing
    pub source_accession: String,
    /// Whether the period was the source filing's own reporting period
    /// (as opposed to a comparative column)
    pub is_primary: bool,
    /// Date the source filing was submitted
    pub filing_date: Option<NaiveDate>,
}

/// One period column of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementColumn {
    /// Stable period key (`instant_...` / `duration_...`)
    pub period_key: String,
    /// Display label, e.g. `FY 2024` or `Dec 31, 2024`
    pub period_label: String,
    /// Fiscal year the column reports
    pub fiscal_year: Option<i32>,
    /// Duration length in days; `None` for instants
    pub duration_days: Option<i64>,
    /// Source provenance; set on stitched statements
    pub provenance: Option<ColumnProvenance>,
}

/// One line of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Display label
    pub label: String,
    /// Original normalized concept identifier
    pub concept: String,
    /// Canonical concept after standardization, when mapped
    pub canonical: Option<CanonicalConcept>,
    /// Indent level in the presentation tree
    pub level: usize,
    /// Abstract heading rows carry no values
    pub is_abstract: bool,
    /// Values aligned with the statement's columns
    pub values: Vec<Option<Decimal>>,
}

impl StatementLine {
    /// The key lines merge on when stitching: the canonical concept when
    /// mapped, the original concept otherwise.
    pub fn merge_key(&self) -> String {
        self.canonical
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| self.concept.clone())
    }
}

/// A derived, tabular view of one statement: cheap to rebuild, never
/// mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    /// Which statement this is
    pub statement_type: Option<StatementType>,
    /// Presentation role the lines came from
    pub role: Option<String>,
    /// Ordered lines
    pub lines: Vec<StatementLine>,
    /// Ordered period columns
    pub columns: Vec<StatementColumn>,
    /// Set when period selection fell back outside the annual window
    pub period_fallback: bool,
    /// Why the statement is empty, when it is
    pub reason: Option<String>,
    /// Non-fatal problems encountered while building or stitching
    #[serde(skip)]
    pub warnings: Vec<ParseWarning>,
}

impl Statement {
    /// An empty statement with an explanation instead of an error.
    pub fn empty(statement_type: StatementType, reason: impl Into<String>) -> Self {
        Self {
            statement_type: Some(statement_type),
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Whether the statement has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The value at a (concept, period key) cell.
    ///
    /// `concept` matches either the original or the canonical identifier.
    pub fn value(&self, concept: &str, period_key: &str) -> Option<Decimal> {
        let column = self.columns.iter().position(|c| c.period_key == period_key)?;
        self.lines
            .iter()
            .find(|l| {
                l.concept == concept
                    || l.canonical.is_some_and(|c| c.as_str() == concept)
            })
            .and_then(|l| l.values.get(column).copied().flatten())
    }

    /// The line with a given display label.
    pub fn line_by_label(&self, label: &str) -> Option<&StatementLine> {
        self.lines.iter().find(|l| l.label == label)
    }

    /// The line for a canonical concept.
    pub fn line_by_canonical(&self, canonical: CanonicalConcept) -> Option<&StatementLine> {
        self.lines.iter().find(|l| l.canonical == Some(canonical))
    }

    /// Materialize as a polars dataframe: metadata columns (`label`,
    /// `concept`, `level`, `abstract`) plus one value column per period.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let labels: Vec<&str> = self.lines.iter().map(|l| l.label.as_str()).collect();
        let concepts: Vec<&str> = self.lines.iter().map(|l| l.concept.as_str()).collect();
        let levels: Vec<u32> = self.lines.iter().map(|l| l.level as u32).collect();
        let abstracts: Vec<bool> = self.lines.iter().map(|l| l.is_abstract).collect();

        let mut columns: Vec<Column> = vec![
            Series::new("label".into(), labels).into(),
            Series::new("concept".into(), concepts).into(),
            Series::new("level".into(), levels).into(),
            Series::new("abstract".into(), abstracts).into(),
        ];
        for (idx, column) in self.columns.iter().enumerate() {
            let values: Vec<Option<f64>> = self
                .lines
                .iter()
                .map(|l| l.values.get(idx).copied().flatten().and_then(|v| v.to_f64()))
                .collect();
            columns.push(Series::new(column.period_label.as_str().into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }
}
