//! Facts, contexts, and units from an XBRL instance.

use crate::period::ReportingPeriod;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The types of statements a presentation role can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    /// Statement of financial position
    BalanceSheet,
    /// Statement of operations / income
    IncomeStatement,
    /// Statement of cash flows
    CashFlow,
    /// Statement of stockholders' equity
    Equity,
    /// Statement of comprehensive income
    ComprehensiveIncome,
    /// Cover page
    Cover,
    /// Notes to the financial statements
    Notes,
    /// Parenthetical disclosures attached to a statement
    Parenthetical,
    /// Unclassified roles
    Other,
}

impl StatementType {
    /// Display name of the statement type.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "Balance Sheet",
            Self::IncomeStatement => "Income Statement",
            Self::CashFlow => "Cash Flow Statement",
            Self::Equity => "Statement of Equity",
            Self::ComprehensiveIncome => "Comprehensive Income",
            Self::Cover => "Cover",
            Self::Notes => "Notes",
            Self::Parenthetical => "Parenthetical",
            Self::Other => "Other",
        }
    }

    /// The core financial statements, in customary order.
    pub const fn financial_statements() -> [Self; 5] {
        [
            Self::BalanceSheet,
            Self::IncomeStatement,
            Self::CashFlow,
            Self::Equity,
            Self::ComprehensiveIncome,
        ]
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An (axis, member) qualification on a context segment.
///
/// Both sides are normalized concept identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionMember {
    /// The axis (dimension) concept
    pub axis: String,
    /// The member concept
    pub member: String,
}

/// An instance context: entity, period, and optional dimensional segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context id referenced by facts
    pub id: String,
    /// Entity identifier (CIK for SEC filings)
    pub entity: String,
    /// Identifier scheme URI
    pub scheme: String,
    /// The reporting period
    pub period: ReportingPeriod,
    /// Ordered explicit-member segment; empty means consolidated/default
    pub segment: Vec<DimensionMember>,
}

impl Context {
    /// Whether this is the consolidated (no-segment) context.
    pub fn is_consolidated(&self) -> bool {
        self.segment.is_empty()
    }
}

/// A unit of measure. Divide forms render as `numerator/denominator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit id referenced by facts
    pub id: String,
    /// Measure string, e.g. `iso4217:USD` or `iso4217:USD/shares`
    pub measure: String,
}

/// A single reported fact.
///
/// Numeric facts carry both the raw reported string (for audit) and a
/// decimal value with inline scale already applied. Sign flips from
/// calculation weights happen later in the pipeline, not at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Normalized concept identifier
    pub concept: String,
    /// Context id; resolves the entity, period, and segment
    pub context_ref: String,
    /// Unit id; always present on numeric facts
    pub unit_ref: Option<String>,
    /// Raw reported value, exactly as it appeared in the document
    pub raw: String,
    /// Parsed numeric value, scaled to the base unit
    pub value: Option<Decimal>,
    /// The `decimals` attribute, when present (`None` for `INF` or absent)
    pub decimals: Option<i32>,
    /// Footnote ids referencing this fact
    pub footnotes: Vec<String>,
}

impl Fact {
    /// Signature used for deduplication: one logical fact per
    /// (concept, context) pair.
    pub fn signature(&self) -> (&str, &str) {
        (&self.concept, &self.context_ref)
    }

    /// Whether the fact parsed to a numeric value.
    pub const fn is_numeric(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_context_consolidated() {
        let ctx = Context {
            id: "c1".to_string(),
            entity: "0000320193".to_string(),
            scheme: "http://www.sec.gov/CIK".to_string(),
            period: ReportingPeriod::Instant {
                date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            },
            segment: Vec::new(),
        };
        assert!(ctx.is_consolidated());
    }

    #[test]
    fn test_fact_signature() {
        let fact = Fact {
            concept: "us-gaap:Revenues".to_string(),
            context_ref: "c1".to_string(),
            unit_ref: Some("usd".to_string()),
            raw: "1000".to_string(),
            value: Some(dec!(1000)),
            decimals: Some(-3),
            footnotes: Vec::new(),
        };
        assert_eq!(fact.signature(), ("us-gaap:Revenues", "c1"));
        assert!(fact.is_numeric());
    }
}
