//! The parse entry point: one filing's documents in, an immutable
//! [`ParsedFiling`] out.

use crate::concept::ConceptRegistry;
use crate::error::{ParseWarning, Result};
use crate::instance::{XbrlInstance, parse_instance};
use crate::linkbase::{
    LinkbaseSet, parse_calculation_linkbase, parse_definition_linkbase, parse_label_linkbase,
    parse_presentation_linkbase,
};
use crate::period::ReportingPeriod;
use crate::query::FactQuery;
use crate::schema::{RoleDefinitions, parse_schema};
use crate::store::FactStore;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fiscal period focus of a filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    /// Full fiscal year
    FY,
    /// First fiscal quarter
    Q1,
    /// Second fiscal quarter
    Q2,
    /// Third fiscal quarter
    Q3,
    /// Fourth fiscal quarter
    Q4,
}

impl FiscalPeriod {
    /// Parse the SEC `fiscal_period_focus` string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "FY" => Some(Self::FY),
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            _ => None,
        }
    }

    /// Whether this is the full-year focus.
    pub const fn is_annual(&self) -> bool {
        matches!(self, Self::FY)
    }
}

/// Fiscal metadata accompanying a filing, supplied by the collaborator that
/// fetched it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalMetadata {
    /// Form type, e.g. `10-K` or `10-Q`
    pub form_type: String,
    /// The filing's own reporting period end
    pub period_of_report: Option<NaiveDate>,
    /// Fiscal year as reported by the SEC feed; occasionally wrong for
    /// 52/53-week calendars and sanity-checked during stitching
    pub fiscal_year: Option<i32>,
    /// Declared fiscal year end as (month, day)
    pub fiscal_year_end: Option<(u32, u32)>,
    /// Declared fiscal period focus
    pub fiscal_period_focus: Option<FiscalPeriod>,
    /// Date the filing was submitted
    pub filing_date: Option<NaiveDate>,
    /// Accession number
    pub accession: String,
    /// Central Index Key of the filer
    pub cik: String,
    /// Filer industry, used by industry-scoped standardization rules
    pub industry: Option<String>,
}

impl FiscalMetadata {
    /// The declared fiscal period focus, inferred from the form type and
    /// period of report when absent.
    ///
    /// A period of report within 15 days of the fiscal year end (or a 10-K
    /// form) implies `FY`; otherwise the quarter is derived from how many
    /// months past the fiscal year end the period falls.
    pub fn period_focus(&self) -> Option<FiscalPeriod> {
        if let Some(focus) = self.fiscal_period_focus {
            return Some(focus);
        }
        if self.form_type.starts_with("10-K") {
            return Some(FiscalPeriod::FY);
        }
        let por = self.period_of_report?;
        let (fye_month, fye_day) = self.fiscal_year_end?;
        let probe = ReportingPeriod::Instant { date: por };
        if probe.fiscal_alignment(fye_month, fye_day) >= 75 {
            return Some(FiscalPeriod::FY);
        }
        let months_past = (por.month() as i32 - fye_month as i32).rem_euclid(12);
        match months_past {
            1..=4 => Some(FiscalPeriod::Q1),
            5..=7 => Some(FiscalPeriod::Q2),
            8..=10 => Some(FiscalPeriod::Q3),
            _ => Some(FiscalPeriod::Q4),
        }
    }
}

/// Borrowed document set for one filing.
///
/// Any linkbase may be absent; the corresponding network layer is then
/// empty. The schema and instance are required.
#[derive(Debug, Clone, Default)]
pub struct FilingSource<'a> {
    /// Taxonomy schema XML
    pub schema: &'a str,
    /// Label linkbase XML
    pub label_linkbase: Option<&'a str>,
    /// Presentation linkbase XML
    pub presentation_linkbase: Option<&'a str>,
    /// Calculation linkbase XML
    pub calculation_linkbase: Option<&'a str>,
    /// Definition linkbase XML
    pub definition_linkbase: Option<&'a str>,
    /// Instance XML (standalone or inline-XBRL HTML)
    pub instance: &'a str,
    /// Fiscal metadata record
    pub metadata: FiscalMetadata,
}

/// A fully parsed filing: concept registry, relationship networks, fact
/// store, and fiscal metadata.
///
/// Immutable once loaded; share it freely across threads. Statements built
/// from it are lightweight views.
#[derive(Debug, Clone)]
pub struct ParsedFiling {
    registry: ConceptRegistry,
    linkbases: LinkbaseSet,
    role_definitions: RoleDefinitions,
    store: FactStore,
    metadata: FiscalMetadata,
    warnings: Vec<ParseWarning>,
}

impl ParsedFiling {
    /// Parse a filing's documents into memory.
    ///
    /// # Errors
    /// Fatal conditions (schema conflicts, structurally invalid XML, an
    /// instance with no contexts) abort with an [`crate::XbrlError`];
    /// recoverable problems accumulate as [`ParseWarning`]s on the result.
    pub fn parse(source: FilingSource<'_>) -> Result<Self> {
        let mut warnings = Vec::new();
        let mut registry = ConceptRegistry::new();

        let role_definitions = parse_schema(source.schema, &mut registry, &mut warnings)?;

        let mut linkbases = LinkbaseSet::default();
        if let Some(xml) = source.label_linkbase {
            linkbases.labels = parse_label_linkbase(xml, &registry, &mut warnings)?;
        }
        if let Some(xml) = source.presentation_linkbase {
            linkbases.presentation = parse_presentation_linkbase(xml, &registry, &mut warnings)?;
        }
        if let Some(xml) = source.calculation_linkbase {
            linkbases.calculation = parse_calculation_linkbase(xml, &registry, &mut warnings)?;
        }
        if let Some(xml) = source.definition_linkbase {
            linkbases.definition = parse_definition_linkbase(xml, &registry, &mut warnings)?;
        }

        let instance: XbrlInstance = parse_instance(source.instance, &mut warnings)?;
        let store = FactStore::build(instance, &registry, &linkbases.labels, &mut warnings);

        Ok(Self {
            registry,
            linkbases,
            role_definitions,
            store,
            metadata: source.metadata,
            warnings,
        })
    }

    /// The concept registry.
    pub const fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    /// The relationship networks.
    pub const fn linkbases(&self) -> &LinkbaseSet {
        &self.linkbases
    }

    /// Role URI → human-readable definition, from the schema's role types.
    pub const fn role_definitions(&self) -> &RoleDefinitions {
        &self.role_definitions
    }

    /// The fact store.
    pub const fn store(&self) -> &FactStore {
        &self.store
    }

    /// Mutable access to the fact store, for the load-time preparation
    /// passes (statement-type assignment, calculation weight reconciliation).
    pub fn store_mut(&mut self) -> &mut FactStore {
        &mut self.store
    }

    /// Fiscal metadata of this filing.
    pub const fn metadata(&self) -> &FiscalMetadata {
        &self.metadata
    }

    /// Warnings accumulated while parsing.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Record a warning raised by a later processing stage.
    pub fn push_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    /// Start a fact query.
    pub fn query(&self) -> FactQuery<'_> {
        self.store.query()
    }

    /// Distinct reporting periods in the instance, oldest first.
    pub fn periods(&self) -> &[ReportingPeriod] {
        self.store.periods()
    }

    /// Axis id → default member id, from the definition linkbase.
    pub fn dimension_defaults(&self) -> HashMap<String, String> {
        self.linkbases
            .dimension_defaults()
            .into_iter()
            .filter_map(|(axis, member)| {
                Some((
                    self.registry.by_index(axis)?.id.clone(),
                    self.registry.by_index(member)?.id.clone(),
                ))
            })
            .collect()
    }
}
