//! The facts-query façade.
//!
//! [`FilingFacts`] runs the full load pipeline for one filing (parse,
//! statement resolution, statement-type indexing, calculation weight
//! reconciliation) and exposes the stable public surface callers build
//! against. [`StatementStitcher`] owns a set of loaded filings for one
//! entity, ordered oldest→newest, and emits stitched multi-period views.

use granite_statements::{
    Prepared, Result, StatementCatalog, StatementOptions, build_statement, reconcile_weights,
    stitch_statements,
};
use granite_xbrl::{
    FactQuery, FilingSource, FiscalMetadata, ParseWarning, ParsedFiling, ReportingPeriod,
    StatementType, XbrlError,
};
use polars::prelude::DataFrame;
use std::collections::HashMap;

/// A loaded filing with its statements resolved, ready for queries.
///
/// Immutable after [`load`](Self::load); share it freely across threads.
#[derive(Debug, Clone)]
pub struct FilingFacts {
    filing: ParsedFiling,
    catalog: StatementCatalog,
}

impl FilingFacts {
    /// Parse a filing and run the load-time preparation passes.
    ///
    /// # Errors
    /// Propagates fatal parse failures; recoverable problems end up in
    /// [`warnings`](Self::warnings).
    pub fn load(source: FilingSource<'_>) -> std::result::Result<Self, XbrlError> {
        let mut filing = ParsedFiling::parse(source)?;

        let (catalog, warnings) = StatementCatalog::resolve(&filing);
        let assignment = catalog.concept_assignment(&filing);
        filing.store_mut().assign_statement_types(&assignment);
        for warning in warnings {
            filing.push_warning(warning);
        }
        reconcile_weights(&mut filing);

        Ok(Self { filing, catalog })
    }

    /// The underlying parsed filing.
    pub const fn filing(&self) -> &ParsedFiling {
        &self.filing
    }

    /// The resolved statement catalog.
    pub const fn catalog(&self) -> &StatementCatalog {
        &self.catalog
    }

    /// Fiscal metadata of the filing.
    pub const fn metadata(&self) -> &FiscalMetadata {
        self.filing.metadata()
    }

    /// Warnings accumulated across parsing and resolution.
    pub fn warnings(&self) -> &[ParseWarning] {
        self.filing.warnings()
    }

    /// Distinct reporting periods in the filing, oldest first.
    pub fn periods(&self) -> &[ReportingPeriod] {
        self.filing.periods()
    }

    /// Start a fact query.
    pub fn query(&self) -> FactQuery<'_> {
        self.filing.query()
    }

    /// All facts as a dataframe.
    ///
    /// # Errors
    /// Fails only on dataframe assembly.
    pub fn to_dataframe(&self) -> std::result::Result<DataFrame, XbrlError> {
        self.query().to_dataframe()
    }

    /// Build one statement.
    ///
    /// Returns an empty statement with a `reason` annotation when the type
    /// has no resolvable role, never an error.
    pub fn statement(
        &self,
        statement_type: StatementType,
        options: &StatementOptions,
    ) -> granite_statements::Statement {
        build_statement(&self.filing, &self.catalog, statement_type, options)
    }

    /// Build every core financial statement.
    pub fn statements(
        &self,
        options: &StatementOptions,
    ) -> HashMap<StatementType, granite_statements::Statement> {
        StatementType::financial_statements()
            .into_iter()
            .map(|t| (t, self.statement(t, options)))
            .collect()
    }

    /// The balance sheet with default options.
    pub fn balance_sheet(&self) -> granite_statements::Statement {
        self.statement(StatementType::BalanceSheet, &StatementOptions::default())
    }

    /// The income statement with default options.
    pub fn income_statement(&self) -> granite_statements::Statement {
        self.statement(StatementType::IncomeStatement, &StatementOptions::default())
    }

    /// The cash flow statement with default options.
    pub fn cash_flow_statement(&self) -> granite_statements::Statement {
        self.statement(StatementType::CashFlow, &StatementOptions::default())
    }
}

/// Stitches several filings of one entity into multi-period statements.
///
/// Filings are held oldest→newest in caller-provided order and never
/// mutated. `None` entries stand for pre-XBRL filings and are silently
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct StatementStitcher {
    filings: Vec<Option<FilingFacts>>,
}

impl StatementStitcher {
    /// An empty stitcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded filings ordered oldest→newest.
    pub fn from_filings(filings: Vec<Option<FilingFacts>>) -> Self {
        Self { filings }
    }

    /// Append the next-newer filing.
    pub fn push(&mut self, facts: FilingFacts) {
        self.filings.push(Some(facts));
    }

    /// Append a pre-XBRL filing placeholder; stitching skips it silently.
    pub fn push_pre_xbrl(&mut self) {
        self.filings.push(None);
    }

    /// Number of slots, including pre-XBRL placeholders.
    pub fn len(&self) -> usize {
        self.filings.len()
    }

    /// Whether no filings have been added.
    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }

    /// Stitch one statement type across all filings.
    ///
    /// # Errors
    /// [`granite_statements::StatementError::EntityMismatch`] when inputs
    /// span different CIKs; [`granite_statements::StatementError::NoFilings`]
    /// when nothing stitchable remains.
    pub fn statement(
        &self,
        statement_type: StatementType,
        options: &StatementOptions,
    ) -> Result<granite_statements::Statement> {
        let prepared: Vec<Option<Prepared<'_>>> = self
            .filings
            .iter()
            .map(|slot| {
                slot.as_ref().map(|facts| Prepared {
                    filing: &facts.filing,
                    catalog: &facts.catalog,
                })
            })
            .collect();
        stitch_statements(&prepared, statement_type, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use granite_xbrl::FiscalPeriod;
    use rust_decimal_macros::dec;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
  xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:link="http://www.xbrl.org/2003/linkbase">
  <xs:element id="us-gaap_Revenues" name="Revenues"
      type="xbrli:monetaryItemType" xbrli:periodType="duration" xbrli:balance="credit"/>
  <xs:element id="us-gaap_NetIncomeLoss" name="NetIncomeLoss"
      type="xbrli:monetaryItemType" xbrli:periodType="duration" xbrli:balance="credit"/>
  <link:roleType roleURI="http://x.com/role/IncomeStatement" id="IncomeStatement">
    <link:definition>00200 - Statement - Consolidated Statements of Operations</link:definition>
  </link:roleType>
</xs:schema>"#;

    const PRESENTATION: &str = r#"<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:presentationLink xlink:role="http://x.com/role/IncomeStatement">
    <link:loc xlink:label="l_rev" xlink:href="s.xsd#us-gaap_Revenues"/>
    <link:loc xlink:label="l_ni" xlink:href="s.xsd#us-gaap_NetIncomeLoss"/>
    <link:presentationArc xlink:from="l_rev" xlink:to="l_ni" order="1"/>
  </link:presentationLink>
</link:linkbase>"#;

    const INSTANCE: &str = r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
  xmlns:us-gaap="http://fasb.org/us-gaap/2024">
  <xbrli:context id="FY2024">
    <xbrli:entity><xbrli:identifier scheme="http://www.sec.gov/CIK">0000555666</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:startDate>2024-01-01</xbrli:startDate><xbrli:endDate>2024-12-31</xbrli:endDate></xbrli:period>
  </xbrli:context>
  <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <us-gaap:Revenues contextRef="FY2024" unitRef="usd" decimals="0">1000</us-gaap:Revenues>
  <us-gaap:NetIncomeLoss contextRef="FY2024" unitRef="usd" decimals="0">150</us-gaap:NetIncomeLoss>
</xbrli:xbrl>"#;

    fn facts() -> FilingFacts {
        FilingFacts::load(FilingSource {
            schema: SCHEMA,
            presentation_linkbase: Some(PRESENTATION),
            instance: INSTANCE,
            metadata: FiscalMetadata {
                form_type: "10-K".to_string(),
                fiscal_period_focus: Some(FiscalPeriod::FY),
                fiscal_year_end: Some((12, 31)),
                cik: "555666".to_string(),
                accession: "acc-1".to_string(),
                ..FiscalMetadata::default()
            },
            ..FilingSource::default()
        })
        .unwrap()
    }

    #[test]
    fn test_load_and_query() {
        let facts = facts();
        assert_eq!(facts.query().by_concept("us-gaap:Revenues").count(), 1);
        assert_eq!(
            facts
                .query()
                .by_statement_type(StatementType::IncomeStatement)
                .count(),
            2
        );
    }

    #[test]
    fn test_statement_cells_match_fact_store() {
        let facts = facts();
        let statement = facts.income_statement();
        for line in statement.lines.iter().filter(|l| !l.is_abstract) {
            for (column, value) in statement.columns.iter().zip(&line.values) {
                let from_store = facts
                    .filing()
                    .store()
                    .facts_for(&line.concept, &column.period_key)
                    .first()
                    .and_then(|f| f.value);
                assert_eq!(*value, from_store);
            }
        }
    }

    #[test]
    fn test_missing_statement_returns_reason() {
        let facts = facts();
        let statement = facts.balance_sheet();
        assert!(statement.is_empty());
        assert!(statement.reason.is_some());
    }

    #[test]
    fn test_to_dataframe() {
        let facts = facts();
        let df = facts.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_stitcher_over_single_filing() {
        let mut stitcher = StatementStitcher::new();
        stitcher.push_pre_xbrl();
        stitcher.push(facts());
        assert_eq!(stitcher.len(), 2);

        let stitched = stitcher
            .statement(StatementType::IncomeStatement, &StatementOptions::default())
            .unwrap();
        assert_eq!(stitched.columns.len(), 1);
        assert_eq!(
            stitched.value("us-gaap:Revenues", "duration_2024-01-01_2024-12-31"),
            Some(dec!(1000))
        );
        let provenance = stitched.columns[0].provenance.as_ref().unwrap();
        assert_eq!(provenance.source_accession, "acc-1");
    }
}
