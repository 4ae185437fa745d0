//! Statement resolution: mapping presentation roles to statement types.
//!
//! Classification runs three heuristics in priority order: an exact lookup
//! on the role URI's trailing segment, regex patterns over the role's
//! human-readable definition, and finally structural inspection of the
//! presentation network. Ambiguity between several roles claiming the same
//! statement type is broken toward the role with the longest definition.

use granite_xbrl::{ParseWarning, ParsedFiling, PresentationNetwork, StatementType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::warn;

/// Exact role-name suffixes with known statement types.
const KNOWN_ROLE_NAMES: [(&str, StatementType); 16] = [
    ("BalanceSheet", StatementType::BalanceSheet),
    ("BalanceSheets", StatementType::BalanceSheet),
    ("StatementsOfFinancialPosition", StatementType::BalanceSheet),
    ("StatementOfOperations", StatementType::IncomeStatement),
    ("StatementsOfOperations", StatementType::IncomeStatement),
    ("StatementsOfIncome", StatementType::IncomeStatement),
    ("IncomeStatement", StatementType::IncomeStatement),
    ("StatementOfCashFlows", StatementType::CashFlow),
    ("StatementsOfCashFlows", StatementType::CashFlow),
    ("StatementsOfStockholdersEquity", StatementType::Equity),
    ("StatementsOfShareholdersEquity", StatementType::Equity),
    ("StatementsOfComprehensiveIncome", StatementType::ComprehensiveIncome),
    ("ComprehensiveIncome", StatementType::ComprehensiveIncome),
    ("Cover", StatementType::Cover),
    ("CoverPage", StatementType::Cover),
    ("DocumentAndEntityInformation", StatementType::Cover),
];

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)parenthetical").unwrap());
static BALANCE_SHEET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)balance\s+sheet|financial\s+position").unwrap());
static INCOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(statements?|consolidated)\s+of\s+(income|operations|earnings)").unwrap()
});
static CASH_FLOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cash\s+flows?").unwrap());
static EQUITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(stockholders'?|shareholders'?|changes\s+in)\s+equity").unwrap()
});
static COMPREHENSIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)comprehensive\s+(income|loss)").unwrap());
static COVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcover\b|document\s+and\s+entity").unwrap());
static NOTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)-\s*disclosure\s*-|notes?\s+to").unwrap());

/// The resolved statement layout of one filing.
#[derive(Debug, Clone, Default)]
pub struct StatementCatalog {
    /// Every role with its classification, in document order
    entries: Vec<(String, StatementType)>,
    /// Best role per statement type
    chosen: HashMap<StatementType, String>,
}

impl StatementCatalog {
    /// Classify every presentation role of a filing.
    ///
    /// Returns the catalog plus the warnings produced for unclassifiable
    /// roles.
    pub fn resolve(filing: &ParsedFiling) -> (Self, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let mut entries = Vec::new();
        let definitions = filing.role_definitions();

        for network in &filing.linkbases().presentation {
            let definition = definitions.get(&network.role).map(String::as_str);
            let statement = classify_role(&network.role, definition, network, filing);
            if statement == StatementType::Other {
                warn!(role = %network.role, "role not classifiable as a statement");
                warnings.push(ParseWarning::UnknownStatementType {
                    role: network.role.clone(),
                });
            }
            entries.push((network.role.clone(), statement));
        }

        // ties go to the role with the longest definition string
        let mut chosen: HashMap<StatementType, String> = HashMap::new();
        for (role, statement) in &entries {
            if *statement == StatementType::Other {
                continue;
            }
            let candidate_len = definitions.get(role).map_or(0, String::len);
            let replace = match chosen.get(statement) {
                None => true,
                Some(existing) => definitions.get(existing).map_or(0, String::len) < candidate_len,
            };
            if replace {
                chosen.insert(*statement, role.clone());
            }
        }

        (Self { entries, chosen }, warnings)
    }

    /// The role chosen for a statement type.
    pub fn role_for(&self, statement: StatementType) -> Option<&str> {
        self.chosen.get(&statement).map(String::as_str)
    }

    /// The classification of a role URI.
    pub fn type_of_role(&self, role: &str) -> Option<StatementType> {
        self.entries
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, s)| *s)
    }

    /// All (role, statement type) entries in document order.
    pub fn entries(&self) -> &[(String, StatementType)] {
        &self.entries
    }

    /// Concept → statement type assignment for the fact store index.
    ///
    /// Financial statements claim their concepts first, so a concept shared
    /// with a note role is indexed under the statement that presents it.
    pub fn concept_assignment(&self, filing: &ParsedFiling) -> HashMap<String, StatementType> {
        let mut assignment = HashMap::new();
        let mut ordered: Vec<&(String, StatementType)> = self.entries.iter().collect();
        ordered.sort_by_key(|(_, statement)| match statement {
            StatementType::BalanceSheet
            | StatementType::IncomeStatement
            | StatementType::CashFlow
            | StatementType::Equity
            | StatementType::ComprehensiveIncome => 0,
            StatementType::Cover | StatementType::Parenthetical => 1,
            StatementType::Notes => 2,
            StatementType::Other => 3,
        });
        for (role, statement) in ordered {
            let Some(network) = filing.linkbases().presentation_for(role) else {
                continue;
            };
            for idx in network.concepts() {
                if let Some(concept) = filing.registry().by_index(idx) {
                    assignment
                        .entry(concept.id.clone())
                        .or_insert(*statement);
                }
            }
        }
        assignment
    }
}

/// Classify one role.
fn classify_role(
    role: &str,
    definition: Option<&str>,
    network: &PresentationNetwork,
    filing: &ParsedFiling,
) -> StatementType {
    // 1. exact match on the role URI's trailing segment
    let suffix = role.rsplit('/').next().unwrap_or(role);
    for (name, statement) in KNOWN_ROLE_NAMES {
        if suffix == name {
            return statement;
        }
    }

    // 2. patterns over the human-readable definition
    if let Some(text) = definition {
        if PARENTHETICAL.is_match(text) {
            return StatementType::Parenthetical;
        }
        if BALANCE_SHEET.is_match(text) {
            return StatementType::BalanceSheet;
        }
        if INCOME.is_match(text) {
            return StatementType::IncomeStatement;
        }
        if CASH_FLOW.is_match(text) {
            return StatementType::CashFlow;
        }
        if EQUITY.is_match(text) {
            return StatementType::Equity;
        }
        if COMPREHENSIVE.is_match(text) {
            return StatementType::ComprehensiveIncome;
        }
        if COVER.is_match(text) {
            return StatementType::Cover;
        }
        if NOTES.is_match(text) {
            return StatementType::Notes;
        }
    }

    // 3. structural heuristics on the presentation network
    structural_type(network, filing).unwrap_or(StatementType::Other)
}

/// Shape-based classification when names and definitions say nothing.
fn structural_type(network: &PresentationNetwork, filing: &ParsedFiling) -> Option<StatementType> {
    let registry = filing.registry();
    let concept_names: Vec<&str> = network
        .concepts()
        .into_iter()
        .filter_map(|idx| registry.by_index(idx))
        .map(|c| c.name.as_str())
        .collect();
    if concept_names.is_empty() {
        return None;
    }

    // a balance sheet presents total assets against total liabilities+equity
    let has_assets = concept_names.iter().any(|n| *n == "Assets");
    let has_liabilities_and_equity = concept_names
        .iter()
        .any(|n| *n == "LiabilitiesAndStockholdersEquity");
    if has_assets && has_liabilities_and_equity {
        return Some(StatementType::BalanceSheet);
    }

    if concept_names
        .iter()
        .any(|n| n.starts_with("NetCashProvidedByUsedIn"))
    {
        return Some(StatementType::CashFlow);
    }

    // income statements are dominated by revenue/expense/income leaves
    let income_like = concept_names
        .iter()
        .filter(|n| {
            n.contains("Revenue")
                || n.contains("Expense")
                || n.contains("Income")
                || n.contains("Cost")
                || n.contains("EarningsPerShare")
        })
        .count();
    if income_like * 2 > concept_names.len() {
        return Some(StatementType::IncomeStatement);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use granite_xbrl::{FilingSource, FiscalMetadata};

    fn filing(schema: &str, presentation: &str, instance: &str) -> ParsedFiling {
        ParsedFiling::parse(FilingSource {
            schema,
            presentation_linkbase: Some(presentation),
            instance,
            metadata: FiscalMetadata::default(),
            ..FilingSource::default()
        })
        .unwrap()
    }

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
  xmlns:xbrli="http://www.xbrl.org/2003/instance" xmlns:link="http://www.xbrl.org/2003/linkbase">
  <xs:element id="us-gaap_Assets" name="Assets" type="xbrli:monetaryItemType" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_LiabilitiesAndStockholdersEquity" name="LiabilitiesAndStockholdersEquity"
      type="xbrli:monetaryItemType" xbrli:periodType="instant"/>
  <xs:element id="us-gaap_Revenues" name="Revenues" type="xbrli:monetaryItemType" xbrli:periodType="duration"/>
  <link:roleType roleURI="http://x.com/role/Mystery1" id="Mystery1">
    <link:definition>00100 - Statement - Consolidated Balance Sheets</link:definition>
  </link:roleType>
  <link:roleType roleURI="http://x.com/role/Mystery2" id="Mystery2">
    <link:definition>00110 - Statement - Consolidated Balance Sheets (Parenthetical)</link:definition>
  </link:roleType>
</xs:schema>"#;

    const INSTANCE: &str = r#"<xbrli:xbrl xmlns:xbrli="http://www.xbrl.org/2003/instance"
  xmlns:us-gaap="http://fasb.org/us-gaap/2024">
  <xbrli:context id="I1">
    <xbrli:entity><xbrli:identifier scheme="cik">1</xbrli:identifier></xbrli:entity>
    <xbrli:period><xbrli:instant>2024-12-31</xbrli:instant></xbrli:period>
  </xbrli:context>
  <xbrli:unit id="usd"><xbrli:measure>iso4217:USD</xbrli:measure></xbrli:unit>
  <us-gaap:Assets contextRef="I1" unitRef="usd">100</us-gaap:Assets>
</xbrli:xbrl>"#;

    fn presentation(role: &str) -> String {
        format!(
            r#"<link:linkbase xmlns:link="http://www.xbrl.org/2003/linkbase" xmlns:xlink="http://www.w3.org/1999/xlink">
  <link:presentationLink xlink:role="{role}">
    <link:loc xlink:label="l1" xlink:href="s.xsd#us-gaap_Assets"/>
    <link:loc xlink:label="l2" xlink:href="s.xsd#us-gaap_LiabilitiesAndStockholdersEquity"/>
    <link:presentationArc xlink:from="l1" xlink:to="l2" order="1"/>
  </link:presentationLink>
</link:linkbase>"#
        )
    }

    #[test]
    fn test_exact_role_name() {
        let f = filing(SCHEMA, &presentation("http://x.com/role/BalanceSheets"), INSTANCE);
        let (catalog, warnings) = StatementCatalog::resolve(&f);
        assert_eq!(
            catalog.type_of_role("http://x.com/role/BalanceSheets"),
            Some(StatementType::BalanceSheet)
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_definition_pattern() {
        let f = filing(SCHEMA, &presentation("http://x.com/role/Mystery1"), INSTANCE);
        let (catalog, _) = StatementCatalog::resolve(&f);
        assert_eq!(
            catalog.type_of_role("http://x.com/role/Mystery1"),
            Some(StatementType::BalanceSheet)
        );
    }

    #[test]
    fn test_parenthetical_beats_balance_sheet_pattern() {
        let f = filing(SCHEMA, &presentation("http://x.com/role/Mystery2"), INSTANCE);
        let (catalog, _) = StatementCatalog::resolve(&f);
        assert_eq!(
            catalog.type_of_role("http://x.com/role/Mystery2"),
            Some(StatementType::Parenthetical)
        );
    }

    #[test]
    fn test_structural_fallback_classifies_balance_sheet() {
        // role name and definition are both uninformative
        let f = filing(SCHEMA, &presentation("http://x.com/role/r123"), INSTANCE);
        let (catalog, warnings) = StatementCatalog::resolve(&f);
        assert_eq!(
            catalog.type_of_role("http://x.com/role/r123"),
            Some(StatementType::BalanceSheet)
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_concept_assignment_feeds_store_index() {
        let f = filing(SCHEMA, &presentation("http://x.com/role/BalanceSheets"), INSTANCE);
        let (catalog, _) = StatementCatalog::resolve(&f);
        let assignment = catalog.concept_assignment(&f);
        assert_eq!(
            assignment.get("us-gaap:Assets"),
            Some(&StatementType::BalanceSheet)
        );
    }
}
