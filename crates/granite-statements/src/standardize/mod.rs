//! Concept standardization.
//!
//! Maps company-specific taxonomy concepts onto the closed
//! [`CanonicalConcept`] vocabulary so statements are comparable across
//! filers. Mapping sources apply in priority order: per-filer overrides,
//! industry-scoped rules (highest numeric priority first), core mappings,
//! and finally presentation-hierarchy inheritance (applied by the statement
//! builder, which sees the tree).
//!
//! Standardization never invents facts: it relabels and regroups lines, and
//! the underlying values are unchanged. Canonical fields that make no sense
//! for an industry (a bank has no cost of goods sold) are marked
//! not-applicable by rules rather than filled with an unrelated concept.

mod canonical;

pub use canonical::CanonicalConcept;

use crate::error::{Result, StatementError};
use crate::statement::Statement;
use granite_xbrl::{FiscalMetadata, normalize_concept_id};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// An industry-scoped mapping rule.
///
/// A rule activates when the filer's industry contains any of its hints
/// (case-insensitive); a rule with no hints applies to every filer. Among
/// active rules the highest `priority` wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryRule {
    /// Rule name, for logs and configuration files
    pub name: String,
    /// Numeric priority; higher beats lower
    pub priority: i32,
    /// Case-insensitive substrings matched against the filer's industry
    #[serde(default)]
    pub industry_hints: Vec<String>,
    /// Source taxonomy concepts this rule maps
    pub select_any: Vec<String>,
    /// The canonical concept the sources map to
    pub target: CanonicalConcept,
    /// Canonical concepts this rule declares not-applicable for matching
    /// industries
    #[serde(default)]
    pub not_applicable: Vec<CanonicalConcept>,
}

impl IndustryRule {
    fn matches_industry(&self, industry: Option<&str>) -> bool {
        if self.industry_hints.is_empty() {
            return true;
        }
        industry.is_some_and(|industry| {
            let industry = industry.to_lowercase();
            self.industry_hints
                .iter()
                .any(|hint| industry.contains(&hint.to_lowercase()))
        })
    }

    fn selects(&self, concept: &str) -> bool {
        self.select_any
            .iter()
            .any(|c| normalize_concept_id(c) == concept)
    }
}

/// The mapping tables standardization draws from.
///
/// Usually configured once at startup through [`MappingRegistry::global`]
/// and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    core: HashMap<String, CanonicalConcept>,
    filer_overrides: HashMap<String, HashMap<String, CanonicalConcept>>,
    industry_rules: Vec<IndustryRule>,
}

/// Keys with this prefix in mapping files are documentation, not concepts.
const COMMENT_PREFIX: char = '_';

static GLOBAL: Lazy<RwLock<MappingRegistry>> =
    Lazy::new(|| RwLock::new(MappingRegistry::with_defaults()));

impl MappingRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in tables: core US-GAAP mappings, the shipped per-filer
    /// overrides, and the default industry rules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (canonical, sources) in default_core_mappings() {
            for source in sources {
                registry.add_core_mapping(source, canonical);
            }
        }
        for (cik, source, canonical) in default_filer_overrides() {
            registry.add_filer_override(cik, source, canonical);
        }
        for rule in default_industry_rules() {
            registry.add_industry_rule(rule);
        }
        registry
    }

    /// The process-wide registry, initialized with the defaults.
    ///
    /// Mutation is intended for configuration at startup; take the write
    /// lock, load files, and leave it immutable afterwards.
    pub fn global() -> &'static RwLock<Self> {
        &GLOBAL
    }

    /// Register a core mapping.
    pub fn add_core_mapping(&mut self, source: &str, canonical: CanonicalConcept) {
        self.core.insert(normalize_concept_id(source), canonical);
    }

    /// Register a per-filer override.
    pub fn add_filer_override(&mut self, cik: &str, source: &str, canonical: CanonicalConcept) {
        self.filer_overrides
            .entry(normalize_cik(cik))
            .or_default()
            .insert(normalize_concept_id(source), canonical);
    }

    /// Register an industry rule; rules stay sorted by priority.
    pub fn add_industry_rule(&mut self, rule: IndustryRule) {
        self.industry_rules.push(rule);
        self.industry_rules
            .sort_by_key(|r| std::cmp::Reverse(r.priority));
    }

    /// Load a core mapping file: a JSON object of
    /// `canonical name -> [taxonomy concept ids]`. Keys starting with `_`
    /// are comments and skipped.
    ///
    /// # Errors
    /// [`StatementError::MappingFileInvalid`] on malformed JSON, unknown
    /// canonical names, or non-list values. Loading must not silently
    /// continue without mappings: the output would masquerade as
    /// standardized.
    pub fn load_core_json(&mut self, json: &str) -> Result<usize> {
        let entries = parse_mapping_object(json)?;
        let mut added = 0;
        for (canonical, sources) in entries {
            for source in sources {
                self.add_core_mapping(&source, canonical);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Load a per-filer override file with the same schema as the core
    /// file, keyed to one CIK.
    pub fn load_filer_json(&mut self, cik: &str, json: &str) -> Result<usize> {
        let entries = parse_mapping_object(json)?;
        let mut added = 0;
        for (canonical, sources) in entries {
            for source in sources {
                self.add_filer_override(cik, &source, canonical);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Load industry rules from a JSON array.
    pub fn load_industry_rules_json(&mut self, json: &str) -> Result<usize> {
        let rules: Vec<IndustryRule> =
            serde_json::from_str(json).map_err(|e| StatementError::MappingFileInvalid {
                reason: format!("industry rules: {e}"),
            })?;
        let count = rules.len();
        for rule in rules {
            self.add_industry_rule(rule);
        }
        Ok(count)
    }

    /// Map a taxonomy concept to its canonical concept for a filer.
    ///
    /// Deterministic: the same (concept, cik, industry) always maps the
    /// same way.
    pub fn map(
        &self,
        concept: &str,
        cik: Option<&str>,
        industry: Option<&str>,
    ) -> Option<CanonicalConcept> {
        let concept = normalize_concept_id(concept);

        if let Some(cik) = cik
            && let Some(overrides) = self.filer_overrides.get(&normalize_cik(cik))
            && let Some(canonical) = overrides.get(&concept)
        {
            return Some(*canonical);
        }

        // rules are kept sorted by priority, highest first
        for rule in &self.industry_rules {
            if rule.matches_industry(industry) && rule.selects(&concept) {
                debug!(rule = %rule.name, concept = %concept, "industry rule matched");
                return Some(rule.target);
            }
        }

        self.core.get(&concept).copied()
    }

    /// Whether a canonical concept is declared not-applicable for an
    /// industry (a bank has no gross income; the field stays blank instead
    /// of borrowing an unrelated concept).
    pub fn is_not_applicable(&self, canonical: CanonicalConcept, industry: Option<&str>) -> bool {
        self.industry_rules.iter().any(|rule| {
            !rule.industry_hints.is_empty()
                && rule.matches_industry(industry)
                && rule.not_applicable.contains(&canonical)
        })
    }
}

/// Parse a `canonical -> [concept ids]` JSON object, skipping comment keys.
fn parse_mapping_object(json: &str) -> Result<Vec<(CanonicalConcept, Vec<String>)>> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| StatementError::MappingFileInvalid {
            reason: e.to_string(),
        })?;
    let serde_json::Value::Object(object) = value else {
        return Err(StatementError::MappingFileInvalid {
            reason: "top level must be an object".to_string(),
        });
    };

    let mut entries = Vec::new();
    for (key, value) in object {
        if key.starts_with(COMMENT_PREFIX) {
            continue;
        }
        let Some(canonical) = CanonicalConcept::parse(&key) else {
            return Err(StatementError::MappingFileInvalid {
                reason: format!("unknown canonical concept {key}"),
            });
        };
        let serde_json::Value::Array(items) = value else {
            return Err(StatementError::MappingFileInvalid {
                reason: format!("value for {key} must be a list of concept ids"),
            });
        };
        let mut sources = Vec::with_capacity(items.len());
        for item in items {
            let serde_json::Value::String(id) = item else {
                return Err(StatementError::MappingFileInvalid {
                    reason: format!("value for {key} must contain only strings"),
                });
            };
            sources.push(id);
        }
        entries.push((canonical, sources));
    }
    Ok(entries)
}

/// Strip leading zeros so padded and unpadded CIKs compare equal.
fn normalize_cik(cik: &str) -> String {
    let stripped = cik.trim().trim_start_matches('0');
    if stripped.is_empty() { "0" } else { stripped }.to_string()
}

/// Apply the registry to an already-built statement.
///
/// Relabels mapped lines with their canonical labels; unmapped lines keep
/// their original label and any previously assigned canonical concept, so
/// the operation is idempotent.
pub fn standardize_statement(
    statement: &Statement,
    metadata: &FiscalMetadata,
    registry: &MappingRegistry,
) -> Statement {
    let mut result = statement.clone();
    for line in &mut result.lines {
        if line.is_abstract {
            continue;
        }
        if let Some(canonical) = registry.map(
            &line.concept,
            Some(&metadata.cik),
            metadata.industry.as_deref(),
        ) {
            line.canonical = Some(canonical);
            line.label = canonical.label().to_string();
        } else if let Some(existing) = line.canonical {
            line.label = existing.label().to_string();
        }
    }
    result
}

/// The built-in core mapping table.
fn default_core_mappings() -> Vec<(CanonicalConcept, &'static [&'static str])> {
    use CanonicalConcept::*;
    vec![
        (
            Revenue,
            &[
                "us-gaap:Revenues",
                "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax",
                "us-gaap:RevenueFromContractWithCustomerIncludingAssessedTax",
                "us-gaap:SalesRevenueNet",
            ][..],
        ),
        (
            CostOfRevenue,
            &[
                "us-gaap:CostOfRevenue",
                "us-gaap:CostOfGoodsAndServicesSold",
                "us-gaap:CostOfGoodsSold",
            ][..],
        ),
        (GrossProfit, &["us-gaap:GrossProfit"][..]),
        (
            OperatingExpenses,
            &["us-gaap:OperatingExpenses", "us-gaap:CostsAndExpenses"][..],
        ),
        (
            SellingGeneralAndAdministrative,
            &[
                "us-gaap:SellingGeneralAndAdministrativeExpense",
                "us-gaap:GeneralAndAdministrativeExpense",
            ][..],
        ),
        (
            ResearchAndDevelopment,
            &["us-gaap:ResearchAndDevelopmentExpense"][..],
        ),
        (OperatingIncome, &["us-gaap:OperatingIncomeLoss"][..]),
        (InterestExpense, &["us-gaap:InterestExpense"][..]),
        (InterestIncome, &["us-gaap:InvestmentIncomeInterest"][..]),
        (
            IncomeBeforeTax,
            &[
                "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
                "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
            ][..],
        ),
        (IncomeTaxExpense, &["us-gaap:IncomeTaxExpenseBenefit"][..]),
        (
            NetIncome,
            &["us-gaap:NetIncomeLoss", "us-gaap:ProfitLoss"][..],
        ),
        (EarningsPerShareBasic, &["us-gaap:EarningsPerShareBasic"][..]),
        (
            EarningsPerShareDiluted,
            &["us-gaap:EarningsPerShareDiluted"][..],
        ),
        (Assets, &["us-gaap:Assets"][..]),
        (CurrentAssets, &["us-gaap:AssetsCurrent"][..]),
        (
            CashAndEquivalents,
            &[
                "us-gaap:CashAndCashEquivalentsAtCarryingValue",
                "us-gaap:Cash",
                "us-gaap:CashCashEquivalentsAndShortTermInvestments",
                "us-gaap:CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents",
            ][..],
        ),
        (
            ShortTermInvestments,
            &[
                "us-gaap:ShortTermInvestments",
                "us-gaap:MarketableSecuritiesCurrent",
            ][..],
        ),
        (
            AccountsReceivable,
            &[
                "us-gaap:AccountsReceivableNetCurrent",
                "us-gaap:ReceivablesNetCurrent",
            ][..],
        ),
        (Inventory, &["us-gaap:InventoryNet"][..]),
        (
            PropertyPlantEquipment,
            &["us-gaap:PropertyPlantAndEquipmentNet"][..],
        ),
        (Goodwill, &["us-gaap:Goodwill"][..]),
        (
            IntangibleAssets,
            &[
                "us-gaap:FiniteLivedIntangibleAssetsNet",
                "us-gaap:IntangibleAssetsNetExcludingGoodwill",
            ][..],
        ),
        (Liabilities, &["us-gaap:Liabilities"][..]),
        (CurrentLiabilities, &["us-gaap:LiabilitiesCurrent"][..]),
        (AccountsPayable, &["us-gaap:AccountsPayableCurrent"][..]),
        (
            ShortTermDebt,
            &[
                "us-gaap:ShortTermBorrowings",
                "us-gaap:DebtCurrent",
                "us-gaap:LongTermDebtCurrent",
            ][..],
        ),
        (
            LongTermDebt,
            &[
                "us-gaap:LongTermDebt",
                "us-gaap:LongTermDebtNoncurrent",
                "us-gaap:LongTermDebtAndCapitalLeaseObligations",
            ][..],
        ),
        (
            StockholdersEquity,
            &[
                "us-gaap:StockholdersEquity",
                "us-gaap:StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            ][..],
        ),
        (
            RetainedEarnings,
            &["us-gaap:RetainedEarningsAccumulatedDeficit"][..],
        ),
        (CommonStock, &["us-gaap:CommonStockValue"][..]),
        (
            LiabilitiesAndEquity,
            &["us-gaap:LiabilitiesAndStockholdersEquity"][..],
        ),
        (
            OperatingCashFlow,
            &[
                "us-gaap:NetCashProvidedByUsedInOperatingActivities",
                "us-gaap:NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
            ][..],
        ),
        (
            InvestingCashFlow,
            &["us-gaap:NetCashProvidedByUsedInInvestingActivities"][..],
        ),
        (
            FinancingCashFlow,
            &["us-gaap:NetCashProvidedByUsedInFinancingActivities"][..],
        ),
        (
            CapitalExpenditures,
            &["us-gaap:PaymentsToAcquirePropertyPlantAndEquipment"][..],
        ),
        (
            DepreciationAmortization,
            &[
                "us-gaap:DepreciationDepletionAndAmortization",
                "us-gaap:DepreciationAndAmortization",
                "us-gaap:Depreciation",
            ][..],
        ),
        (
            ShareBasedCompensation,
            &["us-gaap:ShareBasedCompensation"][..],
        ),
        (
            DividendsPaid,
            &[
                "us-gaap:PaymentsOfDividends",
                "us-gaap:PaymentsOfDividendsCommonStock",
            ][..],
        ),
        (
            ComprehensiveIncome,
            &["us-gaap:ComprehensiveIncomeNetOfTax"][..],
        ),
    ]
}

/// Shipped per-filer overrides: (cik, source concept, canonical).
fn default_filer_overrides() -> Vec<(&'static str, &'static str, CanonicalConcept)> {
    vec![
        // Tesla tags automotive revenue under its own namespace
        ("1318605", "tsla:AutomotiveRevenue", CanonicalConcept::Revenue),
        ("1318605", "tsla:AutomotiveSalesRevenue", CanonicalConcept::Revenue),
        (
            "1318605",
            "tsla:AutomotiveCostOfRevenue",
            CanonicalConcept::CostOfRevenue,
        ),
    ]
}

/// Default industry rules. Treated as configuration: callers can replace
/// them wholesale at startup through the global registry.
fn default_industry_rules() -> Vec<IndustryRule> {
    vec![
        IndustryRule {
            name: "bank-noninterest-income".to_string(),
            priority: 130,
            industry_hints: vec![
                "bank".to_string(),
                "thrift".to_string(),
                "capital markets".to_string(),
            ],
            select_any: vec!["us-gaap:NoninterestIncome".to_string()],
            target: CanonicalConcept::OtherIncomeExpense,
            not_applicable: vec![
                CanonicalConcept::CostOfRevenue,
                CanonicalConcept::GrossProfit,
                CanonicalConcept::ResearchAndDevelopment,
                CanonicalConcept::OperatingIncome,
            ],
        },
        IndustryRule {
            name: "general-other-income".to_string(),
            priority: 120,
            industry_hints: Vec::new(),
            select_any: vec![
                "us-gaap:OtherNonoperatingIncomeExpense".to_string(),
                "us-gaap:OtherOperatingIncomeExpenseNet".to_string(),
            ],
            target: CanonicalConcept::OtherIncomeExpense,
            not_applicable: Vec::new(),
        },
    ]
}
