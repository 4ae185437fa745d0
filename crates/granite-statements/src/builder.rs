//! Statement building.
//!
//! Walks the presentation subtree of the resolved role in document order,
//! pulls the consolidated fact for each selected period, and emits a
//! tabular [`Statement`]. Abstract concepts become labeled heading rows;
//! ordering follows the presentation arcs' `order` attribute.

use crate::periods::select_periods;
use crate::resolver::StatementCatalog;
use crate::standardize::MappingRegistry;
use crate::statement::{Statement, StatementColumn, StatementLine};
use granite_xbrl::{
    LabelRole, ParsedFiling, PeriodClass, PeriodView, PresentationNetwork, StatementType,
};
use std::collections::HashMap;

/// Options controlling statement construction.
#[derive(Debug, Clone, Default)]
pub struct StatementOptions {
    /// Rename and regroup lines onto the canonical vocabulary
    pub standardize: bool,
    /// Cap on the number of period columns
    pub max_periods: Option<usize>,
    /// Show exactly this period key, bypassing selection
    pub period_filter: Option<String>,
    /// Resolve columns through a named preset view, bypassing selection
    pub period_view: Option<PeriodView>,
}

impl StatementOptions {
    /// Options with standardization switched on.
    pub fn standardized() -> Self {
        Self {
            standardize: true,
            ..Self::default()
        }
    }
}

/// Build one statement from a parsed filing.
///
/// Never fails: when the statement type has no resolvable role the result
/// is an empty statement carrying a `reason` annotation.
pub fn build_statement(
    filing: &ParsedFiling,
    catalog: &StatementCatalog,
    statement_type: StatementType,
    options: &StatementOptions,
) -> Statement {
    let Some(role) = catalog.role_for(statement_type) else {
        return Statement::empty(
            statement_type,
            format!("no resolvable role for {}", statement_type.name()),
        );
    };
    let Some(network) = filing.linkbases().presentation_for(role) else {
        return Statement::empty(
            statement_type,
            format!("presentation network missing for role {role}"),
        );
    };

    // period columns
    let (keys, fallback) = if let Some(filter) = &options.period_filter {
        (vec![filter.clone()], false)
    } else if let Some(view) = options.period_view {
        (view.resolve(filing.periods()), false)
    } else {
        let selection = select_periods(
            statement_type,
            filing.metadata(),
            filing.periods(),
            options.max_periods,
        );
        (selection.keys, selection.fallback)
    };
    let columns: Vec<StatementColumn> = keys
        .iter()
        .map(|key| make_column(filing, key))
        .collect();

    // presentation walk
    let mut lines = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();
    let defaults = filing.dimension_defaults();
    for root in network.roots() {
        walk(
            filing, network, &keys, &defaults, root, None, 0, None, &mut lines, &mut parents,
        );
    }

    let mut statement = Statement {
        statement_type: Some(statement_type),
        role: Some(role.to_string()),
        lines,
        columns,
        period_fallback: fallback,
        reason: None,
        warnings: Vec::new(),
    };

    if options.standardize {
        let registry = MappingRegistry::global()
            .read()
            .expect("mapping registry lock poisoned");
        apply_standardization(&mut statement, &parents, filing, &registry);
    }

    statement
}

/// Resolve one period key into a display column.
fn make_column(filing: &ParsedFiling, key: &str) -> StatementColumn {
    let period = filing.store().period_by_key(key).copied();
    let metadata = filing.metadata();
    let fiscal_year = period.map(|p| {
        // the feed's fiscal-year label only describes the filing's own
        // reporting period; comparatives derive theirs from the end date
        let is_primary = metadata.period_of_report == Some(p.end_date());
        if is_primary {
            metadata.fiscal_year.unwrap_or_else(|| p.implied_fiscal_year())
        } else {
            p.implied_fiscal_year()
        }
    });
    let period_label = match (period, fiscal_year) {
        (Some(p), Some(fy)) if p.classification() == PeriodClass::Annual => format!("FY {fy}"),
        (Some(p), _) => p.label(),
        (None, _) => key.to_string(),
    };
    StatementColumn {
        period_key: key.to_string(),
        period_label,
        fiscal_year,
        duration_days: period.and_then(|p| p.duration_days()),
        provenance: None,
    }
}

/// Emit a line for `node` and recurse into its children.
#[allow(clippy::too_many_arguments)]
fn walk(
    filing: &ParsedFiling,
    network: &PresentationNetwork,
    keys: &[String],
    defaults: &HashMap<String, String>,
    node: usize,
    preferred_label: Option<&LabelRole>,
    level: usize,
    parent: Option<usize>,
    lines: &mut Vec<StatementLine>,
    parents: &mut Vec<Option<usize>>,
) {
    let Some(concept) = filing.registry().by_index(node) else {
        return;
    };

    let labels = &filing.linkbases().labels;
    let label = preferred_label
        .and_then(|role| labels.text(node, role))
        .or_else(|| labels.standard(node))
        .map(str::to_string)
        .unwrap_or_else(|| concept.name_as_label());

    let values: Vec<Option<rust_decimal::Decimal>> = if concept.is_abstract {
        vec![None; keys.len()]
    } else {
        keys.iter()
            .map(|key| {
                filing
                    .store()
                    .consolidated_fact(&concept.id, key, defaults)
                    .and_then(|fact| fact.value)
            })
            .collect()
    };

    let line_idx = lines.len();
    lines.push(StatementLine {
        label,
        concept: concept.id.clone(),
        canonical: None,
        level,
        is_abstract: concept.is_abstract,
        values,
    });
    parents.push(parent);

    for arc in network.children_of(node) {
        walk(
            filing,
            network,
            keys,
            defaults,
            arc.child,
            arc.preferred_label.as_ref(),
            level + 1,
            Some(line_idx),
            lines,
            parents,
        );
    }
}

/// Map lines onto the canonical vocabulary.
///
/// Direct mappings run first; a hierarchy pass then lets an unmapped
/// concept inherit its parent's canonical name when it is the parent's
/// only non-abstract child. Fields not-applicable to the filer's industry
/// are left untouched.
fn apply_standardization(
    statement: &mut Statement,
    parents: &[Option<usize>],
    filing: &ParsedFiling,
    registry: &MappingRegistry,
) {
    let metadata = filing.metadata();
    let cik = Some(metadata.cik.as_str());
    let industry = metadata.industry.as_deref();

    for line in &mut statement.lines {
        if line.is_abstract {
            continue;
        }
        if let Some(canonical) = registry.map(&line.concept, cik, industry) {
            line.canonical = Some(canonical);
            line.label = canonical.label().to_string();
        }
    }

    // hierarchy fallback: the unique non-abstract child of a mapped parent
    // inherits that parent's canonical name
    let child_counts: HashMap<usize, usize> =
        parents
            .iter()
            .enumerate()
            .fold(HashMap::new(), |mut counts, (idx, parent)| {
                if let Some(p) = parent
                    && !statement.lines[idx].is_abstract
                {
                    *counts.entry(*p).or_insert(0) += 1;
                }
                counts
            });
    for idx in 0..statement.lines.len() {
        if statement.lines[idx].canonical.is_some() || statement.lines[idx].is_abstract {
            continue;
        }
        let Some(parent) = parents[idx] else { continue };
        let Some(parent_canonical) = statement.lines[parent].canonical else {
            continue;
        };
        if child_counts.get(&parent) != Some(&1) {
            continue;
        }
        if registry.is_not_applicable(parent_canonical, industry) {
            continue;
        }
        statement.lines[idx].canonical = Some(parent_canonical);
        statement.lines[idx].label = parent_canonical.label().to_string();
    }
}
