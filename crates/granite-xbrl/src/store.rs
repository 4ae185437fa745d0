//! Indexed fact storage.
//!
//! Built once per filing from the parsed instance; indexes facts by concept,
//! period key, statement type, and dimension so the query layer never scans
//! the full fact list.

use crate::concept::{ConceptRegistry, normalize_concept_id};
use crate::error::ParseWarning;
use crate::fact::{Context, Fact, StatementType, Unit};
use crate::instance::XbrlInstance;
use crate::linkbase::{LabelRole, LabelSet};
use crate::period::ReportingPeriod;
use crate::query::FactQuery;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// The label forms a concept can carry, denormalized for query matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptLabels {
    /// Standard label
    pub standard: Option<String>,
    /// Terse label
    pub terse: Option<String>,
    /// Verbose label
    pub verbose: Option<String>,
    /// Documentation text
    pub documentation: Option<String>,
}

impl ConceptLabels {
    /// All non-null label forms.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        [
            self.standard.as_deref(),
            self.terse.as_deref(),
            self.verbose.as_deref(),
            self.documentation.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Indexed collection of every fact in a filing.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    facts: Vec<Fact>,
    contexts: HashMap<String, Context>,
    units: HashMap<String, Unit>,
    periods: Vec<ReportingPeriod>,
    by_concept: HashMap<String, Vec<usize>>,
    by_period: HashMap<String, Vec<usize>>,
    by_statement: HashMap<StatementType, Vec<usize>>,
    by_dimension: HashMap<String, HashMap<String, Vec<usize>>>,
    statement_of_concept: HashMap<String, StatementType>,
    labels: HashMap<String, ConceptLabels>,
    sign_adjusted: HashSet<String>,
}

impl FactStore {
    /// Build the store from a parsed instance.
    ///
    /// Facts whose concept is registered with a period type that contradicts
    /// their context (an instant concept in a duration context or vice versa)
    /// are dropped with a warning.
    pub fn build(
        instance: XbrlInstance,
        registry: &ConceptRegistry,
        labels: &LabelSet,
        warnings: &mut Vec<ParseWarning>,
    ) -> Self {
        let mut store = Self {
            periods: instance.periods(),
            contexts: instance.contexts,
            units: instance.units,
            ..Self::default()
        };

        for fact in instance.facts {
            let context = &store.contexts[&fact.context_ref];
            if let Some(concept) = registry.get(&fact.concept) {
                let matches_period = match concept.period_type {
                    crate::concept::PeriodType::Instant => context.period.is_instant(),
                    crate::concept::PeriodType::Duration => context.period.is_duration(),
                };
                if !matches_period {
                    warn!(concept = %fact.concept, context = %fact.context_ref,
                        "fact period kind contradicts concept period type");
                    warnings.push(ParseWarning::FactParseError {
                        concept: fact.concept.clone(),
                        reason: "period kind contradicts declared period type".to_string(),
                    });
                    continue;
                }
            }

            let idx = store.facts.len();
            store
                .by_concept
                .entry(fact.concept.clone())
                .or_default()
                .push(idx);
            store
                .by_period
                .entry(context.period.key())
                .or_default()
                .push(idx);
            for dim in &context.segment {
                store
                    .by_dimension
                    .entry(dim.axis.clone())
                    .or_default()
                    .entry(dim.member.clone())
                    .or_default()
                    .push(idx);
            }
            store.facts.push(fact);
        }

        // denormalize label forms by concept id for query matching
        for concept in registry.iter() {
            let Some(idx) = registry.index_of(&concept.id) else {
                continue;
            };
            let entry = ConceptLabels {
                standard: labels.standard(idx).map(String::from),
                terse: labels.text(idx, &LabelRole::Terse).map(String::from),
                verbose: labels.text(idx, &LabelRole::Verbose).map(String::from),
                documentation: labels.documentation(idx).map(String::from),
            };
            if entry != ConceptLabels::default() {
                store.labels.insert(concept.id.clone(), entry);
            }
        }

        store
    }

    /// All facts in document order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Fact by internal index.
    pub(crate) fn fact(&self, idx: usize) -> &Fact {
        &self.facts[idx]
    }

    /// Context by id.
    pub fn context(&self, id: &str) -> Option<&Context> {
        self.contexts.get(id)
    }

    /// Unit by id.
    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Distinct reporting periods, oldest first.
    pub fn periods(&self) -> &[ReportingPeriod] {
        &self.periods
    }

    /// Reporting period by key.
    pub fn period_by_key(&self, key: &str) -> Option<&ReportingPeriod> {
        self.periods.iter().find(|p| p.key() == key)
    }

    /// Label forms for a concept id.
    pub fn labels_for(&self, concept: &str) -> Option<&ConceptLabels> {
        self.labels.get(&normalize_concept_id(concept))
    }

    /// Dimension axes present in the instance, with their members.
    pub fn dimensions(&self) -> impl Iterator<Item = (&str, impl Iterator<Item = &str>)> {
        self.by_dimension
            .iter()
            .map(|(axis, members)| (axis.as_str(), members.keys().map(String::as_str)))
    }

    /// Assign statement types to concepts after role resolution.
    ///
    /// Populates the statement-type index; concepts appearing in several
    /// statements keep the first assignment.
    pub fn assign_statement_types(&mut self, assignment: &HashMap<String, StatementType>) {
        for (concept, statement) in assignment {
            self.statement_of_concept
                .entry(normalize_concept_id(concept))
                .or_insert(*statement);
        }
        self.by_statement.clear();
        for (idx, fact) in self.facts.iter().enumerate() {
            if let Some(statement) = self.statement_of_concept.get(&fact.concept) {
                self.by_statement.entry(*statement).or_default().push(idx);
            }
        }
    }

    /// Statement type a concept was assigned to, if any.
    pub fn statement_type_of(&self, concept: &str) -> Option<StatementType> {
        self.statement_of_concept
            .get(&normalize_concept_id(concept))
            .copied()
    }

    /// Negate the stored values of every fact of a concept.
    ///
    /// Used by the calculation weight reconciler. The raw string form is
    /// synchronized (a `-` is prepended unless it is already negative).
    /// Returns `false` without touching anything if the concept was already
    /// adjusted, making the reconciler idempotent.
    pub fn negate_concept_values(&mut self, concept: &str) -> bool {
        let concept = normalize_concept_id(concept);
        if !self.sign_adjusted.insert(concept.clone()) {
            return false;
        }
        if let Some(indices) = self.by_concept.get(&concept) {
            for &idx in indices {
                let fact = &mut self.facts[idx];
                if let Some(value) = fact.value {
                    fact.value = Some(-value);
                    if !fact.raw.starts_with('-') {
                        fact.raw.insert(0, '-');
                    }
                }
            }
        }
        true
    }

    /// Whether a concept's values have been sign-adjusted.
    pub fn is_sign_adjusted(&self, concept: &str) -> bool {
        self.sign_adjusted.contains(&normalize_concept_id(concept))
    }

    /// Start a query over this store.
    pub fn query(&self) -> FactQuery<'_> {
        FactQuery::new(self)
    }

    /// All facts for a (concept, period) pair.
    pub fn facts_for(&self, concept: &str, period_key: &str) -> Vec<&Fact> {
        let concept = normalize_concept_id(concept);
        self.by_concept
            .get(&concept)
            .into_iter()
            .flatten()
            .map(|&idx| &self.facts[idx])
            .filter(|f| {
                self.contexts
                    .get(&f.context_ref)
                    .is_some_and(|c| c.period.key() == period_key)
            })
            .collect()
    }

    /// The consolidated fact for a (concept, period) pair.
    ///
    /// Prefers the fact whose context has an empty segment; falls back to a
    /// context whose every dimension sits on its default member, as given by
    /// `dimension_defaults` (axis id → default member id).
    pub fn consolidated_fact(
        &self,
        concept: &str,
        period_key: &str,
        dimension_defaults: &HashMap<String, String>,
    ) -> Option<&Fact> {
        let candidates = self.facts_for(concept, period_key);
        if let Some(fact) = candidates.iter().find(|f| {
            self.contexts
                .get(&f.context_ref)
                .is_some_and(Context::is_consolidated)
        }) {
            return Some(fact);
        }
        candidates.into_iter().find(|f| {
            self.contexts.get(&f.context_ref).is_some_and(|c| {
                !c.segment.is_empty()
                    && c.segment.iter().all(|d| {
                        dimension_defaults.get(&d.axis).is_some_and(|m| *m == d.member)
                    })
            })
        })
    }

    pub(crate) fn indices_by_concept(&self, concept: &str) -> Option<&[usize]> {
        self.by_concept
            .get(&normalize_concept_id(concept))
            .map(Vec::as_slice)
    }

    pub(crate) fn indices_by_period(&self, key: &str) -> Option<&[usize]> {
        self.by_period.get(key).map(Vec::as_slice)
    }

    pub(crate) fn indices_by_statement(&self, statement: StatementType) -> Option<&[usize]> {
        self.by_statement.get(&statement).map(Vec::as_slice)
    }

    pub(crate) fn indices_by_dimension(
        &self,
        axis: &str,
        member: Option<&str>,
    ) -> Option<Vec<usize>> {
        let members = self.by_dimension.get(&normalize_concept_id(axis))?;
        match member {
            Some(m) => members.get(&normalize_concept_id(m)).cloned(),
            None => {
                let mut all: Vec<usize> = members.values().flatten().copied().collect();
                all.sort_unstable();
                all.dedup();
                Some(all)
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.facts.len()
    }
}
