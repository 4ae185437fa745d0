//! Chainable fact queries.
//!
//! [`FactQuery`] is an immutable builder: every filter returns a new query,
//! and work is only realized by the terminal operations (`iter`, `facts`,
//! `count`, `to_dataframe`). Results are deduplicated by the
//! (concept, context) fact signature.

use crate::error::Result;
use crate::fact::{Context, Fact, StatementType, Unit};
use crate::period::{PeriodView, ReportingPeriod};
use crate::store::FactStore;
use polars::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashSet;

/// Fields a query result can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Numeric value; null values sort last
    Value,
    /// Period end date
    PeriodEnd,
    /// Normalized concept identifier
    Concept,
    /// Standard label, falling back to the concept id
    Label,
}

/// A fact resolved against its context and unit.
#[derive(Debug, Clone)]
pub struct FactView<'a> {
    /// The fact record
    pub fact: &'a Fact,
    /// Its resolved context
    pub context: &'a Context,
    /// Its resolved unit, when the fact is numeric
    pub unit: Option<&'a Unit>,
    /// Statement type the concept was assigned to
    pub statement_type: Option<StatementType>,
    /// Standard label of the concept
    pub label: Option<&'a str>,
}

impl FactView<'_> {
    /// The fact's reporting period.
    pub const fn period(&self) -> &ReportingPeriod {
        &self.context.period
    }
}

/// Immutable, chainable query over a [`FactStore`].
#[derive(Debug, Clone)]
pub struct FactQuery<'a> {
    store: &'a FactStore,
    /// `None` selects everything; otherwise ordered store indices
    selected: Option<Vec<usize>>,
}

impl<'a> FactQuery<'a> {
    pub(crate) fn new(store: &'a FactStore) -> Self {
        Self {
            store,
            selected: None,
        }
    }

    fn current(&self) -> Vec<usize> {
        match &self.selected {
            Some(indices) => indices.clone(),
            None => (0..self.store.len()).collect(),
        }
    }

    fn narrow_to(mut self, keep: &HashSet<usize>) -> Self {
        let narrowed = self
            .current()
            .into_iter()
            .filter(|idx| keep.contains(idx))
            .collect();
        self.selected = Some(narrowed);
        self
    }

    fn retain(mut self, predicate: impl Fn(&Fact, &Context) -> bool) -> Self {
        let store = self.store;
        let narrowed = self
            .current()
            .into_iter()
            .filter(|&idx| {
                let fact = store.fact(idx);
                store
                    .context(&fact.context_ref)
                    .is_some_and(|ctx| predicate(fact, ctx))
            })
            .collect();
        self.selected = Some(narrowed);
        self
    }

    /// Restrict to a concept; accepts either separator form.
    pub fn by_concept(self, concept: &str) -> Self {
        let keep: HashSet<usize> = self
            .store
            .indices_by_concept(concept)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        self.narrow_to(&keep)
    }

    /// Restrict to facts assigned to a statement type.
    pub fn by_statement_type(self, statement: StatementType) -> Self {
        let keep: HashSet<usize> = self
            .store
            .indices_by_statement(statement)
            .into_iter()
            .flatten()
            .copied()
            .collect();
        self.narrow_to(&keep)
    }

    /// Restrict to a single period key.
    pub fn by_period_key(self, key: &str) -> Self {
        self.by_period_keys(std::slice::from_ref(&key))
    }

    /// Restrict to any of a list of period keys.
    pub fn by_period_keys<S: AsRef<str>>(self, keys: &[S]) -> Self {
        let mut keep = HashSet::new();
        for key in keys {
            if let Some(indices) = self.store.indices_by_period(key.as_ref()) {
                keep.extend(indices.iter().copied());
            }
        }
        self.narrow_to(&keep)
    }

    /// Restrict to the periods a named view resolves to.
    pub fn by_period_view(self, view: PeriodView) -> Self {
        let keys = view.resolve(self.store.periods());
        self.by_period_keys(&keys)
    }

    /// Restrict to facts qualified by a dimension axis, optionally to a
    /// specific member.
    pub fn by_dimension(self, axis: &str, member: Option<&str>) -> Self {
        let keep: HashSet<usize> = self
            .store
            .indices_by_dimension(axis, member)
            .into_iter()
            .flatten()
            .collect();
        self.narrow_to(&keep)
    }

    /// Restrict to facts whose concept has any label form containing `text`
    /// (case-insensitive). Concepts without labels never match.
    pub fn by_label(self, text: &str) -> Self {
        let needle = text.to_lowercase();
        let store = self.store;
        self.retain(move |fact, _| {
            store
                .labels_for(&fact.concept)
                .is_some_and(|labels| labels.forms().any(|l| l.to_lowercase().contains(&needle)))
        })
    }

    /// Free-text search across labels, documentation, and the concept id.
    pub fn by_text(self, text: &str) -> Self {
        let needle = text.to_lowercase();
        let store = self.store;
        self.retain(move |fact, _| {
            if fact.concept.to_lowercase().contains(&needle) {
                return true;
            }
            store
                .labels_for(&fact.concept)
                .is_some_and(|labels| labels.forms().any(|l| l.to_lowercase().contains(&needle)))
        })
    }

    /// Restrict to numeric facts whose value satisfies the predicate.
    /// Facts with no numeric value are skipped before the predicate runs.
    pub fn by_value(self, predicate: impl Fn(Decimal) -> bool) -> Self {
        self.retain(move |fact, _| fact.value.is_some_and(&predicate))
    }

    /// Sort the current result set. A no-op when the result set is empty.
    pub fn sort_by(mut self, field: SortField, ascending: bool) -> Self {
        let mut indices = self.current();
        if indices.is_empty() {
            return self;
        }
        let store = self.store;
        indices.sort_by(|&a, &b| {
            let fa = store.fact(a);
            let fb = store.fact(b);
            let ordering = match field {
                SortField::Value => match (fa.value, fb.value) {
                    (Some(va), Some(vb)) => va.cmp(&vb),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                },
                SortField::PeriodEnd => {
                    let pa = store.context(&fa.context_ref).map(|c| c.period.end_date());
                    let pb = store.context(&fb.context_ref).map(|c| c.period.end_date());
                    pa.cmp(&pb)
                }
                SortField::Concept => fa.concept.cmp(&fb.concept),
                SortField::Label => {
                    let la = store
                        .labels_for(&fa.concept)
                        .and_then(|l| l.standard.as_deref())
                        .unwrap_or(&fa.concept);
                    let lb = store
                        .labels_for(&fb.concept)
                        .and_then(|l| l.standard.as_deref())
                        .unwrap_or(&fb.concept);
                    la.cmp(lb)
                }
            };
            if ascending { ordering } else { ordering.reverse() }
        });
        self.selected = Some(indices);
        self
    }

    /// Iterate the results, deduplicated by fact signature.
    pub fn iter(&self) -> impl Iterator<Item = FactView<'a>> + use<'a> {
        let store = self.store;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        self.current().into_iter().filter_map(move |idx| {
            let fact = store.fact(idx);
            let (concept, context_ref) = fact.signature();
            if !seen.insert((concept.to_string(), context_ref.to_string())) {
                return None;
            }
            let context = store.context(&fact.context_ref)?;
            Some(FactView {
                fact,
                context,
                unit: fact.unit_ref.as_deref().and_then(|u| store.unit(u)),
                statement_type: store.statement_type_of(&fact.concept),
                label: store
                    .labels_for(&fact.concept)
                    .and_then(|l| l.standard.as_deref()),
            })
        })
    }

    /// Materialize the results as a vector.
    pub fn facts(&self) -> Vec<FactView<'a>> {
        self.iter().collect()
    }

    /// Number of deduplicated results.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Materialize the results as a polars dataframe.
    ///
    /// Columns: `concept`, `label`, `value`, `unit`, `period_key`,
    /// `period_end`, `statement_type`. Decimal values convert to `f64`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let views = self.facts();
        let mut concepts = Vec::with_capacity(views.len());
        let mut labels: Vec<Option<&str>> = Vec::with_capacity(views.len());
        let mut values: Vec<Option<f64>> = Vec::with_capacity(views.len());
        let mut units: Vec<Option<&str>> = Vec::with_capacity(views.len());
        let mut period_keys = Vec::with_capacity(views.len());
        let mut period_ends = Vec::with_capacity(views.len());
        let mut statements: Vec<Option<&str>> = Vec::with_capacity(views.len());

        for view in &views {
            concepts.push(view.fact.concept.as_str());
            labels.push(view.label);
            values.push(view.fact.value.and_then(|v| v.to_f64()));
            units.push(view.unit.map(|u| u.measure.as_str()));
            period_keys.push(view.period().key());
            period_ends.push(view.period().end_date().to_string());
            statements.push(view.statement_type.map(|s| s.name()));
        }

        let df = DataFrame::new(vec![
            Series::new("concept".into(), concepts).into(),
            Series::new("label".into(), labels).into(),
            Series::new("value".into(), values).into(),
            Series::new("unit".into(), units).into(),
            Series::new("period_key".into(), period_keys).into(),
            Series::new("period_end".into(), period_ends).into(),
            Series::new("statement_type".into(), statements).into(),
        ])?;
        Ok(df)
    }
}
