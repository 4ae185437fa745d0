//! Calculation weight reconciliation.
//!
//! Elements like `IncreaseDecreaseInInventories` are reported positive on
//! the instance but flow into cash-flow subtotals with weight −1. After
//! facts load, this pass negates the stored values of every
//! negative-weight calculation target so statements display values
//! consistent with the flow a reader expects. The fact store records which
//! concepts were adjusted; re-running the pass is a no-op.

use granite_xbrl::ParsedFiling;
use tracing::debug;

/// Apply negative calculation-arc weights to stored fact values.
///
/// Returns how many concepts were negated in this run.
pub fn reconcile_weights(filing: &mut ParsedFiling) -> usize {
    let negative_targets: Vec<String> = filing
        .linkbases()
        .calculation
        .iter()
        .flat_map(|network| network.arcs())
        .filter(|arc| arc.weight < 0.0)
        .filter_map(|arc| filing.registry().by_index(arc.child))
        .map(|concept| concept.id.clone())
        .collect();

    let mut negated = 0;
    for concept in negative_targets {
        if filing.store_mut().negate_concept_values(&concept) {
            debug!(concept = %concept, "negated values for negative-weight target");
            negated += 1;
        }
    }
    negated
}
