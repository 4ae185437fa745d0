#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/graniteworks/granite/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod calculation;
pub mod error;
pub mod periods;
pub mod resolver;
pub mod standardize;
pub mod statement;
pub mod stitch;

pub use builder::{StatementOptions, build_statement};
pub use calculation::reconcile_weights;
pub use error::{Result, StatementError};
pub use periods::{PeriodSelection, select_periods};
pub use resolver::StatementCatalog;
pub use standardize::{CanonicalConcept, IndustryRule, MappingRegistry, standardize_statement};
pub use statement::{ColumnProvenance, Statement, StatementColumn, StatementLine};
pub use stitch::{Prepared, stitch_statements};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
