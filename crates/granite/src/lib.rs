#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/graniteworks/granite/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod facts;

// Re-export the sub-crates under short names
pub use granite_statements as statements;
pub use granite_xbrl as xbrl;

// Re-export the types most callers touch
pub use facts::{FilingFacts, StatementStitcher};
pub use granite_statements::{
    CanonicalConcept, Statement, StatementOptions, StatementError,
};
pub use granite_xbrl::{
    FactQuery, FilingSource, FiscalMetadata, FiscalPeriod, ParsedFiling, PeriodView,
    ReportingPeriod, StatementType,
};

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
