//! Error types for statement operations.

use thiserror::Error;

/// Result type for statement operations.
pub type Result<T> = std::result::Result<T, StatementError>;

/// Errors raised by the statement layer.
///
/// Statement building and stitching downgrade to warnings on the resulting
/// object wherever possible; these variants cover the conditions that cannot
/// produce a meaningful result at all.
#[derive(Debug, Error)]
pub enum StatementError {
    /// A mapping configuration file was malformed.
    ///
    /// Fatal at load: running with a silently empty mapping table would
    /// produce statements that look standardized but are not.
    #[error("invalid mapping file: {reason}")]
    MappingFileInvalid {
        /// What was wrong with the file
        reason: String,
    },

    /// Filings from different entities were mixed into one stitch.
    #[error("entity mismatch: expected CIK {expected}, got {actual}")]
    EntityMismatch {
        /// CIK of the first filing seen
        expected: String,
        /// Conflicting CIK
        actual: String,
    },

    /// No filings with structured data were supplied to the stitcher.
    #[error("no stitchable filings: {0}")]
    NoFilings(&'static str),

    /// An underlying XBRL-layer failure.
    #[error(transparent)]
    Xbrl(#[from] granite_xbrl::XbrlError),

    /// Polars error during materialization.
    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
}
