//! Error types for XBRL parsing.

use thiserror::Error;

/// Result type for XBRL operations.
pub type Result<T> = std::result::Result<T, XbrlError>;

/// Fatal errors that abort parsing of a filing.
///
/// Recoverable conditions (dangling arcs, unparseable facts) are collected
/// as [`ParseWarning`] values on the parse result instead.
#[derive(Debug, Error)]
pub enum XbrlError {
    /// Duplicate or contradictory concept declaration in the schema
    #[error("schema conflict: concept {concept} declared more than once")]
    SchemaConflict {
        /// Normalized concept identifier
        concept: String,
    },

    /// Structurally invalid XML in a schema, linkbase, or instance
    #[error("XML parse error in {document}: {message}")]
    XmlParse {
        /// Which document failed (schema, instance, linkbase role)
        document: &'static str,
        /// Underlying reader error
        message: String,
    },

    /// The instance references no parseable contexts at all
    #[error("instance contains no usable contexts")]
    NoContexts,

    /// A required input was not provided
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    /// Polars error during materialization
    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
}

/// Non-fatal conditions recorded while parsing a filing.
///
/// Warnings never abort a parse; they are accumulated and surfaced on the
/// resulting [`ParsedFiling`](crate::ParsedFiling).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseWarning {
    /// An arc referenced a concept that is not in the registry
    #[error("dangling arc in {role}: {from} -> {to}")]
    DanglingArc {
        /// Role URI of the network
        role: String,
        /// Source locator or concept
        from: String,
        /// Target locator or concept
        to: String,
    },

    /// A presentation or calculation network contained a cycle
    #[error("cycle in {role} broken at {concept}")]
    LinkbaseCycle {
        /// Role URI of the network
        role: String,
        /// Concept at which the cycle was broken
        concept: String,
    },

    /// A fact value could not be parsed as a number
    #[error("unparseable fact {concept}: {reason}")]
    FactParseError {
        /// Normalized concept identifier
        concept: String,
        /// Why parsing failed
        reason: String,
    },

    /// A context was malformed and dropped along with its facts
    #[error("invalid context {id}: {reason}")]
    ContextInvalid {
        /// Context id from the instance
        id: String,
        /// Why the context was dropped
        reason: String,
    },

    /// A schema element declaration was skipped
    #[error("skipped schema element: {reason}")]
    ElementSkipped {
        /// Why the element was skipped
        reason: String,
    },

    /// A presentation role could not be classified as a statement type
    #[error("unclassifiable role {role}; exposed as Other")]
    UnknownStatementType {
        /// Role URI that failed classification
        role: String,
    },

    /// Period deduplication during stitching required a tiebreak
    #[error("stitch conflict for period {period_key}: {resolution}")]
    StitchConflict {
        /// Period-end key that collided
        period_key: String,
        /// How the conflict was resolved
        resolution: String,
    },

    /// A filing was skipped during stitching
    #[error("filing {accession} skipped: {reason}")]
    FilingSkipped {
        /// Accession number of the skipped filing
        accession: String,
        /// Why it was skipped
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XbrlError::SchemaConflict {
            concept: "us-gaap:Assets".to_string(),
        };
        assert!(err.to_string().contains("us-gaap:Assets"));
    }

    #[test]
    fn test_warning_display() {
        let warn = ParseWarning::DanglingArc {
            role: "http://example.com/role/BalanceSheet".to_string(),
            from: "us-gaap:Assets".to_string(),
            to: "abc:Missing".to_string(),
        };
        assert!(warn.to_string().contains("abc:Missing"));
    }
}
