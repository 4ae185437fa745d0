#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/graniteworks/granite/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod concept;
pub mod error;
pub mod fact;
pub mod filing;
pub mod instance;
pub mod linkbase;
pub mod period;
pub mod query;
pub mod schema;
pub mod store;
mod xmlutil;

pub use concept::{Balance, Concept, ConceptRegistry, DataType, PeriodType, normalize_concept_id};
pub use error::{ParseWarning, Result, XbrlError};
pub use fact::{Context, DimensionMember, Fact, StatementType, Unit};
pub use filing::{FilingSource, FiscalMetadata, FiscalPeriod, ParsedFiling};
pub use instance::XbrlInstance;
pub use linkbase::{
    CalculationArc, CalculationNetwork, DefinitionArc, DefinitionArcrole, DefinitionNetwork,
    Label, LabelRole, LabelSet, LinkbaseSet, PresentationArc, PresentationNetwork,
};
pub use period::{PeriodClass, PeriodView, ReportingPeriod};
pub use query::{FactQuery, FactView, SortField};
pub use store::{ConceptLabels, FactStore};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
