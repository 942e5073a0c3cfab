//! Corruption-tolerant repair and validation pipeline.
//!
//! One raw line flows classify → repair → validate → sign; control never
//! flows backward, and any gate failure short-circuits to a typed outcome.

pub mod classify;
pub mod history;
pub mod predict;
pub mod repair;
pub mod sign;
pub mod validate;

pub use classify::{classify, ClassifiedRecord, CorruptionClass};
pub use history::{HistoryWindow, HISTORY_CAPACITY};
pub use predict::{predict_next, BASELINE_PRICE};
pub use repair::{split_merged, RepairEngine, RepairPolicy, RepairedRecord};
pub use sign::{SignedRecord, Signer};
pub use validate::{validate, ValidatedRecord, REASON_ODD_TIMESTAMP};

/// Per-record failure outcomes. None of these are fatal to the session;
/// the caller logs the drop and keeps feeding the next record.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Structural repair could not extract valid fields; the record is
    /// dropped rather than fabricated.
    RepairFailure(String),
    /// Repaired fine but failed the acceptance rule. Not retryable: the
    /// parity of a timestamp never changes.
    ValidationRejected { reason: &'static str },
    /// The persistence boundary declined the record.
    PersistenceRejected { reason: String },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RepairFailure(detail) => write!(f, "repair failure: {}", detail),
            Self::ValidationRejected { reason } => write!(f, "validation rejected: {}", reason),
            Self::PersistenceRejected { reason } => write!(f, "persistence rejected: {}", reason),
        }
    }
}

impl std::error::Error for PipelineError {}
