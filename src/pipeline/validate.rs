//! Validation gate.

use super::repair::RepairedRecord;
use super::PipelineError;

/// Rejection reason surfaced to callers and counted by the session.
pub const REASON_ODD_TIMESTAMP: &str = "ODD_TIMESTAMP";

/// A repaired record that cleared the acceptance rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub record: RepairedRecord,
}

/// Acceptance rule: even millisecond timestamps only.
///
/// This is opaque protocol policy. It drops roughly half of otherwise-valid
/// records and is reproduced exactly; the vault applies the same rule again
/// on its side before insert. Price finiteness and timestamp positivity are
/// already guaranteed upstream, so nothing else is checked here.
pub fn validate(record: RepairedRecord) -> Result<ValidatedRecord, PipelineError> {
    if record.timestamp % 2 != 0 {
        return Err(PipelineError::ValidationRejected {
            reason: REASON_ODD_TIMESTAMP,
        });
    }
    Ok(ValidatedRecord { record })
}
