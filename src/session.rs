//! Per-connection processing session.
//!
//! One logical inbound stream owns exactly one session: the history window
//! (inside the repair engine) and the signer live here and are never shared
//! across connections. Records are processed to completion in arrival order.

use anyhow::Result;
use tracing::{debug, warn};

use crate::pipeline::{validate, PipelineError, RepairEngine, RepairPolicy, SignedRecord, Signer};

/// Per-session counters, for operator visibility at teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub accepted: u64,
    pub repaired: u64,
    pub rejected_odd: u64,
    pub repair_failures: u64,
}

/// What a single raw line turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Handshake or other control line; not a telemetry record.
    Ignored,
    /// Cleared every gate and carries its signature.
    Signed(SignedRecord),
    /// Dropped at repair or validation; the session stays usable.
    Dropped(PipelineError),
}

pub struct Session {
    engine: RepairEngine,
    signer: Signer,
    stats: SessionStats,
}

impl Session {
    pub fn new(private_key: &str) -> Result<Self> {
        Self::with_policy(private_key, RepairPolicy::default())
    }

    pub fn with_policy(private_key: &str, policy: RepairPolicy) -> Result<Self> {
        Ok(Self {
            engine: RepairEngine::with_policy(policy),
            signer: Signer::new(private_key)?,
            stats: SessionStats::default(),
        })
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Pre-load the history window with trusted prices (tests, warm starts).
    pub fn seed_history(&mut self, prices: &[f64]) {
        self.engine.seed_history(prices);
    }

    /// Run one raw line through classify → repair → validate → sign.
    /// Failures are per-record; a bad line never poisons the next one.
    pub fn handle_line(&mut self, raw: &str) -> LineOutcome {
        if raw.contains("PROTOCOL_INIT") {
            debug!("handshake received, stream live");
            return LineOutcome::Ignored;
        }

        let repaired = match self.engine.process(raw) {
            Ok(record) => record,
            Err(e) => {
                self.stats.repair_failures += 1;
                warn!(error = %e, raw, "record dropped at repair");
                return LineOutcome::Dropped(e);
            }
        };
        if repaired.was_repaired {
            self.stats.repaired += 1;
        }

        let validated = match validate(repaired) {
            Ok(record) => record,
            Err(e) => {
                self.stats.rejected_odd += 1;
                debug!(error = %e, "record rejected at validation");
                return LineOutcome::Dropped(e);
            }
        };

        let signed = self.signer.sign(validated);
        self.stats.accepted += 1;
        LineOutcome::Signed(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::REASON_ODD_TIMESTAMP;

    const KEY: &str = "test-secret";

    #[test]
    fn handshake_is_ignored() {
        let mut session = Session::new(KEY).unwrap();
        assert_eq!(
            session.handle_line("PROTOCOL_INIT|V1|ENTROPY_ENGINE"),
            LineOutcome::Ignored
        );
        assert_eq!(session.stats(), SessionStats::default());
    }

    #[test]
    fn clean_even_record_is_signed() {
        let mut session = Session::new(KEY).unwrap();
        match session.handle_line("1706000000000|101.50|abc123") {
            LineOutcome::Signed(signed) => {
                assert_eq!(signed.record.timestamp, 1706000000000);
                assert!(!signed.record.was_repaired);
                assert_eq!(signed.signature.len(), 64);
            }
            other => panic!("expected signed record, got {:?}", other),
        }
        assert_eq!(session.stats().accepted, 1);
    }

    #[test]
    fn odd_timestamp_is_rejected_despite_valid_data() {
        let mut session = Session::new(KEY).unwrap();
        let outcome = session.handle_line("1706000000001|101.50|abc123");
        assert_eq!(
            outcome,
            LineOutcome::Dropped(PipelineError::ValidationRejected {
                reason: REASON_ODD_TIMESTAMP
            })
        );
        assert_eq!(session.stats().rejected_odd, 1);
        assert_eq!(session.stats().accepted, 0);
    }

    #[test]
    fn nan_record_is_predicted_validated_and_signed() {
        let mut session = Session::new(KEY).unwrap();
        session.seed_history(&[100.0, 102.0, 104.0]);
        match session.handle_line("1706000000000|NaN|abc123") {
            LineOutcome::Signed(signed) => {
                assert!(signed.record.was_repaired);
                assert!((signed.record.price - 106.0).abs() < 1e-9);
            }
            other => panic!("expected signed record, got {:?}", other),
        }
        assert_eq!(session.stats().repaired, 1);
    }

    #[test]
    fn merged_record_is_repaired_end_to_end() {
        let mut session = Session::new(KEY).unwrap();
        match session.handle_line("1706000000000101.50|abc123") {
            LineOutcome::Signed(signed) => {
                assert_eq!(signed.record.timestamp, 1706000000000);
                assert!((signed.record.price - 101.50).abs() < 1e-9);
                assert!(signed.record.was_repaired);
            }
            other => panic!("expected signed record, got {:?}", other),
        }
    }

    #[test]
    fn a_bad_line_does_not_poison_the_session() {
        let mut session = Session::new(KEY).unwrap();
        assert!(matches!(
            session.handle_line("complete garbage"),
            LineOutcome::Dropped(PipelineError::RepairFailure(_))
        ));
        assert!(matches!(
            session.handle_line("1706000000000|101.50|abc123"),
            LineOutcome::Signed(_)
        ));
        assert_eq!(session.stats().repair_failures, 1);
        assert_eq!(session.stats().accepted, 1);
    }

    #[test]
    fn identical_records_sign_identically_within_a_session() {
        let mut session = Session::new(KEY).unwrap();
        let a = session.handle_line("1706000000000|101.50|abc123");
        let b = session.handle_line("1706000000000|101.50|abc123");
        match (a, b) {
            (LineOutcome::Signed(a), LineOutcome::Signed(b)) => {
                assert_eq!(a.signature, b.signature);
            }
            other => panic!("expected two signed records, got {:?}", other),
        }
    }
}
