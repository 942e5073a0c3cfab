//! End-to-end pipeline properties: raw line in, vault outcome out.

use std::sync::Arc;

use entropy_engine::chaos::{ChaosGenerator, HANDSHAKE};
use entropy_engine::models::{PersistenceOutcome, VaultRecord};
use entropy_engine::pipeline::{PipelineError, REASON_ODD_TIMESTAMP};
use entropy_engine::session::{LineOutcome, Session};
use entropy_engine::vault::{MemoryVault, VaultSink, VAULT_REJECT_ODD};

const KEY: &str = "integration-secret";

async fn run_line(
    session: &mut Session,
    vault: &Arc<MemoryVault>,
    line: &str,
) -> Option<PersistenceOutcome> {
    match session.handle_line(line) {
        LineOutcome::Signed(signed) => Some(
            vault
                .store(VaultRecord::from(&signed))
                .await
                .expect("memory vault never errors"),
        ),
        _ => None,
    }
}

#[tokio::test]
async fn nan_line_is_predicted_signed_and_persisted() {
    let mut session = Session::new(KEY).unwrap();
    session.seed_history(&[100.0, 102.0, 104.0]);
    let vault = Arc::new(MemoryVault::new());

    let outcome = run_line(&mut session, &vault, "1706000000000|NaN|abc123")
        .await
        .expect("even timestamp should reach the vault");

    assert!(matches!(outcome, PersistenceOutcome::Accepted { .. }));
    let stored = vault.records();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].timestamp, 1706000000000);
    assert!((stored[0].price - 106.0).abs() < 1e-9);
    assert!(stored[0].is_repaired);
    assert_eq!(stored[0].signature.len(), 64);
}

#[tokio::test]
async fn merged_line_is_split_and_persisted() {
    let mut session = Session::new(KEY).unwrap();
    let vault = Arc::new(MemoryVault::new());

    let outcome = run_line(&mut session, &vault, "1706000000000101.50|abc123")
        .await
        .expect("even timestamp should reach the vault");

    assert!(matches!(outcome, PersistenceOutcome::Accepted { .. }));
    let stored = vault.records();
    assert_eq!(stored[0].timestamp, 1706000000000);
    assert!((stored[0].price - 101.50).abs() < 1e-9);
    assert!(stored[0].is_repaired);
}

#[tokio::test]
async fn clean_odd_line_never_reaches_the_vault() {
    let mut session = Session::new(KEY).unwrap();
    let vault = Arc::new(MemoryVault::new());

    assert_eq!(
        session.handle_line("1706000000001|101.50|abc123"),
        LineOutcome::Dropped(PipelineError::ValidationRejected {
            reason: REASON_ODD_TIMESTAMP
        })
    );
    assert!(vault.is_empty());
}

#[tokio::test]
async fn vault_applies_the_parity_rule_independently() {
    // A record that somehow bypasses the validation gate still bounces off
    // the vault's own check.
    let vault = MemoryVault::new();
    let outcome = vault
        .store(VaultRecord {
            timestamp: 1706000000001,
            price: 101.5,
            hash: "abc123".to_string(),
            is_repaired: false,
            signature: "deadbeef".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        PersistenceOutcome::Rejected {
            reason: VAULT_REJECT_ODD.to_string()
        }
    );
}

#[tokio::test]
async fn a_chaotic_session_survives_and_persists_even_records() {
    let mut session = Session::new(KEY).unwrap();
    let vault = Arc::new(MemoryVault::new());
    let mut generator = ChaosGenerator::seeded(1234);

    assert_eq!(session.handle_line(HANDSHAKE), LineOutcome::Ignored);

    let mut accepted = 0usize;
    for i in 0..200 {
        let line = generator.line_at(1706000000000 + i);
        if let Some(PersistenceOutcome::Accepted { .. }) =
            run_line(&mut session, &vault, &line).await
        {
            accepted += 1;
        }
    }

    // parity gate drops the odd half; everything accepted must be even
    assert!(accepted > 0);
    assert_eq!(vault.len(), accepted);
    assert!(vault.records().iter().all(|r| r.timestamp % 2 == 0));

    let stats = session.stats();
    assert_eq!(stats.repair_failures, 0, "chaos lines are never malformed");
    assert_eq!(stats.accepted as usize, accepted);
    assert!(stats.rejected_odd > 0);
}

#[tokio::test]
async fn sessions_are_fully_independent() {
    let mut a = Session::new(KEY).unwrap();
    let mut b = Session::new(KEY).unwrap();
    a.seed_history(&[100.0, 102.0, 104.0]);
    // b has no history: its prediction falls back to the baseline

    let line = "1706000000000|NaN|abc123";
    match (a.handle_line(line), b.handle_line(line)) {
        (LineOutcome::Signed(from_a), LineOutcome::Signed(from_b)) => {
            assert!((from_a.record.price - 106.0).abs() < 1e-9);
            assert!((from_b.record.price - 100.0).abs() < 1e-9);
        }
        other => panic!("expected two signed records, got {:?}", other),
    }
}
