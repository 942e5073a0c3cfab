//! Chaos generator: manufactures deliberately corrupted telemetry lines.
//!
//! Transport-side simulator of real-world data decay. Every tick produces
//! one `ts|price|hash` line; 10% lose the first delimiter (merged packet)
//! and the next 5% rot the price into a literal `NaN`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Handshake line sent before any telemetry on a new stream. Consumers
/// must skip it rather than classify it.
pub const HANDSHAKE: &str = "PROTOCOL_INIT|V1|ENTROPY_ENGINE";

const MERGED_RATE: f64 = 0.10;
const NAN_RATE: f64 = 0.05;
const HASH_LEN: usize = 9;

pub struct ChaosGenerator {
    rng: ChaCha8Rng,
}

impl Default for ChaosGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChaosGenerator {
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    /// Seeded variant so corruption ratios are reproducible in tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One telemetry line for the current wall clock.
    pub fn next_line(&mut self) -> String {
        self.line_at(now_ms())
    }

    /// One telemetry line for an explicit millisecond timestamp.
    pub fn line_at(&mut self, timestamp: i64) -> String {
        let base = 100.0 + (timestamp as f64 / 1000.0).sin() * 50.0;
        let noise = self.rng.gen_range(-5.0..5.0);
        let price = format!("{:.2}", base + noise);
        let hash = self.mock_hash();

        let roll: f64 = self.rng.gen();
        if roll < MERGED_RATE {
            // poison packet: delimiter between timestamp and price lost
            format!("{timestamp}{price}|{hash}")
        } else if roll < MERGED_RATE + NAN_RATE {
            // rotted price
            format!("{timestamp}|NaN|{hash}")
        } else {
            format!("{timestamp}|{price}|{hash}")
        }
    }

    fn mock_hash(&mut self) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        (0..HASH_LEN)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
