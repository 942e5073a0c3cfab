//! Structural repairer and repair orchestrator.

use tracing::debug;

use super::classify::{classify, CorruptionClass};
use super::history::HistoryWindow;
use super::predict::predict_next;
use super::PipelineError;

/// Millisecond epoch timestamps are exactly 13 digits wide; merged
/// corruption loses only the delimiter, so the split offset is fixed.
const MERGED_TS_WIDTH: usize = 13;

/// A record with every field reconstructed. By construction `price` is
/// finite and `timestamp` is a positive integer.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedRecord {
    pub timestamp: i64,
    pub price: f64,
    pub integrity_hash: String,
    pub was_repaired: bool,
}

/// Policy knobs for the repair engine.
#[derive(Debug, Clone, Copy)]
pub struct RepairPolicy {
    /// Feed predicted prices back into the history window. On by default
    /// to match the reference behavior; runs of consecutive corrupt
    /// records can compound drift while this is enabled.
    pub feed_predictions: bool,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self {
            feed_predictions: true,
        }
    }
}

/// Split a merged `<ts><price>` token at the fixed timestamp width.
///
/// A token shorter than 14 characters, or one whose halves do not parse,
/// is a repair failure: no field is ever fabricated.
pub fn split_merged(token: &str) -> Result<(i64, f64), PipelineError> {
    let (ts_part, price_part) = match (token.get(..MERGED_TS_WIDTH), token.get(MERGED_TS_WIDTH..)) {
        (Some(ts), Some(price)) if !price.is_empty() => (ts, price),
        _ => {
            return Err(PipelineError::RepairFailure(format!(
                "merged token too short for a {}-digit timestamp: {:?}",
                MERGED_TS_WIDTH, token
            )))
        }
    };

    let timestamp = parse_timestamp(ts_part)?;
    let price: f64 = price_part.parse().map_err(|_| {
        PipelineError::RepairFailure(format!("merged price does not parse: {:?}", price_part))
    })?;
    if !price.is_finite() {
        return Err(PipelineError::RepairFailure(format!(
            "merged price is not finite: {:?}",
            price_part
        )));
    }

    Ok((timestamp, price))
}

fn parse_timestamp(text: &str) -> Result<i64, PipelineError> {
    match text.parse::<i64>() {
        Ok(ts) if ts > 0 => Ok(ts),
        _ => Err(PipelineError::RepairFailure(format!(
            "timestamp does not parse as a positive integer: {:?}",
            text
        ))),
    }
}

/// Repair orchestrator: dispatches on the corruption class and holds the
/// only mutable handle to the session's history window.
#[derive(Debug)]
pub struct RepairEngine {
    history: HistoryWindow,
    policy: RepairPolicy,
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RepairEngine {
    pub fn new() -> Self {
        Self::with_policy(RepairPolicy::default())
    }

    pub fn with_policy(policy: RepairPolicy) -> Self {
        Self {
            history: HistoryWindow::new(),
            policy,
        }
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Pre-load the window with already-trusted prices (warm starts, tests).
    pub fn seed_history(&mut self, prices: &[f64]) {
        for &price in prices {
            self.history.push(price);
        }
    }

    /// Process one raw line into a repaired record or a typed failure.
    /// The history window is the only state this mutates.
    pub fn process(&mut self, raw: &str) -> Result<RepairedRecord, PipelineError> {
        let record = classify(raw);

        match record.class {
            CorruptionClass::Clean => {
                let timestamp = parse_timestamp(record.tokens[0])?;
                // classifier already proved this token is a finite number
                let price: f64 = record.tokens[1].parse().map_err(|_| {
                    PipelineError::RepairFailure(format!(
                        "clean price does not parse: {:?}",
                        record.tokens[1]
                    ))
                })?;
                self.history.push(price);
                Ok(RepairedRecord {
                    timestamp,
                    price,
                    integrity_hash: record.tokens[2].to_string(),
                    was_repaired: false,
                })
            }
            CorruptionClass::PriceMissing => {
                let timestamp = parse_timestamp(record.tokens[0])?;
                let price = predict_next(&self.history);
                debug!(timestamp, price, "price rotted to NaN, regression engaged");
                if self.policy.feed_predictions {
                    self.history.push(price);
                }
                Ok(RepairedRecord {
                    timestamp,
                    price,
                    integrity_hash: record.tokens[2].to_string(),
                    was_repaired: true,
                })
            }
            CorruptionClass::FieldsMerged => {
                let (timestamp, price) = split_merged(record.tokens[0])?;
                debug!(timestamp, price, "merged packet split at fixed offset");
                self.history.push(price);
                Ok(RepairedRecord {
                    timestamp,
                    price,
                    integrity_hash: record.tokens[1].to_string(),
                    was_repaired: true,
                })
            }
            CorruptionClass::Malformed => Err(PipelineError::RepairFailure(format!(
                "unrecognized record shape: {:?}",
                raw
            ))),
        }
    }
}
