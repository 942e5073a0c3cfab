//! Entropy Engine
//!
//! Corruption-tolerant repair and validation pipeline for a deliberately
//! noisy telemetry stream, plus the chaos generator it feeds on and the
//! vault boundary it persists through.

pub mod chaos;
pub mod consumer;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod vault;
