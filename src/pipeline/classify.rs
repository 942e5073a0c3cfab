//! Corruption classifier.
//!
//! First stage of the pipeline: inspect a raw pipe-delimited line and assign
//! exactly one corruption class. Total over all inputs, never panics, no
//! side effects.

/// How a raw record deviates from the clean `ts|price|hash` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionClass {
    /// Three fields and the price parses as a finite number.
    Clean,
    /// Three fields but the price is the literal `NaN` marker.
    PriceMissing,
    /// Two fields: the delimiter between timestamp and price was lost and
    /// both landed in one token.
    FieldsMerged,
    /// Anything else. The chaos generator never produces this shape, but
    /// real feeds do, so the branch must exist.
    Malformed,
}

/// A raw line plus its class and split tokens, ready for dispatch.
#[derive(Debug, Clone)]
pub struct ClassifiedRecord<'a> {
    pub raw: &'a str,
    pub class: CorruptionClass,
    pub tokens: Vec<&'a str>,
}

/// Classify one raw line. Rules apply in priority order; every input maps
/// to exactly one class.
pub fn classify(raw: &str) -> ClassifiedRecord<'_> {
    let tokens: Vec<&str> = raw.split('|').collect();

    let class = match tokens.as_slice() {
        [_, price, _] => match price.parse::<f64>() {
            Ok(p) if p.is_finite() => CorruptionClass::Clean,
            _ if *price == "NaN" => CorruptionClass::PriceMissing,
            _ => CorruptionClass::Malformed,
        },
        [_, _] => CorruptionClass::FieldsMerged,
        _ => CorruptionClass::Malformed,
    };

    ClassifiedRecord { raw, class, tokens }
}
