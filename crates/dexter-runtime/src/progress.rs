use std::sync::{
    atomic::{AtomicU64, Ordering},
    LazyLock,
};

use regex::Regex;

use dexter_events::OperationId;

/// Generates a unique operation ID.
pub fn next_op_id() -> OperationId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d{1,3}(?:[.,]\d+)?)\s*%").unwrap());

/// Extracts a percentage from a line of child-process output, normalizing a
/// locale comma decimal separator and clamping to `[0, 100]`.
pub fn parse_percent(line: &str) -> Option<f32> {
    let captures = PERCENT_RE.captures(line)?;
    let raw = captures.get(1)?.as_str().replace(',', ".");
    let value: f32 = raw.parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}
