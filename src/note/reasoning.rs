//! Isolating the final answer from visible chain-of-thought.

use crate::config::THINK_DELIMITER;

/// Everything after the *last* end-of-reasoning delimiter, trimmed.
///
/// A raw output with no delimiter is already a final answer and is returned
/// whole (trimmed) — absence of the delimiter is defined behavior, not an
/// error.
pub fn extract_final_answer(raw: &str) -> &str {
    match raw.rfind(THINK_DELIMITER) {
        Some(idx) => raw[idx + THINK_DELIMITER.len()..].trim(),
        None => raw.trim(),
    }
}
