// src/core/commons.rs

use crate::CancellationToken;
use std::sync::atomic::Ordering;

/// Wraps a value in double quotes, escaping the quotes it already contains.
pub fn wrap_value(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Returns `true` once the interrupt listener has tripped the token.
pub fn is_cancelled(cancellation_token: &CancellationToken) -> bool {
    cancellation_token.load(Ordering::SeqCst)
}
