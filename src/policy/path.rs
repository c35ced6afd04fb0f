//! Dotted-path lookup into structured values
//!
//! Policies address call arguments and result payloads by dotted paths
//! (`user.email`, `items.0.name`). Lookup is an explicit recursive walk
//! over `serde_json::Value`; a missing path is `None`, distinct from a
//! present value that fails its comparison.

use crate::error::{Error, Result};
use serde_json::Value;

/// Resolve a dotted path against a structured value.
///
/// Mapping segments index objects by key; numeric segments index
/// sequences. Returns `None` as soon as any segment fails to resolve.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        None => resolve_segment(value, path),
        Some((head, rest)) => resolve_segment(value, head).and_then(|v| lookup(v, rest)),
    }
}

fn resolve_segment<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Validate a dotted path at policy-creation time.
///
/// Empty paths and empty segments (leading, trailing, or doubled dots) are
/// configuration errors, rejected before the policy is ever evaluated.
pub fn validate(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::Configuration(
            "argument path must not be empty".to_string(),
        ));
    }
    if path.split('.').any(str::is_empty) {
        return Err(Error::Configuration(format!(
            "argument path '{}' contains an empty segment",
            path
        )));
    }
    Ok(())
}

/// Coerce a value to its string form for operator comparison.
///
/// Strings are unwrapped rather than JSON-quoted so comparisons behave the
/// same regardless of the value's encoded type; everything else uses its
/// compact JSON encoding.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
