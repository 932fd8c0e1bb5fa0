//! Defensive access into loosely-typed upstream JSON.
//!
//! Upstream records (ORCID in particular) omit keys, send `null` where an object is expected, or
//! nest values one level deeper than documented. Nothing in here ever fails: a path that doesn't
//! resolve is reported as an empty string or an empty list.

use serde_json::Value;

/// Walk `keys` one object level at a time and return the trimmed string form of what is found.
///
/// Returns `""` when an intermediate value is not an object, when a key is missing, or when the
/// final value is `null`. Strings yield their contents; any other value yields its JSON text.
pub fn nested_value(value: &Value, keys: &[&str]) -> String {
    match nested(value, keys) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

/// Walk `keys` and return the value found, if every step landed on an object holding the key.
pub fn nested<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in keys {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Walk `keys` and return the array found there, or an empty slice for anything else.
pub fn nested_list<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    nested(value, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Parse a string made only of ASCII digits; anything else (including `""`) counts as `0`.
pub fn numeric_or_zero(s: &str) -> i64 {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().unwrap_or(0)
    } else {
        0
    }
}

/// Keep the first occurrence of every string, preserving order.
pub fn dedup_in_place(v: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    v.retain(|x| seen.insert(x.clone()));
}
