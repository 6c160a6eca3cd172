//! Key naming conventions: `snake_case` <-> `camelCase`.
//!
//! Matching is ASCII-only and non-overlapping, scanning left to right:
//!
//! - camelize: every `[a-z0-9]_[a-z]` becomes the first char plus the
//!   upper-cased letter (`user_id` -> `userId`).
//! - underscorize: every `[a-z0-9][A-Z]` becomes the first char, `_`, and the
//!   lower-cased letter (`userId` -> `user_id`).
//!
//! Keys without a boundary pass through unchanged. The value transforms build
//! new containers and never touch scalars.

use serde_json::{Map, Value};

const SEPARATOR: char = '_';

fn is_lower_or_digit(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

pub fn camelize_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len()
            && is_lower_or_digit(chars[i])
            && chars[i + 1] == SEPARATOR
            && chars[i + 2].is_ascii_lowercase()
        {
            out.push(chars[i]);
            out.push(chars[i + 2].to_ascii_uppercase());
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

pub fn underscorize_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() && is_lower_or_digit(chars[i]) && chars[i + 1].is_ascii_uppercase() {
            out.push(chars[i]);
            out.push(SEPARATOR);
            out.push(chars[i + 1].to_ascii_lowercase());
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Rewrite every mapping key to `camelCase`, descending into objects and arrays.
pub fn camelize(value: &Value) -> Value {
    rewrite_keys(value, &camelize_key)
}

/// Rewrite every mapping key to `snake_case`, descending into objects and arrays.
pub fn underscorize(value: &Value) -> Value {
    rewrite_keys(value, &underscorize_key)
}

fn rewrite_keys(value: &Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, inner) in map {
                out.insert(rename(key), rewrite_keys(inner, rename));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| rewrite_keys(v, rename)).collect()),
        scalar => scalar.clone(),
    }
}
