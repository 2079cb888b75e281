//! Value coercion and option-string handling.
//!
//! Field setters accept loosely typed operator input (CLI strings, raw
//! records) and normalize it into the canonical typed representation:
//! booleans from common string/int spellings, ordered lists from
//! comma/space-delimited strings, and option maps from
//! `key=value key2` strings. The reverse direction,
//! [`options_to_string`], produces the kernel-command-line form.

use bootforge_types::{ForgeError, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Coerce a raw value into a boolean.
///
/// Accepts real booleans, 0/1 integers, and the usual string spellings
/// (`true`/`false`, `yes`/`no`, `y`/`n`, `on`/`off`, `1`/`0`).
pub fn coerce_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ForgeError::Validation(format!(
                "Cannot interpret {} as a boolean",
                n
            ))),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Ok(true),
            "false" | "no" | "n" | "off" | "0" => Ok(false),
            other => Err(ForgeError::Validation(format!(
                "Cannot interpret '{}' as a boolean",
                other
            ))),
        },
        other => Err(ForgeError::Validation(format!(
            "Cannot interpret {} as a boolean",
            other
        ))),
    }
}

/// Parse a list-valued field.
///
/// Arrays pass through; strings split on commas and/or whitespace with
/// empties dropped, preserving order.
pub fn parse_string_list(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                other => Ok(other.to_string()),
            })
            .collect(),
        Value::String(s) => Ok(s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|tok| !tok.is_empty())
            .map(|tok| tok.to_string())
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ForgeError::Validation(format!(
            "Expected a list or delimited string, got {}",
            other
        ))),
    }
}

/// Parse a mapping-valued field (kernel options, metadata).
///
/// Objects pass through; strings are whitespace-separated
/// `key=value` tokens, where a bare `key` maps to null. Duplicate keys
/// collect their values into an array.
pub fn parse_option_map(value: &Value) -> Result<IndexMap<String, Value>> {
    match value {
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Null => Ok(IndexMap::new()),
        Value::String(s) => {
            let mut map: IndexMap<String, Value> = IndexMap::new();
            for token in s.split_whitespace() {
                let (key, val) = match token.split_once('=') {
                    Some((k, v)) => (k.to_string(), Value::String(v.to_string())),
                    None => (token.to_string(), Value::Null),
                };
                if key.is_empty() {
                    return Err(ForgeError::Validation(format!(
                        "Malformed option token '{}'",
                        token
                    )));
                }
                match map.entry(key) {
                    indexmap::map::Entry::Occupied(mut entry) => match entry.get_mut() {
                        Value::Array(items) => items.push(val),
                        existing => {
                            let prior = existing.take();
                            *existing = Value::Array(vec![prior, val]);
                        }
                    },
                    indexmap::map::Entry::Vacant(entry) => {
                        entry.insert(val);
                    }
                }
            }
            Ok(map)
        }
        other => Err(ForgeError::Validation(format!(
            "Expected a mapping or option string, got {}",
            other
        ))),
    }
}

/// Render an option map as a single `key=value key2='two words'` string,
/// the form kernel command lines expect.
///
/// Null values render as a bare key, arrays repeat the key per element,
/// and values containing whitespace are single-quoted.
pub fn options_to_string(map: &IndexMap<String, Value>) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => parts.push(key.clone()),
            Value::Array(items) => {
                for item in items {
                    parts.push(format!("{}={}", key, quote_scalar(item)));
                }
            }
            other => parts.push(format!("{}={}", key, quote_scalar(other))),
        }
    }
    parts.join(" ")
}

fn quote_scalar(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if text.chars().any(char::is_whitespace) {
        format!("'{}'", text)
    } else {
        text
    }
}

/// Render any raw value as display text for reports and templates.
pub fn value_to_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_display)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(map) => {
            let as_index: IndexMap<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            options_to_string(&as_index)
        }
        other => other.to_string(),
    }
}
