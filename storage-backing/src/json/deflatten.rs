// SPDX-License-Identifier: GPL-3.0-only

//! Normalize dotted keys (`"file.driver"`) into nested objects.

use serde_json::{Map, Value};

/// Expand dotted keys at every level, then turn objects keyed `"0".."n-1"`
/// into arrays.
pub(super) fn deflatten(value: Value) -> Result<Value, String> {
    let nested = expand_keys(value)?;
    Ok(numbered_to_arrays(nested))
}

fn expand_keys(value: Value) -> Result<Value, String> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                insert_path(&mut out, &key, expand_keys(value)?)?;
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .into_iter()
            .map(expand_keys)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

fn insert_path(out: &mut Map<String, Value>, key: &str, value: Value) -> Result<(), String> {
    let Some((head, tail)) = key.split_once('.') else {
        return merge(out, key, value);
    };
    if head.is_empty() || tail.is_empty() {
        return Err(format!("invalid key '{key}'"));
    }

    match out
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(inner) => insert_path(inner, tail, value),
        _ => Err(format!("key '{head}' is both a value and an object")),
    }
}

fn merge(out: &mut Map<String, Value>, key: &str, value: Value) -> Result<(), String> {
    if !out.contains_key(key) {
        out.insert(key.to_string(), value);
        return Ok(());
    }

    match (out.get_mut(key), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (inner_key, inner_value) in incoming {
                merge(existing, &inner_key, inner_value)?;
            }
            Ok(())
        }
        _ => Err(format!("duplicate key '{key}'")),
    }
}

fn numbered_to_arrays(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut map: Map<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, numbered_to_arrays(value)))
                .collect();
            let numbered =
                !map.is_empty() && (0..map.len()).all(|idx| map.contains_key(&idx.to_string()));
            if numbered {
                Value::Array(
                    (0..map.len())
                        .filter_map(|idx| map.remove(&idx.to_string()))
                        .collect(),
                )
            } else {
                Value::Object(map)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(numbered_to_arrays).collect()),
        other => other,
    }
}
