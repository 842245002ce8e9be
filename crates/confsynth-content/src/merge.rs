//! Destructive deep merge of override trees onto resolved documents
//!
//! Rules, applied per key of the override tree:
//!
//! - an append marker (`{"__$APPEND": [...]}`) concatenates onto an existing
//!   array, or becomes the array when there is none
//! - an object merges recursively; a non-object target is replaced by `{}`
//!   first, and a target left empty by the merge is pruned
//! - `Undefined` deletes the key
//! - anything else replaces the target value

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::resolve::{ResolveOptions, Resolver};
use crate::value::Value;

/// Key of the object that marks "append to the array at this path".
pub const APPEND_MARKER: &str = "__$APPEND";

/// Build an append marker holding `values`.
pub fn append_marker(values: Vec<Value>) -> Value {
    let mut marker = BTreeMap::new();
    marker.insert(APPEND_MARKER.to_string(), Value::Array(values));
    Value::Object(marker)
}

fn as_append_marker(value: &Value) -> Option<&Vec<Value>> {
    match value.get(APPEND_MARKER) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Merge `overrides` onto `target` in destructive mode.
///
/// Override leaves may still hold deferred values; they are resolved with
/// `resolver` as they are merged. A non-object `target` is replaced by an
/// empty object when there is anything to merge.
pub fn deep_merge(
    target: &mut JsonValue,
    overrides: &BTreeMap<String, Value>,
    resolver: &Resolver,
) -> Result<()> {
    if overrides.is_empty() {
        return Ok(());
    }
    if !target.is_object() {
        *target = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(map) = target {
        merge_into(map, overrides, resolver)?;
    }
    Ok(())
}

fn merge_into(
    target: &mut Map<String, JsonValue>,
    source: &BTreeMap<String, Value>,
    resolver: &Resolver,
) -> Result<()> {
    for (key, value) in source {
        if let Some(appended) = as_append_marker(value) {
            let items = resolve_items(appended, resolver)?;
            match target.get_mut(key) {
                Some(JsonValue::Array(existing)) => existing.extend(items),
                _ => {
                    target.insert(key.clone(), JsonValue::Array(items));
                }
            }
            continue;
        }

        match value {
            Value::Object(nested) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| JsonValue::Object(Map::new()));
                if !slot.is_object() {
                    *slot = JsonValue::Object(Map::new());
                }
                if let JsonValue::Object(child) = slot {
                    merge_into(child, nested, resolver)?;
                    if child.is_empty() {
                        target.remove(key);
                    }
                }
            }
            Value::Undefined => {
                target.remove(key);
            }
            other => match resolver.resolve(other, ResolveOptions::default())? {
                Some(resolved) => {
                    target.insert(key.clone(), resolved);
                }
                None => {
                    target.remove(key);
                }
            },
        }
    }
    Ok(())
}

fn resolve_items(items: &[Value], resolver: &Resolver) -> Result<Vec<JsonValue>> {
    items
        .iter()
        .map(|item| {
            Ok(resolver
                .resolve(item, ResolveOptions::default())?
                .unwrap_or(JsonValue::Null))
        })
        .collect()
}
