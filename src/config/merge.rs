//! Layered document merging
//!
//! Several YAML documents combine into one by overlaying them in order.
//! Mappings merge key by key; every other value (scalars, sequences, null)
//! is a leaf and the later document's value replaces the earlier one.

use serde_yaml::Value;

/// Deep merges `override_val` into `base`.
///
/// For mappings: recursively merge keys, keeping the base's key order and
/// appending keys the base lacks.
/// For other types: override replaces base.
pub fn deep_merge(base: &mut Value, override_val: &Value) {
    match (base, override_val) {
        (Value::Mapping(base_map), Value::Mapping(override_map)) => {
            for (key, override_value) in override_map {
                if let Some(base_value) = base_map.get_mut(key) {
                    deep_merge(base_value, override_value);
                } else {
                    base_map.insert(key.clone(), override_value.clone());
                }
            }
        }
        (base, override_val) => {
            *base = override_val.clone();
        }
    }
}

/// Merges a list of documents in order into a single document.
///
/// Returns `None` for an empty list.
#[must_use]
pub fn merge_all<'a, I>(documents: I) -> Option<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut iter = documents.into_iter();
    let mut merged = iter.next()?.clone();
    for doc in iter {
        deep_merge(&mut merged, doc);
    }
    Some(merged)
}

// ============================================================================
// Tests
// ============================================================================
