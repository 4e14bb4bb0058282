//! Raw-document normalization
//!
//! Runs on the parsed YAML documents before they are decoded into typed
//! blocks:
//!
//! 1. Microscope keys written `Child (Parent)` are split in every document
//!    before the documents are merged, so a later document can address the
//!    child by its plain name.
//! 2. The documents are merged in order.
//! 3. Microscope inheritance: `Child` takes every block it does not define
//!    itself from `Parent`.
//! 4. Legacy single-mapping forms of list-valued blocks (`filter_wheel`,
//!    `galvo`, `stage.hardware`, and the inventory lists) become one-element
//!    lists.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::config::merge::merge_all;
use crate::error::{IssueKind, ValidationIssue};

/// Keys never copied from a parent microscope.
const NOT_INHERITED: [&str; 1] = ["default"];

/// Outcome of normalizing the documents of one load.
#[derive(Debug, Default)]
pub struct Normalized {
    /// The merged, rewritten document.
    pub root: Value,
    /// Child microscope name to parent name.
    pub inherits: IndexMap<String, String>,
    /// Child microscope name to the blocks it took from its parent.
    pub inherited_blocks: IndexMap<String, Vec<String>>,
    /// Issues found while normalizing.
    pub issues: Vec<ValidationIssue>,
}

/// Splits `"Child (Parent)"` into its parts.
///
/// Returns `(name, None)` for a plain name.
#[must_use]
pub fn split_inheritance(key: &str) -> (String, Option<String>) {
    let trimmed = key.trim();
    if let Some(body) = trimmed.strip_suffix(')') {
        if let Some(open) = body.rfind('(') {
            let child = body[..open].trim();
            let parent = body[open + 1..].trim();
            if !child.is_empty() && !parent.is_empty() {
                return (child.to_string(), Some(parent.to_string()));
            }
        }
    }
    (trimmed.to_string(), None)
}

/// Normalizes and merges parsed documents, later documents overriding
/// earlier ones.
#[must_use]
pub fn normalize(documents: Vec<Value>) -> Normalized {
    let mut out = Normalized::default();

    let mut split = Vec::with_capacity(documents.len());
    for mut document in documents {
        if let Some(Value::Mapping(map)) = document.get_mut("microscopes") {
            *map = rename_microscopes(std::mem::take(map), &mut out);
        }
        split.push(document);
    }
    let mut root = merge_all(&split).unwrap_or_else(|| Value::Mapping(Mapping::new()));

    if let Some(hardware) = root.get_mut("hardware").and_then(Value::as_mapping_mut) {
        for key in ["camera", "filter_wheel", "stage"] {
            if let Some(value) = hardware.get_mut(key) {
                wrap_in_list(value);
            }
        }
    }

    if let Some(Value::Mapping(map)) = root.get_mut("microscopes") {
        *map = resolve_inheritance(std::mem::take(map), &mut out);
        for (name, block) in map.iter_mut() {
            let name = name.as_str().unwrap_or_default().to_string();
            normalize_microscope(&name, block, &mut out.issues);
        }
    }

    out.root = root;
    out
}

/// Rewrites one document's `Child (Parent)` keys to `Child` and records the
/// relation. A parent named in a later document replaces an earlier one.
fn rename_microscopes(map: Mapping, out: &mut Normalized) -> Mapping {
    let mut renamed = Mapping::new();
    for (key, value) in map {
        let Some(raw) = key.as_str() else {
            out.issues.push(ValidationIssue::error(
                IssueKind::Schema,
                "microscopes",
                format!("microscope names must be strings, got {}", describe(&key)),
            ));
            continue;
        };
        let (name, parent) = split_inheritance(raw);
        let name_key = Value::String(name.clone());
        if renamed.contains_key(&name_key) {
            out.issues.push(ValidationIssue::error(
                IssueKind::Schema,
                format!("microscopes.{raw}"),
                format!("microscope '{name}' is declared more than once"),
            ));
            continue;
        }
        if let Some(parent) = parent {
            tracing::debug!(microscope = %name, parent = %parent, "microscope inherits blocks");
            out.inherits.insert(name, parent);
        }
        renamed.insert(name_key, value);
    }
    renamed
}

/// Copies missing blocks from parents, resolving chains of inheritance.
fn resolve_inheritance(mut map: Mapping, out: &mut Normalized) -> Mapping {
    let children: Vec<String> = out.inherits.keys().cloned().collect();
    let mut resolved: Vec<String> = Vec::new();
    let mut broken: Vec<String> = Vec::new();

    for child in children {
        let mut chain = Vec::new();
        resolve_one(&child, &mut map, out, &mut chain, &mut resolved, &mut broken);
    }

    for child in broken {
        out.inherits.shift_remove(&child);
    }
    map
}

fn resolve_one(
    name: &str,
    map: &mut Mapping,
    out: &mut Normalized,
    chain: &mut Vec<String>,
    resolved: &mut Vec<String>,
    broken: &mut Vec<String>,
) -> bool {
    if resolved.iter().any(|r| r == name) {
        return true;
    }
    if broken.iter().any(|b| b == name) {
        return false;
    }
    let Some(parent) = out.inherits.get(name).cloned() else {
        // Plain microscope: nothing to inherit.
        resolved.push(name.to_string());
        return true;
    };

    if chain.iter().any(|c| c == name) {
        let mut cycle = chain.clone();
        cycle.push(name.to_string());
        out.issues.push(ValidationIssue::error(
            IssueKind::Reference,
            format!("microscopes.{name}"),
            format!("inheritance cycle: {}", cycle.join(" -> ")),
        ));
        broken.push(name.to_string());
        return false;
    }

    let parent_key = Value::String(parent.clone());
    if !map.contains_key(&parent_key) {
        out.issues.push(ValidationIssue::error(
            IssueKind::Reference,
            format!("microscopes.{name}"),
            format!("microscope '{name}' inherits from unknown microscope '{parent}'"),
        ));
        broken.push(name.to_string());
        return false;
    }

    chain.push(name.to_string());
    let parent_ok = resolve_one(&parent, map, out, chain, resolved, broken);
    chain.pop();
    if !parent_ok {
        broken.push(name.to_string());
        return false;
    }

    let parent_blocks = map.get(&parent_key).and_then(Value::as_mapping).cloned();
    if let (Some(parent_blocks), Some(Value::Mapping(child_blocks))) =
        (parent_blocks, map.get_mut(name))
    {
        let copied = out.inherited_blocks.entry(name.to_string()).or_default();
        for (key, value) in parent_blocks {
            let Some(block) = key.as_str() else {
                continue;
            };
            if !NOT_INHERITED.contains(&block) && !child_blocks.contains_key(&key) {
                copied.push(block.to_string());
                child_blocks.insert(key, value);
            }
        }
    }
    resolved.push(name.to_string());
    true
}

/// Rewrites legacy single-mapping forms inside one microscope.
fn normalize_microscope(name: &str, block: &mut Value, issues: &mut Vec<ValidationIssue>) {
    let Some(map) = block.as_mapping_mut() else {
        return;
    };

    for key in ["filter_wheel", "galvo"] {
        if let Some(value) = map.get_mut(key) {
            if wrap_in_list(value) {
                issues.push(ValidationIssue::warning(
                    IssueKind::Schema,
                    format!("microscopes.{name}.{key}"),
                    format!("'{key}' given as a single mapping; write it as a list"),
                ));
            }
        }
    }

    if let Some(hardware) = map
        .get_mut("stage")
        .and_then(Value::as_mapping_mut)
        .and_then(|stage| stage.get_mut("hardware"))
    {
        wrap_in_list(hardware);
    }
}

/// Wraps a mapping in a one-element sequence. Returns `true` if it did.
fn wrap_in_list(value: &mut Value) -> bool {
    if value.is_mapping() {
        let inner = std::mem::take(value);
        *value = Value::Sequence(vec![inner]);
        true
    } else {
        false
    }
}

/// Short description of a YAML value's type, for messages.
#[must_use]
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ============================================================================
// Tests
// ============================================================================
