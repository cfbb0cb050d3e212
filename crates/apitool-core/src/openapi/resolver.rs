//! Local `$ref` resolution.
//!
//! Only references into the same document (`#/...`) are resolved. A reference
//! to another file or URL is reported as an unsupported feature; a local
//! reference whose target does not exist is a conversion error.
//!
//! When a `$ref` object carries sibling keys, the referenced value wins and
//! siblings only fill in keys it does not define.

use std::collections::HashSet;

use serde_json::{Map, Value as JsonValue};

use super::Document;
use crate::Error;

/// Look up a single local reference without following further `$ref`s
pub fn resolve_ref<'a>(root: &'a JsonValue, reference: &str) -> crate::Result<&'a JsonValue> {
    let Some(pointer) = reference.strip_prefix('#') else {
        return Err(Error::unsupported(
            reference,
            "external $ref documents are not resolved",
        ));
    };
    if !pointer.is_empty() && !pointer.starts_with('/') {
        return Err(Error::conversion(format!(
            "Invalid JSON pointer in reference: {reference}"
        )));
    }
    root.pointer(pointer)
        .ok_or_else(|| Error::conversion(format!("Could not resolve reference: {reference}")))
}

/// Follow a chain of `$ref`s starting at `node` until a concrete value is reached.
///
/// `location` names the node in error messages (e.g. `parameters[0]`).
pub fn resolve_node(root: &JsonValue, node: &JsonValue, location: &str) -> crate::Result<JsonValue> {
    let mut seen = HashSet::new();
    let mut current = node.clone();
    while let Some(reference) = ref_of(&current).map(String::from) {
        if !seen.insert(reference.clone()) {
            return Err(Error::unsupported(
                format!("{location}.$ref"),
                format!("circular reference to {reference}"),
            ));
        }
        let target = resolve_ref(root, &reference)?;
        current = merge_siblings(target, &current);
    }
    Ok(current)
}

/// The `$ref` string of an object node, if it has one
pub fn ref_of(node: &JsonValue) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

/// Combine a referenced value with the sibling keys of the `$ref` object
pub(crate) fn merge_siblings(target: &JsonValue, ref_node: &JsonValue) -> JsonValue {
    let (Some(target_map), Some(ref_map)) = (target.as_object(), ref_node.as_object()) else {
        return target.clone();
    };
    let mut merged = target_map.clone();
    for (key, value) in ref_map {
        if key != "$ref" && !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    JsonValue::Object(merged)
}

/// Inline every local `$ref` under `paths` and `components`.
///
/// Other top-level fields are copied unchanged.
pub fn dereference(document: &Document) -> crate::Result<JsonValue> {
    let root = document.as_json();
    let mut stack = Vec::new();
    let mut output = Map::new();
    if let Some(fields) = root.as_object() {
        for (key, value) in fields {
            let resolved = match key.as_str() {
                "paths" | "components" => inline_refs(root, value, key, &mut stack)?,
                _ => value.clone(),
            };
            output.insert(key.clone(), resolved);
        }
    }
    Ok(JsonValue::Object(output))
}

fn inline_refs(
    root: &JsonValue,
    node: &JsonValue,
    location: &str,
    stack: &mut Vec<String>,
) -> crate::Result<JsonValue> {
    match node {
        JsonValue::Object(map) => {
            if let Some(reference) = ref_of(node) {
                if stack.iter().any(|r| r == reference) {
                    return Err(Error::unsupported(
                        format!("{location}.$ref"),
                        format!("circular reference to {reference}"),
                    ));
                }
                let target = resolve_ref(root, reference)?;
                stack.push(reference.to_string());
                let inlined = inline_refs(root, target, location, stack);
                stack.pop();
                return Ok(merge_siblings(&inlined?, node));
            }
            let mut out = Map::new();
            for (key, value) in map {
                let child = format!("{location}.{key}");
                out.insert(key.clone(), inline_refs(root, value, &child, stack)?);
            }
            Ok(JsonValue::Object(out))
        }
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| inline_refs(root, item, &format!("{location}[{i}]"), stack))
            .collect::<crate::Result<Vec<_>>>()
            .map(JsonValue::Array),
        other => Ok(other.clone()),
    }
}
