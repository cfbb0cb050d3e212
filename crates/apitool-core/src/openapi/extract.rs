//! Operation extraction from a validated document.

use std::collections::HashSet;

use serde_json::{Map, Value as JsonValue};

use super::resolver::resolve_node;
use super::types::{HttpMethod, Operation, ParameterLocation, ParameterSpec, RequestBodySpec, ResponseSpec};
use super::Document;
use crate::Error;

/// Walk `paths` and produce one [`Operation`] per (path, method) pair.
///
/// Order is document path order, then [`HttpMethod::ORDERED`].
pub fn extract_operations(document: &Document) -> crate::Result<Vec<Operation>> {
    let root = document.as_json();
    let mut operations = Vec::new();

    for (path, item) in document.paths() {
        let item = resolve_node(root, item, &format!("paths.{path}"))?;
        let Some(item) = item.as_object() else {
            return Err(Error::conversion(format!(
                "Path item for '{path}' must be a mapping"
            )));
        };

        let shared = parse_parameters(root, item.get("parameters"), &format!("paths.{path}"))?;

        for method in HttpMethod::ORDERED {
            let Some(op) = item.get(method.key()) else {
                continue;
            };
            let label = format!("{} {}", method, path);
            let op = op.as_object().ok_or_else(|| {
                Error::conversion(format!("Operation '{label}' must be a mapping"))
            })?;
            let operation = extract_operation(document, method, path, op, &shared)?;
            log::debug!(
                "Extracted {} with {} parameters",
                label,
                operation.parameters.len()
            );
            operations.push(operation);
        }
    }

    Ok(operations)
}

fn extract_operation(
    document: &Document,
    method: HttpMethod,
    path: &str,
    op: &Map<String, JsonValue>,
    shared: &[ParameterSpec],
) -> crate::Result<Operation> {
    let root = document.as_json();
    let label = format!("{} {}", method, path);

    let own = parse_parameters(root, op.get("parameters"), &label)?;
    let parameters = merge_parameters(shared, own);

    let request_body = match op.get("requestBody") {
        Some(body) => Some(parse_request_body(root, body, &label)?),
        None => None,
    };

    let responses = match op.get("responses").and_then(JsonValue::as_object) {
        Some(map) => map
            .iter()
            .map(|(status, response)| parse_response(root, status, response, &label))
            .collect::<crate::Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let security = match op.get("security").and_then(JsonValue::as_array) {
        Some(own) => security_objects(own),
        None => document.security().map(|s| security_objects(s)).unwrap_or_default(),
    };

    Ok(Operation {
        method,
        path: path.to_string(),
        operation_id: str_field(op, "operationId"),
        summary: str_field(op, "summary"),
        description: str_field(op, "description"),
        deprecated: op.get("deprecated").and_then(JsonValue::as_bool).unwrap_or(false),
        parameters,
        request_body,
        responses,
        security,
    })
}

/// Path-level parameters first, then operation-level ones. An operation-level
/// parameter with the same `name` and `in` drops the path-level one.
fn merge_parameters(shared: &[ParameterSpec], own: Vec<ParameterSpec>) -> Vec<ParameterSpec> {
    let overridden: HashSet<(String, ParameterLocation)> = own
        .iter()
        .map(|p| (p.name.clone(), p.location))
        .collect();
    shared
        .iter()
        .filter(|p| !overridden.contains(&(p.name.clone(), p.location)))
        .cloned()
        .chain(own)
        .collect()
}

fn parse_parameters(
    root: &JsonValue,
    value: Option<&JsonValue>,
    owner: &str,
) -> crate::Result<Vec<ParameterSpec>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let list = value
        .as_array()
        .ok_or_else(|| Error::conversion(format!("{owner}: 'parameters' must be a list")))?;

    let mut seen = HashSet::new();
    let mut params = Vec::with_capacity(list.len());
    for (index, raw) in list.iter().enumerate() {
        let location = format!("{owner}: parameters[{index}]");
        let param = resolve_node(root, raw, &location)?;
        let param = parse_parameter(&param, &location)?;
        if !seen.insert((param.name.clone(), param.location)) {
            return Err(Error::conversion(format!(
                "{owner}: duplicate {} parameter '{}'",
                param.location.as_str(),
                param.name
            )));
        }
        params.push(param);
    }
    Ok(params)
}

fn parse_parameter(param: &JsonValue, location: &str) -> crate::Result<ParameterSpec> {
    let map = param
        .as_object()
        .ok_or_else(|| Error::conversion(format!("{location} must be a mapping")))?;

    let name = str_field(map, "name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::conversion(format!("{location} has no name")))?;
    let raw_in = str_field(map, "in").unwrap_or_default();
    let param_location = ParameterLocation::parse(&raw_in).ok_or_else(|| {
        Error::conversion(format!(
            "{location}: parameter '{name}' has unknown location '{raw_in}'"
        ))
    })?;

    let schema = match (map.get("schema"), map.get("content").and_then(JsonValue::as_object)) {
        (Some(schema), _) => schema.clone(),
        (None, Some(content)) => match super::types::json_media_type(content) {
            Some((_, media)) => media.get("schema").cloned().unwrap_or(JsonValue::Null),
            None => {
                let media_type = content.keys().next().cloned().unwrap_or_default();
                return Err(Error::unsupported(
                    format!("parameters.{name}.content.{media_type}"),
                    format!("parameter content type '{media_type}'"),
                ));
            }
        },
        (None, None) => JsonValue::Null,
    };

    Ok(ParameterSpec {
        name,
        location: param_location,
        required: map.get("required").and_then(JsonValue::as_bool).unwrap_or(false),
        description: str_field(map, "description"),
        deprecated: map.get("deprecated").and_then(JsonValue::as_bool).unwrap_or(false),
        schema,
    })
}

fn parse_request_body(
    root: &JsonValue,
    body: &JsonValue,
    owner: &str,
) -> crate::Result<RequestBodySpec> {
    let body = resolve_node(root, body, &format!("{owner}: requestBody"))?;
    let map = body
        .as_object()
        .ok_or_else(|| Error::conversion(format!("{owner}: requestBody must be a mapping")))?;
    Ok(RequestBodySpec {
        content: object_field(map, "content"),
    })
}

fn parse_response(
    root: &JsonValue,
    status: &str,
    response: &JsonValue,
    owner: &str,
) -> crate::Result<ResponseSpec> {
    let response = resolve_node(root, response, &format!("{owner}: responses.{status}"))?;
    let map = response.as_object().ok_or_else(|| {
        Error::conversion(format!("{owner}: response '{status}' must be a mapping"))
    })?;
    Ok(ResponseSpec {
        status: status.to_string(),
        description: str_field(map, "description"),
        content: object_field(map, "content"),
    })
}

fn security_objects(list: &[JsonValue]) -> Vec<Map<String, JsonValue>> {
    list.iter()
        .filter_map(JsonValue::as_object)
        .cloned()
        .collect()
}

fn str_field(map: &Map<String, JsonValue>, key: &str) -> Option<String> {
    map.get(key).and_then(JsonValue::as_str).map(String::from)
}

fn object_field(map: &Map<String, JsonValue>, key: &str) -> Map<String, JsonValue> {
    map.get(key)
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default()
}
