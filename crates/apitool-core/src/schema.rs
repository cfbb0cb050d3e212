//! JSON-Schema fragments as a recursive type.
//!
//! [`SchemaTranslator`] turns a raw OpenAPI schema object into a
//! [`SchemaNode`], following local `$ref`s and rejecting anything that cannot
//! be expressed structurally (combinators, circular references, unknown
//! types). [`SchemaNode::to_json`] renders the node back into JSON Schema.
//!
//! Every error names the offending location as a dotted path such as
//! `requestBody.properties.address.oneOf`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::openapi::resolver::{merge_siblings, ref_of, resolve_ref};
use crate::Error;

/// Nodes one translation may produce unless configured otherwise
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Schema keywords this library recognizes but cannot translate
const COMBINATORS: [&str; 4] = ["oneOf", "anyOf", "allOf", "not"];

/// JSON Schema primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Null => "null",
        }
    }
}

/// Annotation and validation keywords copied through unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,

    /// Rendered as a `"null"` member of `type`, never as a keyword
    #[serde(skip_serializing)]
    pub nullable: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<JsonValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<JsonValue>,

    /// Boolean in OpenAPI 3.0, numeric in 3.1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<JsonValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<JsonValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<JsonValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
}

impl SchemaMetadata {
    /// Metadata carrying only a description
    pub fn described(description: Option<String>) -> Self {
        Self {
            description,
            ..Self::default()
        }
    }

    fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }
}

/// What an object says about keys it does not list
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// An object schema: ordered properties plus the names that must be present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: Vec<(String, SchemaNode)>,
    /// Never names a key absent from `properties`
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
}

impl ObjectSchema {
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find_map(|(key, node)| (key == name).then_some(node))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Add a property, failing if the name is already taken
    pub fn insert(&mut self, name: &str, node: SchemaNode, required: bool) -> crate::Result<()> {
        if self.property(name).is_some() {
            return Err(Error::conversion(format!("duplicate property '{name}'")));
        }
        self.properties.push((name.to_string(), node));
        if required {
            self.required.push(name.to_string());
        }
        Ok(())
    }

    /// Render `properties`, `required` and `additionalProperties` into `out`.
    ///
    /// `always_required` keeps an empty `required` list instead of omitting it.
    pub fn render_into(&self, out: &mut Map<String, JsonValue>, always_required: bool) {
        let properties: Map<String, JsonValue> = self
            .properties
            .iter()
            .map(|(name, node)| (name.clone(), node.to_json()))
            .collect();
        out.insert("properties".to_string(), JsonValue::Object(properties));
        if always_required || !self.required.is_empty() {
            out.insert(
                "required".to_string(),
                JsonValue::Array(self.required.iter().cloned().map(JsonValue::String).collect()),
            );
        }
        match &self.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                out.insert("additionalProperties".to_string(), JsonValue::Bool(*allowed));
            }
            Some(AdditionalProperties::Schema(node)) => {
                out.insert("additionalProperties".to_string(), node.to_json());
            }
            None => {}
        }
    }
}

/// The structural part of a schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object(ObjectSchema),
    Array(Box<SchemaNode>),
    Primitive {
        ty: PrimitiveType,
        format: Option<String>,
    },
    /// No `type` and nothing to infer one from
    Any,
}

/// A translated schema: structure plus metadata
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub meta: SchemaMetadata,
}

impl SchemaNode {
    pub fn primitive(ty: PrimitiveType, meta: SchemaMetadata) -> Self {
        Self {
            kind: SchemaKind::Primitive { ty, format: None },
            meta,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Render as a JSON Schema value
    pub fn to_json(&self) -> JsonValue {
        let mut out = Map::new();
        let type_name = match &self.kind {
            SchemaKind::Object(_) => Some("object"),
            SchemaKind::Array(_) => Some("array"),
            SchemaKind::Primitive { ty, .. } => Some(ty.as_str()),
            SchemaKind::Any => None,
        };
        if let Some(type_name) = type_name {
            let ty = if self.meta.is_nullable() && type_name != "null" {
                serde_json::json!([type_name, "null"])
            } else {
                JsonValue::String(type_name.to_string())
            };
            out.insert("type".to_string(), ty);
        }
        if let SchemaKind::Primitive {
            format: Some(format),
            ..
        } = &self.kind
        {
            out.insert("format".to_string(), JsonValue::String(format.clone()));
        }
        if let Ok(JsonValue::Object(fields)) = serde_json::to_value(&self.meta) {
            out.extend(fields);
        }
        match &self.kind {
            SchemaKind::Object(object) => object.render_into(&mut out, false),
            SchemaKind::Array(items) => {
                out.insert("items".to_string(), items.to_json());
            }
            SchemaKind::Primitive { .. } | SchemaKind::Any => {}
        }
        JsonValue::Object(out)
    }
}

/// Translates raw schemas of one document into [`SchemaNode`]s
pub struct SchemaTranslator<'a> {
    root: &'a JsonValue,
    max_depth: usize,
    max_nodes: usize,
    /// Nodes visited by the current translation
    nodes: usize,
    /// References currently being expanded, innermost last
    stack: Vec<String>,
}

impl<'a> SchemaTranslator<'a> {
    pub fn new(root: &'a JsonValue, max_depth: usize) -> Self {
        Self {
            root,
            max_depth,
            max_nodes: DEFAULT_MAX_NODES,
            nodes: 0,
            stack: Vec::new(),
        }
    }

    /// Bound the number of nodes a single translation may expand to.
    ///
    /// Shared `$ref`s are expanded at every use, so this limits breadth the
    /// way `max_depth` limits nesting.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Translate `schema`, naming it `path` in errors
    pub fn translate(&mut self, schema: &JsonValue, path: &str) -> crate::Result<SchemaNode> {
        self.stack.clear();
        self.nodes = 0;
        self.node(schema, path, 0)
    }

    fn node(&mut self, schema: &JsonValue, path: &str, depth: usize) -> crate::Result<SchemaNode> {
        if depth > self.max_depth {
            return Err(Error::unsupported(
                path,
                format!("schema nesting deeper than {} levels", self.max_depth),
            ));
        }

        let map = match schema {
            JsonValue::Null | JsonValue::Bool(true) => {
                return Ok(SchemaNode {
                    kind: SchemaKind::Any,
                    meta: SchemaMetadata::default(),
                })
            }
            JsonValue::Bool(false) => {
                return Err(Error::unsupported(path, "the 'false' schema"));
            }
            JsonValue::Object(map) => map,
            _ => {
                return Err(Error::conversion(format!(
                    "schema at '{path}' must be a mapping"
                )))
            }
        };

        if let Some(reference) = ref_of(schema) {
            return self.follow(reference, schema, path, depth);
        }

        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return Err(Error::unsupported(
                path,
                format!("schema expanding to more than {} nodes", self.max_nodes),
            ));
        }

        if let Some(keyword) = COMBINATORS.iter().find(|k| map.contains_key(**k)) {
            return Err(Error::unsupported(
                format!("{path}.{keyword}"),
                format!("schema combinator '{keyword}'"),
            ));
        }

        let mut meta: SchemaMetadata = serde_json::from_value(schema.clone()).map_err(|e| {
            Error::conversion(format!("invalid schema keyword at '{path}': {e}"))
        })?;

        let declared = declared_type(map, path)?;
        if declared.nullable {
            meta.nullable = Some(true);
        }
        let kind = match declared.name {
            Some("object") => SchemaKind::Object(self.object(map, path, depth)?),
            Some("array") => SchemaKind::Array(Box::new(self.items(map, path, depth)?)),
            Some(name) => SchemaKind::Primitive {
                ty: primitive(name).ok_or_else(|| {
                    Error::unsupported(format!("{path}.type"), format!("unknown type '{name}'"))
                })?,
                format: map.get("format").and_then(JsonValue::as_str).map(String::from),
            },
            None if map.contains_key("properties") || map.contains_key("additionalProperties") => {
                SchemaKind::Object(self.object(map, path, depth)?)
            }
            None if map.contains_key("items") => {
                SchemaKind::Array(Box::new(self.items(map, path, depth)?))
            }
            None => SchemaKind::Any,
        };

        Ok(SchemaNode { kind, meta })
    }

    fn follow(
        &mut self,
        reference: &str,
        schema: &JsonValue,
        path: &str,
        depth: usize,
    ) -> crate::Result<SchemaNode> {
        if self.stack.iter().any(|r| r == reference) {
            return Err(Error::unsupported(
                format!("{path}.$ref"),
                format!("circular reference to {reference}"),
            ));
        }
        let target = resolve_ref(self.root, reference)?;
        let merged = merge_siblings(target, schema);
        self.stack.push(reference.to_string());
        let node = self.node(&merged, path, depth);
        self.stack.pop();
        node
    }

    fn object(
        &mut self,
        map: &Map<String, JsonValue>,
        path: &str,
        depth: usize,
    ) -> crate::Result<ObjectSchema> {
        let mut object = ObjectSchema::default();

        if let Some(properties) = map.get("properties") {
            let properties = properties.as_object().ok_or_else(|| {
                Error::conversion(format!("'{path}.properties' must be a mapping"))
            })?;
            for (name, property) in properties {
                let child = format!("{path}.properties.{name}");
                let node = self.node(property, &child, depth + 1)?;
                object.properties.push((name.clone(), node));
            }
        }

        for name in map
            .get("required")
            .and_then(JsonValue::as_array)
            .into_iter()
            .flatten()
            .filter_map(JsonValue::as_str)
        {
            if object.property(name).is_some() {
                object.required.push(name.to_string());
            } else {
                log::warn!("Dropping required '{}' at {}: no such property", name, path);
            }
        }

        object.additional_properties = match map.get("additionalProperties") {
            None => None,
            Some(JsonValue::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
            Some(schema) => {
                let child = format!("{path}.additionalProperties");
                Some(AdditionalProperties::Schema(Box::new(
                    self.node(schema, &child, depth + 1)?,
                )))
            }
        };

        Ok(object)
    }

    fn items(
        &mut self,
        map: &Map<String, JsonValue>,
        path: &str,
        depth: usize,
    ) -> crate::Result<SchemaNode> {
        let child = format!("{path}.items");
        match map.get("items") {
            Some(JsonValue::Array(_)) => Err(Error::unsupported(child, "tuple-typed array items")),
            Some(items) => self.node(items, &child, depth + 1),
            None => Ok(SchemaNode {
                kind: SchemaKind::Any,
                meta: SchemaMetadata::default(),
            }),
        }
    }
}

struct DeclaredType<'m> {
    name: Option<&'m str>,
    nullable: bool,
}

/// Read `type`, accepting the OpenAPI 3.1 `[T, "null"]` form
fn declared_type<'m>(map: &'m Map<String, JsonValue>, path: &str) -> crate::Result<DeclaredType<'m>> {
    match map.get("type") {
        None => Ok(DeclaredType {
            name: None,
            nullable: false,
        }),
        Some(JsonValue::String(name)) => Ok(DeclaredType {
            name: Some(name.as_str()),
            nullable: false,
        }),
        Some(JsonValue::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(JsonValue::as_str).collect();
            if names.len() != types.len() {
                return Err(Error::conversion(format!(
                    "'{path}.type' must list type names"
                )));
            }
            let nullable = names.contains(&"null");
            let concrete: Vec<&str> = names.iter().copied().filter(|n| *n != "null").collect();
            match concrete.as_slice() {
                [] if nullable => Ok(DeclaredType {
                    name: Some("null"),
                    nullable: false,
                }),
                [single] => Ok(DeclaredType {
                    name: Some(*single),
                    nullable,
                }),
                _ => Err(Error::unsupported(
                    format!("{path}.type"),
                    format!("multiple types {names:?}"),
                )),
            }
        }
        Some(other) => Err(Error::conversion(format!(
            "'{path}.type' must be a string, found {other}"
        ))),
    }
}

fn primitive(name: &str) -> Option<PrimitiveType> {
    match name {
        "string" => Some(PrimitiveType::String),
        "number" => Some(PrimitiveType::Number),
        "integer" => Some(PrimitiveType::Integer),
        "boolean" => Some(PrimitiveType::Boolean),
        "null" => Some(PrimitiveType::Null),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn translate(schema: JsonValue) -> crate::Result<SchemaNode> {
        let root = json!({});
        SchemaTranslator::new(&root, 32).translate(&schema, "requestBody")
    }

    fn unsupported_path(err: Error) -> String {
        match err {
            Error::UnsupportedFeature { path, .. } => path,
            other => panic!("expected unsupported feature, got {other}"),
        }
    }

    #[test]
    fn test_nested_objects_and_arrays() -> crate::Result<()> {
        let node = translate(json!({
            "type": "object",
            "required": ["name", "tags"],
            "properties": {
                "name": {"type": "string", "minLength": 1, "description": "Display name"},
                "tags": {"type": "array", "items": {"type": "string", "enum": ["a", "b"]}},
                "address": {
                    "type": "object",
                    "required": ["city"],
                    "properties": {"city": {"type": "string"}, "zip": {"type": "string", "pattern": "^[0-9]{5}$"}}
                }
            }
        }))?;
        assert_eq!(
            node.to_json(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Display name", "minLength": 1},
                    "tags": {"type": "array", "items": {"type": "string", "enum": ["a", "b"]}},
                    "address": {
                        "type": "object",
                        "properties": {"city": {"type": "string"}, "zip": {"type": "string", "pattern": "^[0-9]{5}$"}},
                        "required": ["city"]
                    }
                },
                "required": ["name", "tags"]
            })
        );
        Ok(())
    }

    #[test]
    fn test_required_never_names_missing_properties() -> crate::Result<()> {
        let node = translate(json!({
            "type": "object",
            "required": ["id", "ghost"],
            "properties": {"id": {"type": "integer", "format": "int64"}}
        }))?;
        assert_eq!(node.as_object().unwrap().required, vec!["id".to_string()]);
        assert_eq!(node.to_json()["properties"]["id"]["format"], "int64");
        Ok(())
    }

    #[test]
    fn test_one_of_names_its_path() {
        let err = translate(json!({
            "type": "object",
            "properties": {"address": {"oneOf": [{"type": "string"}, {"type": "object"}]}}
        }))
        .unwrap_err();
        assert_eq!(unsupported_path(err), "requestBody.properties.address.oneOf");
    }

    #[test]
    fn test_all_combinators_are_rejected() {
        for keyword in COMBINATORS {
            let err = translate(json!({keyword: [{"type": "string"}]})).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFeature, "{keyword}");
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = translate(json!({"type": "file"})).unwrap_err();
        assert_eq!(unsupported_path(err), "requestBody.type");
    }

    #[test]
    fn test_openapi_31_nullable_type_array() -> crate::Result<()> {
        let node = translate(json!({"type": ["string", "null"], "format": "date"}))?;
        assert_eq!(node.to_json(), json!({"type": ["string", "null"], "format": "date"}));

        let err = translate(json!({"type": ["string", "integer"]})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        Ok(())
    }

    #[test]
    fn test_openapi_30_nullable_keyword() -> crate::Result<()> {
        let node = translate(json!({"type": "integer", "nullable": true}))?;
        assert_eq!(node.to_json(), json!({"type": ["integer", "null"]}));
        Ok(())
    }

    #[test]
    fn test_type_is_inferred() -> crate::Result<()> {
        let object = translate(json!({"properties": {"a": {"type": "boolean"}}}))?;
        assert!(object.as_object().is_some());
        let array = translate(json!({"items": {"type": "number"}}))?;
        assert_eq!(array.to_json(), json!({"type": "array", "items": {"type": "number"}}));
        let any = translate(json!({"description": "anything"}))?;
        assert_eq!(any.to_json(), json!({"description": "anything"}));
        Ok(())
    }

    #[test]
    fn test_refs_follow_and_keep_siblings() -> crate::Result<()> {
        let root = json!({"components": {"schemas": {
            "Money": {"type": "object", "required": ["amount"], "properties": {"amount": {"type": "number"}}}
        }}});
        let schema = json!({"properties": {"price": {"$ref": "#/components/schemas/Money", "description": "Unit price"}}});
        let node = SchemaTranslator::new(&root, 32).translate(&schema, "responses.200")?;
        let price = node.as_object().unwrap().property("price").unwrap().to_json();
        assert_eq!(price["description"], "Unit price");
        assert_eq!(price["required"], json!(["amount"]));
        Ok(())
    }

    #[test]
    fn test_shared_refs_are_not_circular() -> crate::Result<()> {
        let root = json!({"components": {"schemas": {"Id": {"type": "string"}}}});
        let schema = json!({"properties": {
            "a": {"$ref": "#/components/schemas/Id"},
            "b": {"$ref": "#/components/schemas/Id"}
        }});
        let node = SchemaTranslator::new(&root, 32).translate(&schema, "requestBody")?;
        assert_eq!(node.as_object().unwrap().properties.len(), 2);
        Ok(())
    }

    #[test]
    fn test_circular_ref_is_rejected() {
        let root = json!({"components": {"schemas": {
            "Node": {"type": "object", "properties": {"child": {"$ref": "#/components/schemas/Node"}}}
        }}});
        let schema = json!({"$ref": "#/components/schemas/Node"});
        let err = SchemaTranslator::new(&root, 32)
            .translate(&schema, "requestBody")
            .unwrap_err();
        assert_eq!(unsupported_path(err), "requestBody.properties.child.$ref");
    }

    #[test]
    fn test_unresolved_ref_is_conversion_error() {
        let err = translate(json!({"$ref": "#/components/schemas/Missing"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut schema = json!({"type": "string"});
        for _ in 0..5 {
            schema = json!({"type": "array", "items": schema});
        }
        let root = json!({});
        let err = SchemaTranslator::new(&root, 3)
            .translate(&schema, "requestBody")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        assert!(SchemaTranslator::new(&root, 5).translate(&schema, "requestBody").is_ok());
    }

    /// Each level references the next one twice, doubling the expansion
    fn doubling_refs(levels: usize) -> JsonValue {
        let mut schemas = Map::new();
        for level in 0..levels {
            let next = json!({"$ref": format!("#/components/schemas/L{}", level + 1)});
            schemas.insert(
                format!("L{level}"),
                json!({"type": "object", "properties": {"left": next.clone(), "right": next}}),
            );
        }
        schemas.insert(format!("L{levels}"), json!({"type": "string"}));
        json!({"components": {"schemas": schemas}})
    }

    #[test]
    fn test_node_budget_bounds_shared_refs() {
        let root = doubling_refs(24);
        let schema = json!({"$ref": "#/components/schemas/L0"});
        let err = SchemaTranslator::new(&root, 32)
            .translate(&schema, "requestBody")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_node_budget_is_configurable() {
        let root = doubling_refs(3);
        let schema = json!({"$ref": "#/components/schemas/L0"});
        // 1 + 2 + 4 + 8 nodes
        assert!(SchemaTranslator::new(&root, 32)
            .with_max_nodes(15)
            .translate(&schema, "requestBody")
            .is_ok());
        assert!(SchemaTranslator::new(&root, 32)
            .with_max_nodes(14)
            .translate(&schema, "requestBody")
            .is_err());
    }

    #[test]
    fn test_additional_properties_schema() -> crate::Result<()> {
        let node = translate(json!({"type": "object", "additionalProperties": {"type": "integer"}}))?;
        assert_eq!(
            node.to_json(),
            json!({"type": "object", "properties": {}, "additionalProperties": {"type": "integer"}})
        );
        Ok(())
    }
}
