//! Operation → parameter tree translation.
//!
//! Parameters are grouped into the four [`Category`]s, security requirements
//! contribute credential properties, and the JSON request body becomes the
//! `body` category. MCP output additionally needs a success response schema,
//! see [`OperationTranslator::output_schema`].

use std::fmt;

use serde_json::Value as JsonValue;

use crate::config::ConverterConfig;
use crate::openapi::resolver::resolve_node;
use crate::openapi::{json_media_type, Document, Operation, ParameterLocation, ResponseSpec};
use crate::schema::{
    ObjectSchema, PrimitiveType, SchemaKind, SchemaMetadata, SchemaNode, SchemaTranslator,
};
use crate::Error;

/// Where an input value travels in the HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Path,
    Query,
    Body,
    Auth,
}

impl Category {
    /// Rendering order of the categories
    pub const ALL: [Category; 4] = [Category::Path, Category::Query, Category::Body, Category::Auth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Path => "path",
            Category::Query => "query",
            Category::Body => "body",
            Category::Auth => "auth",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The inputs of one operation, grouped by category.
///
/// All four categories are always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTree {
    pub path: ObjectSchema,
    pub query: ObjectSchema,
    pub body: ObjectSchema,
    pub auth: ObjectSchema,
}

impl ParameterTree {
    pub fn category(&self, category: Category) -> &ObjectSchema {
        match category {
            Category::Path => &self.path,
            Category::Query => &self.query,
            Category::Body => &self.body,
            Category::Auth => &self.auth,
        }
    }

    fn category_mut(&mut self, category: Category) -> &mut ObjectSchema {
        match category {
            Category::Path => &mut self.path,
            Category::Query => &mut self.query,
            Category::Body => &mut self.body,
            Category::Auth => &mut self.auth,
        }
    }

    /// Categories in rendering order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &ObjectSchema)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.category(c)))
    }

    /// Flatten every category into one object, as MCP input schemas expect.
    ///
    /// Fails when two categories define the same property name.
    pub fn merged(&self) -> crate::Result<ObjectSchema> {
        let mut merged = ObjectSchema::default();
        let mut origin: Vec<(&str, Category)> = Vec::new();
        for (category, object) in self.iter() {
            for (name, node) in &object.properties {
                if let Some((_, first)) = origin.iter().find(|(n, _)| *n == name.as_str()) {
                    return Err(Error::conversion(format!(
                        "input '{name}' is defined in both the {first} and {category} categories"
                    )));
                }
                origin.push((name.as_str(), category));
                let required = object.required.contains(name);
                merged.insert(name, node.clone(), required)?;
            }
        }
        Ok(merged)
    }
}

/// Translates operations of one document under one configuration
pub struct OperationTranslator<'a> {
    document: &'a Document,
    config: &'a ConverterConfig,
}

impl<'a> OperationTranslator<'a> {
    pub fn new(document: &'a Document, config: &'a ConverterConfig) -> Self {
        Self { document, config }
    }

    fn schemas(&self) -> SchemaTranslator<'a> {
        SchemaTranslator::new(self.document.as_json(), self.config.max_schema_depth)
            .with_max_nodes(self.config.max_schema_nodes)
    }

    /// Group parameters, credentials and body of `operation` by category
    pub fn parameter_tree(&self, operation: &Operation) -> crate::Result<ParameterTree> {
        let mut tree = ParameterTree::default();
        let mut schemas = self.schemas();

        for param in &operation.parameters {
            let category = self.category_of(param.location, &param.name);
            let mut node = schemas.translate(&param.schema, &format!("parameters.{}", param.name))?;
            if node.meta.description.is_none() {
                node.meta.description = param.description.clone();
            }
            if param.deprecated {
                node.meta.deprecated = Some(true);
            }
            let target = tree.category_mut(category);
            if target.property(&param.name).is_some() {
                return Err(Error::conversion(format!(
                    "{}: parameter '{}' collides with another {} input",
                    operation.label(),
                    param.name,
                    category
                )));
            }
            target.insert(&param.name, node, param.required)?;
        }

        self.add_credentials(operation, &mut tree)?;

        // A body without content or without a JSON schema leaves `body` empty
        if let Some(body) = operation.request_body.as_ref().filter(|b| !b.content.is_empty()) {
            let Some((_, media)) = json_media_type(&body.content) else {
                let media_type = body.content.keys().next().cloned().unwrap_or_default();
                return Err(Error::unsupported(
                    format!("requestBody.content.{media_type}"),
                    format!("request body media type '{media_type}'"),
                ));
            };
            let Some(schema) = media.get("schema") else {
                return Ok(tree);
            };
            let node = schemas.translate(schema, "requestBody")?;
            match node.kind {
                SchemaKind::Object(object) => tree.body = object,
                _ => {
                    return Err(Error::unsupported(
                        "requestBody",
                        "request body schema that is not an object",
                    ))
                }
            }
        }

        Ok(tree)
    }

    /// The object schema of the first JSON `2xx` response, if any.
    ///
    /// Explicit codes are tried in ascending order before the `2XX` range.
    pub fn output_schema(&self, operation: &Operation) -> crate::Result<Option<SchemaNode>> {
        let mut candidates: Vec<&ResponseSpec> = operation
            .responses
            .iter()
            .filter(|r| success_rank(&r.status).is_some())
            .collect();
        candidates.sort_by_key(|r| success_rank(&r.status));

        for response in candidates {
            let Some(schema) = json_media_type(&response.content).and_then(|(_, m)| m.get("schema"))
            else {
                continue;
            };
            let path = format!("responses.{}", response.status);
            let mut node = self.schemas().translate(schema, &path)?;
            if node.as_object().is_none() {
                log::warn!(
                    "{}: omitting output schema, {} is not an object",
                    operation.label(),
                    path
                );
                return Ok(None);
            }
            if node.meta.description.is_none() {
                node.meta.description = response.description.clone();
            }
            return Ok(Some(node));
        }
        Ok(None)
    }

    fn category_of(&self, location: ParameterLocation, name: &str) -> Category {
        match location {
            ParameterLocation::Path => Category::Path,
            ParameterLocation::Query | ParameterLocation::Cookie => Category::Query,
            ParameterLocation::Header if self.config.is_auth_header(name) => Category::Auth,
            ParameterLocation::Header => Category::Query,
        }
    }

    /// Add one string property per credential named by the security requirements
    fn add_credentials(&self, operation: &Operation, tree: &mut ParameterTree) -> crate::Result<()> {
        let required = operation.security.len() == 1;
        for requirement in &operation.security {
            for scheme_name in requirement.keys() {
                let Some((category, name, description)) = self.credential(operation, scheme_name)?
                else {
                    continue;
                };
                let target = tree.category_mut(category);
                let exists = target.properties.iter().any(|(existing, _)| match category {
                    Category::Auth => existing.eq_ignore_ascii_case(&name),
                    _ => existing == &name,
                });
                if exists {
                    continue;
                }
                let node = SchemaNode::primitive(
                    PrimitiveType::String,
                    SchemaMetadata::described(Some(description)),
                );
                target.insert(&name, node, required)?;
            }
        }
        Ok(())
    }

    /// Where a security scheme puts its credential, or `None` when it is not an input
    fn credential(
        &self,
        operation: &Operation,
        scheme_name: &str,
    ) -> crate::Result<Option<(Category, String, String)>> {
        let raw = self.document.security_scheme(scheme_name).ok_or_else(|| {
            Error::conversion(format!(
                "{}: unknown security scheme '{}'",
                operation.label(),
                scheme_name
            ))
        })?;
        let scheme = resolve_node(
            self.document.as_json(),
            raw,
            &format!("components.securitySchemes.{scheme_name}"),
        )?;
        let field = |key: &str| scheme.get(key).and_then(JsonValue::as_str);
        let description = field("description")
            .map(String::from)
            .unwrap_or_else(|| format!("Authentication header for {scheme_name}"));

        let placement = match field("type") {
            Some("apiKey") => {
                let name = field("name").unwrap_or(scheme_name).to_string();
                match field("in") {
                    Some("header") => Some((Category::Auth, name)),
                    Some("query") => Some((Category::Query, name)),
                    Some("cookie") => None,
                    other => {
                        return Err(Error::conversion(format!(
                            "security scheme '{scheme_name}' has unknown location {other:?}"
                        )))
                    }
                }
            }
            Some("http") | Some("oauth2") | Some("openIdConnect") => {
                Some((Category::Auth, "Authorization".to_string()))
            }
            Some("mutualTLS") => None,
            other => {
                return Err(Error::conversion(format!(
                    "security scheme '{scheme_name}' has unknown type {other:?}"
                )))
            }
        };
        Ok(placement.map(|(category, name)| (category, name, description)))
    }
}

/// Sort key for success responses: explicit codes first, then the `2XX` range
fn success_rank(status: &str) -> Option<(u8, u16)> {
    if status.eq_ignore_ascii_case("2XX") {
        return Some((1, 0));
    }
    match status.parse::<u16>() {
        Ok(code) if (200..300).contains(&code) => Some((0, code)),
        _ => None,
    }
}
