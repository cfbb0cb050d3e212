//! Core types for extracted OpenAPI operations

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// HTTP methods an OpenAPI path item can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Extraction order: the common verbs first, then the rest alphabetically
    pub const ORDERED: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    /// The lowercase key used in a path item
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Trace => "trace",
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

/// Parameter location based on the OpenAPI "in" field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// A single declared parameter, with any `$ref` already resolved
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterSpec {
    /// The name of the parameter. Parameter names are case sensitive.
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub deprecated: bool,
    /// The raw schema of the parameter, translated later
    pub schema: JsonValue,
}

/// The request body of an operation, with any `$ref` already resolved
#[derive(Clone, Debug, PartialEq)]
pub struct RequestBodySpec {
    /// Media type → media type object, in document order
    pub content: Map<String, JsonValue>,
}

/// One response of an operation, with any `$ref` already resolved
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSpec {
    /// Status code key as written ("200", "2XX", "default")
    pub status: String,
    /// Fallback description of the output schema
    pub description: Option<String>,
    pub content: Map<String, JsonValue>,
}

/// One HTTP method bound to one path template
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub method: HttpMethod,
    /// The path where this operation is defined (e.g., "/pet/{petId}")
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Path-level parameters first, then operation-level ones
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
    /// Responses in document order
    pub responses: Vec<ResponseSpec>,
    /// Effective security requirements (operation-level, else document-level)
    pub security: Vec<Map<String, JsonValue>>,
}

impl Operation {
    /// The `METHOD /path` form used for MCP tool names and logging
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Pick the JSON media type out of a content map.
///
/// Media type parameters (`application/json; charset=utf-8`) are accepted.
pub fn json_media_type(content: &Map<String, JsonValue>) -> Option<(&str, &JsonValue)> {
    content.iter().find_map(|(media_type, media)| {
        let essence = media_type.split(';').next().unwrap_or_default().trim();
        essence
            .eq_ignore_ascii_case("application/json")
            .then_some((media_type.as_str(), media))
    })
}
