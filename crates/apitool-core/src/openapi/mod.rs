//! OpenAPI specification loading and utilities.
//!
//! This module provides functionality for loading and validating OpenAPI
//! 3.0/3.1 documents and convenient accessors for common fields. Operations
//! are extracted by [`extract`], and `$ref`s are resolved by [`resolver`].
//!
//! # Examples
//!
//! ```no_run
//! use apitool_core::openapi::{Document, SpecSource};
//!
//! # #[tokio::main]
//! # async fn main() -> apitool_core::Result<()> {
//! // Load an OpenAPI spec from a file
//! let spec = Document::load(SpecSource::Path("openapi.yaml".into())).await?;
//!
//! // Access common fields
//! if let Some(title) = spec.title() {
//!     println!("API Title: {}", title);
//! }
//! println!("OpenAPI version: {}", spec.spec_version());
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod resolver;
pub mod types;

// Internal imports (std, crate)
use std::fmt;
use std::path::{Path, PathBuf};

use crate::Error;

// External imports (alphabetized)
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use url::Url;

pub use extract::extract_operations;
pub use types::*;

/// Where an OpenAPI document comes from
#[derive(Debug, Clone)]
pub enum SpecSource {
    /// A YAML or JSON file on the local filesystem
    Path(PathBuf),
    /// Raw YAML or JSON text
    Text(String),
    /// An already-parsed document
    Value(JsonValue),
}

impl From<PathBuf> for SpecSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SpecSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<JsonValue> for SpecSource {
    fn from(value: JsonValue) -> Self {
        Self::Value(value)
    }
}

/// Supported OpenAPI major/minor versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenApiVersion {
    V3_0,
    V3_1,
}

/// The `openapi` field of a validated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecVersion {
    pub version: OpenApiVersion,
    /// The version string exactly as declared (e.g. "3.0.3")
    pub raw: String,
}

impl SpecVersion {
    fn parse(raw: &str) -> crate::Result<Self> {
        let mut parts = raw.trim().split('.');
        let version = match (parts.next(), parts.next()) {
            (Some("3"), Some("0")) => OpenApiVersion::V3_0,
            (Some("3"), Some("1")) => OpenApiVersion::V3_1,
            _ => {
                return Err(Error::validation(format!(
                    "Unsupported OpenAPI version: {raw}"
                )))
            }
        };
        Ok(Self {
            version,
            raw: raw.to_string(),
        })
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A validated OpenAPI document
#[derive(Debug, Clone)]
pub struct Document {
    /// The raw JSON value of the OpenAPI spec, always an object
    json: JsonValue,
    version: SpecVersion,
}

impl Document {
    /// Load a document from any supported source
    pub async fn load(source: SpecSource) -> crate::Result<Self> {
        match source {
            SpecSource::Path(path) => Self::from_file(path).await,
            SpecSource::Text(text) => Self::from_text(&text),
            SpecSource::Value(value) => Self::from_value(value),
        }
    }

    /// Load a document from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::validation(format!(
                "Failed to read specification file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_text(&content).map_err(|e| match e {
            Error::Validation(msg) => {
                Error::validation(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse a document from YAML or JSON text
    pub fn from_text(content: &str) -> crate::Result<Self> {
        Self::from_value(parse_content(content)?)
    }

    /// Validate an already-parsed document
    pub fn from_value(value: JsonValue) -> crate::Result<Self> {
        let Some(root) = value.as_object() else {
            return Err(Error::validation("Specification must be a mapping"));
        };

        let version = match root.get("openapi") {
            None => return Err(Error::validation("Missing required field: openapi")),
            Some(JsonValue::String(raw)) => SpecVersion::parse(raw)?,
            Some(other) => {
                return Err(Error::validation(format!(
                    "Field 'openapi' must be a string, found {other}"
                )))
            }
        };

        match root.get("paths") {
            None => return Err(Error::validation("Missing required field: paths")),
            Some(JsonValue::Object(paths)) if paths.is_empty() => {
                return Err(Error::validation("Field 'paths' must declare at least one path"))
            }
            Some(JsonValue::Object(_)) => {}
            Some(_) => return Err(Error::validation("Field 'paths' must be a mapping")),
        }

        log::debug!("Loaded OpenAPI {} document", version);
        Ok(Self {
            json: value,
            version,
        })
    }

    /// Get a reference to the raw JSON value
    pub fn as_json(&self) -> &JsonValue {
        &self.json
    }

    pub fn spec_version(&self) -> &SpecVersion {
        &self.version
    }

    /// The `paths` mapping, in document order
    pub fn paths(&self) -> &Map<String, JsonValue> {
        // Presence and shape are checked in `from_value`.
        self.json
            .get("paths")
            .and_then(JsonValue::as_object)
            .expect("paths validated at load time")
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn api_version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    /// Get the base URL of the API from the first absolute `servers` entry
    pub fn base_url(&self) -> Option<Url> {
        self.json
            .get("servers")?
            .as_array()?
            .iter()
            .filter_map(|server| server.get("url").and_then(JsonValue::as_str))
            .find_map(|url| Url::parse(url).ok())
    }

    /// Document-level security requirements
    pub fn security(&self) -> Option<&Vec<JsonValue>> {
        self.json.get("security")?.as_array()
    }

    /// Look up a scheme in `components.securitySchemes`
    pub fn security_scheme(&self, name: &str) -> Option<&JsonValue> {
        self.json
            .get("components")?
            .get("securitySchemes")?
            .get(name)
    }
}

/// Parse content as either JSON or YAML
fn parse_content(content: &str) -> crate::Result<JsonValue> {
    // Try to parse as JSON first
    if let Ok(json) = serde_json::from_str(content) {
        return Ok(json);
    }

    // If JSON parsing fails, try YAML
    serde_yaml::from_str(content)
        .map_err(|e| Error::validation(format!("Failed to parse specification: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;
    use tempfile::tempdir;

    fn minimal(version: &str) -> JsonValue {
        json!({
            "openapi": version,
            "info": {"title": "Test API", "version": "1.0.0"},
            "paths": {"/ping": {"get": {"summary": "Ping"}}}
        })
    }

    #[tokio::test]
    async fn test_from_file() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi.json");
        let json_content = r#"
        {
            "openapi": "3.0.0",
            "info": {
                "title": "Test API Async",
                "version": "2.0.0"
            },
            "servers": [
                {
                    "url": "https://api.example.com/v2"
                }
            ],
            "paths": {"/items": {"get": {}}}
        }
        "#;
        tokio::fs::write(&file_path, json_content).await?;

        let spec = Document::load(SpecSource::Path(file_path)).await?;
        assert_eq!(spec.title(), Some("Test API Async"));
        assert_eq!(spec.api_version(), Some("2.0.0"));
        assert_eq!(
            spec.base_url().map(|u| u.to_string()),
            Some("https://api.example.com/v2".to_string())
        );
        assert_eq!(spec.spec_version().version, OpenApiVersion::V3_0);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_validation_error() {
        let err = Document::from_file("/definitely/not/here.yaml")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_yaml_text() -> crate::Result<()> {
        let yaml = r#"
openapi: 3.1.0
info:
  title: Test API
  version: 1.0.0
paths:
  /test:
    get:
      summary: Test endpoint
"#;
        let spec = Document::from_text(yaml)?;
        assert_eq!(spec.spec_version().version, OpenApiVersion::V3_1);
        assert_eq!(spec.spec_version().to_string(), "3.1.0");
        assert!(spec.paths().contains_key("/test"));
        Ok(())
    }

    #[test]
    fn test_yaml_preserves_path_order() -> crate::Result<()> {
        let yaml = "openapi: 3.0.3\npaths:\n  /zeta: {}\n  /alpha: {}\n  /mid: {}\n";
        let spec = Document::from_text(yaml)?;
        let keys: Vec<_> = spec.paths().keys().cloned().collect();
        assert_eq!(keys, vec!["/zeta", "/alpha", "/mid"]);
        Ok(())
    }

    #[test]
    fn test_invalid_spec_string() {
        let err = Document::from_text("invalid spec").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unparsable_text() {
        let err = Document::from_text("openapi: [3.0\npaths: {").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_missing_paths() {
        let err = Document::from_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "Test API", "version": "1.0.0"}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("paths")));
    }

    #[test]
    fn test_empty_paths() {
        let err = Document::from_value(json!({"openapi": "3.0.0", "paths": {}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_unsupported_versions() {
        for version in ["2.0", "3.2.0", "4.0.0", "three"] {
            let err = Document::from_value(minimal(version)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "version {version}");
        }
        let err = Document::from_value(json!({"openapi": 3.0, "paths": {"/a": {}}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_swagger_document_is_rejected() {
        let err = Document::from_value(json!({"swagger": "2.0", "paths": {"/a": {}}})).unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("openapi")));
    }

    #[test]
    fn test_relative_server_has_no_base_url() -> crate::Result<()> {
        let mut value = minimal("3.0.1");
        value["servers"] = json!([{"url": "/v1"}, {"url": "https://example.com/v1"}]);
        let spec = Document::from_value(value)?;
        assert_eq!(
            spec.base_url().map(|u| u.to_string()),
            Some("https://example.com/v1".to_string())
        );
        Ok(())
    }
}
