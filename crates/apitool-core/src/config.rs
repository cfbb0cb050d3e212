//! Configuration management for apitool conversions.
//!
//! This module defines the `ConverterConfig` struct that controls which
//! operations are converted, which output envelope is produced, and how
//! header parameters are classified. The configuration can be loaded from a
//! YAML file or created programmatically.
//!
//! # Examples
//!
//! ```no_run
//! use apitool_core::config::{ConverterConfig, TargetFormat};
//!
//! # #[tokio::main]
//! # async fn main() -> apitool_core::Result<()> {
//! // Create a new config programmatically
//! let mut config = ConverterConfig::new(TargetFormat::Mcp);
//! config.skip_deprecated = true;
//!
//! // Or load from a config file
//! let config = ConverterConfig::from_file("apitool.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::path::Path;

// External imports (alphabetized)
use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;

/// Output envelope produced by a conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// OpenAI function-calling definitions
    #[default]
    #[value(name = "openai")]
    OpenAi,
    /// MCP tool definitions
    Mcp,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::OpenAi => "openai",
            TargetFormat::Mcp => "mcp",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an OpenAPI conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Output envelope to produce
    #[serde(default)]
    pub target: TargetFormat,

    /// Header parameter names treated as credentials (case-insensitive)
    #[serde(
        default = "default_auth_headers",
        deserialize_with = "deserialize_header_names"
    )]
    pub auth_headers: Vec<String>,

    /// Maximum nesting depth accepted while translating a schema
    #[serde(default = "default_max_schema_depth")]
    pub max_schema_depth: usize,

    /// Maximum number of nodes one translated schema may expand to
    #[serde(default = "default_max_schema_nodes")]
    pub max_schema_nodes: usize,

    /// Operations to convert, by operationId or `METHOD /path` (empty means all)
    #[serde(default)]
    pub include_operations: Vec<String>,

    /// Operations to leave out, by operationId or `METHOD /path`
    #[serde(default)]
    pub exclude_operations: Vec<String>,

    /// Whether operations marked `deprecated: true` are left out
    #[serde(default)]
    pub skip_deprecated: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self::new(TargetFormat::default())
    }
}

impl ConverterConfig {
    /// Create a new ConverterConfig with default values
    pub fn new(target: TargetFormat) -> Self {
        Self {
            target,
            auth_headers: default_auth_headers(),
            max_schema_depth: default_max_schema_depth(),
            max_schema_nodes: default_max_schema_nodes(),
            include_operations: Vec::new(),
            exclude_operations: Vec::new(),
            skip_deprecated: false,
        }
    }

    /// Load configuration from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check values that serde defaults cannot rule out
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_schema_depth == 0 {
            return Err(crate::Error::config("max_schema_depth must be at least 1"));
        }
        if self.max_schema_nodes == 0 {
            return Err(crate::Error::config("max_schema_nodes must be at least 1"));
        }
        if self.auth_headers.iter().any(|h| h.trim().is_empty()) {
            return Err(crate::Error::config("auth_headers must not contain empty names"));
        }
        Ok(())
    }

    /// Whether a header parameter name is one of the configured auth headers
    pub fn is_auth_header(&self, name: &str) -> bool {
        self.auth_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }

    /// Whether an operation passes the include/exclude filters.
    ///
    /// `keys` are the identifiers the operation can be selected by
    /// (its operationId, if any, and its `METHOD /path` name).
    pub fn selects(&self, keys: &[&str], deprecated: bool) -> bool {
        if deprecated && self.skip_deprecated {
            return false;
        }
        let listed = |list: &[String]| list.iter().any(|entry| keys.contains(&entry.as_str()));
        if !self.include_operations.is_empty() && !listed(&self.include_operations) {
            return false;
        }
        !listed(&self.exclude_operations)
    }
}

fn default_auth_headers() -> Vec<String> {
    [
        "Authorization",
        "X-Api-Key",
        "Api-Key",
        "X-Auth-Token",
        "Proxy-Authorization",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_schema_depth() -> usize {
    32
}

fn default_max_schema_nodes() -> usize {
    crate::schema::DEFAULT_MAX_NODES
}

/// Accept either a single header name or a list of header names
fn deserialize_header_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Seq(seq) => {
            let mut result = Vec::with_capacity(seq.len());
            for item in seq {
                if let SerdeValue::String(s) = item {
                    result.push(s);
                } else {
                    return Err(serde::de::Error::custom(
                        "Expected string or array of strings",
                    ));
                }
            }
            Ok(result)
        }
        _ => Err(serde::de::Error::custom(
            "Expected string or array of strings",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_roundtrip() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("apitool.yaml");

        let mut config = ConverterConfig::new(TargetFormat::Mcp);
        config.exclude_operations.push("DELETE /pets/{petId}".to_string());
        config.save(&file_path).await?;

        let loaded = ConverterConfig::from_file(&file_path).await?;
        assert_eq!(loaded.target, TargetFormat::Mcp);
        assert_eq!(loaded.auth_headers, default_auth_headers());
        assert_eq!(loaded.max_schema_depth, 32);
        assert_eq!(loaded.max_schema_nodes, 10_000);
        assert_eq!(loaded.include_operations, Vec::<String>::new());
        assert_eq!(loaded.exclude_operations, vec!["DELETE /pets/{petId}"]);
        assert!(!loaded.skip_deprecated);

        Ok(())
    }

    #[test]
    fn test_defaults_from_empty_document() {
        let config: ConverterConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.target, TargetFormat::OpenAi);
        assert!(config.is_auth_header("authorization"));
        assert!(config.is_auth_header("X-API-KEY"));
        assert!(!config.is_auth_header("X-Request-Id"));
    }

    #[test]
    fn test_auth_headers_single_string() {
        let config: ConverterConfig =
            serde_yaml::from_str("target: mcp\nauth_headers: X-Secret").unwrap();
        assert_eq!(config.auth_headers, vec!["X-Secret".to_string()]);
        assert!(!config.is_auth_header("Authorization"));
    }

    #[test]
    fn test_auth_headers_rejects_non_strings() {
        let result: Result<ConverterConfig, _> = serde_yaml::from_str("auth_headers: [1, 2]");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_depth_is_rejected() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("apitool.yaml");
        tokio::fs::write(&file_path, "max_schema_depth: 0\n").await?;

        let err = ConverterConfig::from_file(&file_path).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);

        tokio::fs::write(&file_path, "max_schema_nodes: 0\n").await?;
        let err = ConverterConfig::from_file(&file_path).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
        Ok(())
    }

    #[test]
    fn test_operation_selection() {
        let mut config = ConverterConfig::default();
        assert!(config.selects(&["listPets", "GET /pets"], false));

        config.skip_deprecated = true;
        assert!(!config.selects(&["listPets", "GET /pets"], true));

        config.include_operations = vec!["GET /pets".to_string()];
        assert!(config.selects(&["listPets", "GET /pets"], false));
        assert!(!config.selects(&["createPet", "POST /pets"], false));

        config.exclude_operations = vec!["listPets".to_string()];
        assert!(!config.selects(&["listPets", "GET /pets"], false));
    }
}
