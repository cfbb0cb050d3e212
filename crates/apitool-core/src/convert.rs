//! Conversion entry point.
//!
//! A [`Converter`] owns one validated [`Document`] and one
//! [`ConverterConfig`], and renders every selected operation with the builder
//! for the configured target.
//!
//! # Examples
//!
//! ```no_run
//! use apitool_core::{Converter, ConverterConfig, SpecSource, TargetFormat};
//!
//! # #[tokio::main]
//! # async fn main() -> apitool_core::Result<()> {
//! let config = ConverterConfig::new(TargetFormat::Mcp);
//! let converter = Converter::from_source(SpecSource::Path("openapi.yaml".into()), config).await?;
//! let (tools, json) = converter.convert()?;
//! println!("{} tools\n{}", tools.len(), json);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use crate::config::ConverterConfig;
use crate::emit::{get_builder, Descriptor, DescriptorBuilder};
use crate::openapi::{extract_operations, Document, Operation, SpecSource};
use crate::translate::OperationTranslator;
use crate::Error;

/// Converts the operations of one document
#[derive(Debug, Clone)]
pub struct Converter {
    document: Document,
    config: ConverterConfig,
}

/// One operation that could not be converted
#[derive(Debug)]
pub struct OperationFailure {
    /// `METHOD /path` of the failed operation
    pub label: String,
    pub error: Error,
}

/// Outcome of a best-effort conversion
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub descriptors: Vec<Descriptor>,
    pub failures: Vec<OperationFailure>,
}

impl ConversionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The converted descriptors as a pretty-printed JSON array
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.descriptors)?)
    }
}

impl Converter {
    pub fn new(document: Document, config: ConverterConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { document, config })
    }

    /// Load a document and wrap it in a converter
    pub async fn from_source(source: SpecSource, config: ConverterConfig) -> crate::Result<Self> {
        let document = Document::load(source).await?;
        Self::new(document, config)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Operations that pass the configured filters, in extraction order
    pub fn operations(&self) -> crate::Result<Vec<Operation>> {
        let operations = extract_operations(&self.document)?;
        Ok(operations
            .into_iter()
            .filter(|op| {
                let label = op.label();
                let mut keys = vec![label.as_str()];
                if let Some(id) = op.operation_id.as_deref() {
                    keys.push(id);
                }
                let selected = self.config.selects(&keys, op.deprecated);
                if !selected {
                    log::debug!("Skipping {} (filtered by configuration)", label);
                }
                selected
            })
            .collect())
    }

    /// Convert every operation, failing on the first error.
    ///
    /// Returns the descriptors and their pretty-printed JSON array.
    pub fn convert(&self) -> crate::Result<(Vec<Descriptor>, String)> {
        let builder = get_builder(self.config.target);
        let translator = OperationTranslator::new(&self.document, &self.config);
        let operations = self.operations()?;

        check_unique_names(builder.as_ref(), &operations)?;

        let mut descriptors = Vec::with_capacity(operations.len());
        for op in &operations {
            log::debug!("Converting {}", op.label());
            descriptors.push(builder.build(&translator, op)?);
        }

        let json = serde_json::to_string_pretty(&descriptors)?;
        Ok((descriptors, json))
    }

    /// Convert every operation, collecting failures instead of stopping.
    ///
    /// Document-level problems (unreadable paths, duplicate names) still fail
    /// the whole call.
    pub fn convert_report(&self) -> crate::Result<ConversionReport> {
        let builder = get_builder(self.config.target);
        let translator = OperationTranslator::new(&self.document, &self.config);
        let operations = self.operations()?;

        check_unique_names(builder.as_ref(), &operations)?;

        let mut report = ConversionReport::default();
        for op in &operations {
            match builder.build(&translator, op) {
                Ok(descriptor) => report.descriptors.push(descriptor),
                Err(error) => {
                    log::warn!("Skipping {}: {}", op.label(), error);
                    report.failures.push(OperationFailure {
                        label: op.label(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }
}

fn check_unique_names(builder: &dyn DescriptorBuilder, operations: &[Operation]) -> crate::Result<()> {
    let mut seen: HashMap<String, String> = HashMap::new();
    for op in operations {
        let name = builder.name(op);
        if let Some(previous) = seen.get(&name) {
            return Err(Error::conversion(format!(
                "{} and {} both convert to the name '{}'",
                previous,
                op.label(),
                name
            )));
        }
        seen.insert(name, op.label());
    }
    Ok(())
}
