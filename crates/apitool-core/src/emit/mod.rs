//! Descriptor builders for the supported output envelopes.
pub mod mcp;
pub mod openai;

use serde::{Deserialize, Serialize};

use crate::config::TargetFormat;
use crate::openapi::Operation;
use crate::translate::OperationTranslator;

pub use mcp::ToolDefinition;
pub use openai::FunctionDefinition;

/// Trait for rendering one operation into a target-specific descriptor.
pub trait DescriptorBuilder {
    /// The name the descriptor will carry, unique per document
    fn name(&self, op: &Operation) -> String;

    fn build(&self, translator: &OperationTranslator<'_>, op: &Operation) -> crate::Result<Descriptor>;
}

/// One emitted definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Descriptor {
    Function(FunctionDefinition),
    Tool(ToolDefinition),
}

impl Descriptor {
    pub fn name(&self) -> &str {
        match self {
            Descriptor::Function(function) => &function.function.name,
            Descriptor::Tool(tool) => &tool.name,
        }
    }
}

pub fn get_builder(target: TargetFormat) -> Box<dyn DescriptorBuilder> {
    match target {
        TargetFormat::OpenAi => Box::new(openai::OpenAiBuilder),
        TargetFormat::Mcp => Box::new(mcp::McpBuilder),
    }
}
