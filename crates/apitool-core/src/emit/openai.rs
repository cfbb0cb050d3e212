//! OpenAI function-calling envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use super::{Descriptor, DescriptorBuilder};
use crate::naming;
use crate::openapi::Operation;
use crate::translate::{OperationTranslator, ParameterTree};

/// `{"type": "function", "function": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// Object schema with exactly the four categories
    pub parameters: JsonValue,
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct OpenAiBuilder;

impl DescriptorBuilder for OpenAiBuilder {
    fn name(&self, op: &Operation) -> String {
        naming::function_name(op)
    }

    fn build(&self, translator: &OperationTranslator<'_>, op: &Operation) -> crate::Result<Descriptor> {
        let tree = translator.parameter_tree(op)?;
        Ok(Descriptor::Function(FunctionDefinition {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: self.name(op),
                description: naming::description(op),
                parameters: render_parameters(&tree),
                strict: true,
            },
        }))
    }
}

/// Render a parameter tree as the `parameters` object.
///
/// Every category is present and required, and no object accepts
/// undeclared keys at the category level.
pub fn render_parameters(tree: &ParameterTree) -> JsonValue {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (category, object) in tree.iter() {
        let mut rendered = Map::new();
        rendered.insert("type".to_string(), json!("object"));
        object.render_into(&mut rendered, true);
        rendered.insert("additionalProperties".to_string(), json!(false));
        properties.insert(category.as_str().to_string(), JsonValue::Object(rendered));
        required.push(json!(category.as_str()));
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}
