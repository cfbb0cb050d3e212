//! MCP tool envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use super::{Descriptor, DescriptorBuilder};
use crate::naming;
use crate::openapi::Operation;
use crate::translate::OperationTranslator;

/// An MCP tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
    /// Object schema of the first JSON success response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<JsonValue>,
}

#[derive(Debug, Clone)]
pub struct McpBuilder;

impl DescriptorBuilder for McpBuilder {
    fn name(&self, op: &Operation) -> String {
        naming::tool_name(op)
    }

    fn build(&self, translator: &OperationTranslator<'_>, op: &Operation) -> crate::Result<Descriptor> {
        let input = translator
            .parameter_tree(op)?
            .merged()
            .map_err(|e| match e {
                crate::Error::Conversion(msg) => {
                    crate::Error::conversion(format!("{}: {}", op.label(), msg))
                }
                other => other,
            })?;

        let mut input_schema = Map::new();
        input_schema.insert("type".to_string(), json!("object"));
        input.render_into(&mut input_schema, true);

        let output_schema = translator.output_schema(op)?.map(|node| node.to_json());

        Ok(Descriptor::Tool(ToolDefinition {
            name: self.name(op),
            description: naming::description(op),
            input_schema: JsonValue::Object(input_schema),
            output_schema,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConverterConfig, TargetFormat};
    use crate::openapi::{extract_operations, Document};

    fn users() -> Document {
        Document::from_value(json!({
            "openapi": "3.1.0",
            "info": {"title": "Users", "version": "1"},
            "paths": {"/users": {"post": {
                "summary": "Create user",
                "requestBody": {"required": true, "content": {"application/json": {"schema": {
                    "type": "object",
                    "required": ["username", "email"],
                    "properties": {
                        "username": {"type": "string"},
                        "email": {"type": "string", "format": "email"},
                        "age": {"type": "integer"}
                    }
                }}}},
                "responses": {"201": {"description": "Created", "content": {"application/json": {"schema": {
                    "type": "object",
                    "required": ["id", "username", "email", "createdAt"],
                    "properties": {
                        "id": {"type": "integer"},
                        "username": {"type": "string"},
                        "email": {"type": "string"},
                        "createdAt": {"type": "string", "format": "date-time"}
                    }
                }}}}}
            }}}
        }))
        .unwrap()
    }

    #[test]
    fn test_create_user_tool() -> crate::Result<()> {
        let doc = users();
        let config = ConverterConfig::new(TargetFormat::Mcp);
        let ops = extract_operations(&doc)?;
        let translator = OperationTranslator::new(&doc, &config);
        let Descriptor::Tool(tool) = McpBuilder.build(&translator, &ops[0])? else {
            panic!("expected a tool definition");
        };

        assert_eq!(tool.name, "POST /users");
        assert_eq!(tool.description, "Create user");
        assert_eq!(tool.input_schema["type"], "object");
        assert_eq!(tool.input_schema["required"], json!(["username", "email"]));
        let output = tool.output_schema.expect("output schema");
        assert_eq!(output["required"], json!(["id", "username", "email", "createdAt"]));
        Ok(())
    }

    #[test]
    fn test_output_schema_is_optional() -> crate::Result<()> {
        let doc = Document::from_value(json!({
            "openapi": "3.0.0",
            "paths": {"/health": {"get": {"responses": {"204": {"description": "ok"}}}}}
        }))?;
        let config = ConverterConfig::new(TargetFormat::Mcp);
        let ops = extract_operations(&doc)?;
        let translator = OperationTranslator::new(&doc, &config);
        let descriptor = McpBuilder.build(&translator, &ops[0])?;

        let value = serde_json::to_value(&descriptor)?;
        assert_eq!(
            value,
            json!({
                "name": "GET /health",
                "description": "",
                "inputSchema": {"type": "object", "properties": {}, "required": []}
            })
        );
        Ok(())
    }
}
