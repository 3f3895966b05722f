//! Tool declarations offered to the generative model.
//!
//! A declaration names a capability and types its parameters; the wire
//! schema is rendered from the typed form on demand. Declarations are built
//! once at startup and never change: renaming a tool or altering its
//! required parameters breaks the selection contract with the model.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

/// The type of a single tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// A string value.
    String,
    /// A floating-point number.
    Number,
    /// An integer value.
    Integer,
    /// A boolean value.
    Boolean,
}

impl ParameterType {
    /// The JSON-schema type name.
    #[must_use]
    pub fn as_schema_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// A named, typed parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub param_type: ParameterType,
    /// Human-readable description shown to the model.
    pub description: String,
    /// Whether the model must supply this parameter.
    pub required: bool,
}

impl ToolParameter {
    /// Creates a required parameter.
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
        }
    }

    /// Creates an optional parameter.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
        }
    }
}

/// A named capability offered to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Typed parameters.
    pub parameters: Vec<ToolParameter>,
}

impl ToolDeclaration {
    /// Creates a declaration with no parameters yet.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Renders the parameter list as a JSON-schema object.
    #[must_use]
    pub fn parameter_schema(&self) -> JsonValue {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for parameter in &self.parameters {
            properties.insert(
                parameter.name.clone(),
                json!({
                    "type": parameter.param_type.as_schema_type(),
                    "description": parameter.description,
                }),
            );
            if parameter.required {
                required.push(JsonValue::String(parameter.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
