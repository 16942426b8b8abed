//! Typed JSON-schema subset used to describe tool parameters.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter schema, serialized with its JSON-schema `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterSchema {
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        properties: BTreeMap<String, ParameterSchema>,
        #[serde(default)]
        required: Vec<String>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        items: Box<ParameterSchema>,
    },
}

impl ParameterSchema {
    /// Start an empty object schema.
    pub fn object() -> Self {
        Self::Object {
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::String {
            description: Some(description.into()),
        }
    }

    pub fn array(items: ParameterSchema) -> Self {
        Self::Array {
            description: None,
            items: Box::new(items),
        }
    }

    /// Add a property to an object schema; no-op on other variants.
    pub fn property(mut self, name: &str, schema: ParameterSchema, is_required: bool) -> Self {
        if let Self::Object {
            properties,
            required,
            ..
        } = &mut self
        {
            properties.insert(name.to_string(), schema);
            if is_required {
                required.push(name.to_string());
            }
        }
        self
    }

    /// Names listed in `required` (empty for non-object schemas).
    pub fn required(&self) -> &[String] {
        match self {
            Self::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Property names of an object schema.
    pub fn property_names(&self) -> Vec<&str> {
        match self {
            Self::Object { properties, .. } => properties.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Check that every `required` entry names a declared property,
    /// recursing into nested objects and array items.
    pub fn validate(&self, path: &str) -> Result<()> {
        match self {
            Self::Object {
                properties,
                required,
                ..
            } => {
                for key in required {
                    if !properties.contains_key(key) {
                        return Err(Error::Config(format!(
                            "{path}: required parameter '{key}' is not a declared property"
                        )));
                    }
                }
                for (name, child) in properties {
                    child.validate(&format!("{path}.{name}"))?;
                }
                Ok(())
            }
            Self::String { .. } => Ok(()),
            Self::Array { items, .. } => items.validate(&format!("{path}[]")),
        }
    }
}

/// Definition of a tool exposed to the chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl ToolSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("tool name must not be empty".into()));
        }
        if !matches!(self.parameters, ParameterSchema::Object { .. }) {
            return Err(Error::Config(format!(
                "tool '{}': parameters must be an object schema",
                self.name
            )));
        }
        self.parameters.validate(&self.name)
    }
}
