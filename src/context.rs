//! Context documents
//!
//! A context is an opaque mapping owned by the registry. The client only relies on
//! the conventional `body.model` and `body.description` fields, the server-assigned
//! `id`, and `created_at`. Key order is preserved so exports mirror the source.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

/// Fields assigned by the registry and stripped before export.
pub const SERVER_ASSIGNED_FIELDS: [&str; 2] = ["id", "created_at"];

/// Serialization format for context files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Detect format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    /// Parse an `--output` value.
    pub fn parse(value: &str) -> Result<Self, ClientError> {
        match value.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            other => Err(ClientError::Config(format!(
                "Unsupported output format: {} (must be 'yaml' or 'json')",
                other
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Yaml => "yaml",
            DocumentFormat::Json => "json",
        }
    }
}

/// A context document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(ClientError::InvalidContext(format!(
                "expected a mapping, found {}",
                value_kind(&other)
            ))),
        }
    }

    /// Parse context text in the given format.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, ClientError> {
        let value: Value = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(content)?,
            DocumentFormat::Json => serde_json::from_str(content)?,
        };
        Self::from_value(value)
    }

    /// Load a context file. Unknown extensions are parsed as YAML.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            return Err(ClientError::InvalidContext(format!(
                "File {} does not exist",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let format = DocumentFormat::from_path(path).unwrap_or_else(|| {
            warn!(path = %path.display(), "Unknown file type, attempting YAML parse");
            DocumentFormat::Yaml
        });
        Self::parse(&content, format)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    pub fn context_name(&self) -> Option<&str> {
        self.get("context_name").and_then(Value::as_str)
    }

    fn body_str(&self, key: &str) -> Option<&str> {
        self.get("body")
            .and_then(|body| body.get(key))
            .and_then(Value::as_str)
    }

    /// `body.model`, if present.
    pub fn model(&self) -> Option<&str> {
        self.body_str("model")
    }

    /// `body.description`, used as the system prompt.
    pub fn description(&self) -> Option<&str> {
        self.body_str("description")
    }

    /// Set `body.model`, creating `body` when it is absent or not a mapping.
    pub fn set_model(&mut self, model: &str) {
        let body = self
            .0
            .entry("body")
            .or_insert_with(|| Value::Object(Map::new()));
        if !body.is_object() {
            *body = Value::Object(Map::new());
        }
        if let Value::Object(body) = body {
            body.insert("model".to_string(), Value::String(model.to_string()));
        }
    }

    /// Remove `id` and `created_at`, returning what was removed.
    pub fn strip_server_fields(&mut self) -> Vec<(String, Value)> {
        SERVER_ASSIGNED_FIELDS
            .iter()
            .filter_map(|field| {
                self.0
                    .shift_remove(*field)
                    .map(|value| (field.to_string(), value))
            })
            .collect()
    }

    /// Render for export: YAML in source key order, or two-space indented JSON.
    pub fn serialize(&self, format: DocumentFormat) -> Result<String, ClientError> {
        match format {
            DocumentFormat::Yaml => Ok(serde_yaml::to_string(&self.0)?),
            DocumentFormat::Json => Ok(serde_json::to_string_pretty(&self.0)?),
        }
    }
}

impl From<Map<String, Value>> for Context {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
