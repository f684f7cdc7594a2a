//! Raw configuration documents
//!
//! A document is the untyped tree read from disk, kept as a
//! [`serde_json::Value`] regardless of the encoding on disk.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Top-level key holding the schema version
pub const VERSION_KEY: &str = "version";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Document root must be a table, found {0}")]
    NotATable(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }

    pub fn parse(self, content: &str) -> Result<Value, DocumentError> {
        let value: Value = match self {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Toml => toml::from_str(content)?,
        };

        if !value.is_object() {
            return Err(DocumentError::NotATable(kind_name(&value)));
        }

        Ok(value)
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String, DocumentError> {
        match self {
            DocumentFormat::Json => {
                let mut content = serde_json::to_string_pretty(value)?;
                content.push('\n');
                Ok(content)
            }
            DocumentFormat::Toml => Ok(toml::to_string_pretty(value)?),
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            "toml" => Ok(DocumentFormat::Toml),
            _ => Err(format!("Invalid document format: {}", s)),
        }
    }
}

/// Schema version recorded in a raw document.
///
/// `None` when the key is absent. A present but non-integer tag is reported
/// as `Some(0)`, which no schema uses.
pub fn document_version(document: &Value) -> Option<u32> {
    document.get(VERSION_KEY).map(|tag| {
        tag.as_u64()
            .and_then(|version| u32::try_from(version).ok())
            .unwrap_or(0)
    })
}

/// Value at a dotted path such as `server.game.bindPort`
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |node, segment| node.as_object()?.get(segment))
}

pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}
