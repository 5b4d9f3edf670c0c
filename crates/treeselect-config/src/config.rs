//! TOML parser for fields.toml.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use treeselect::{
    decode_with, ChoiceError, DecodeOptions, FieldSettings, OnMalformed, ReturnFormat,
    SelectionPath, TreeSelectField,
};

/// Behavior when a choice path is removed from config but exists in lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnRemove {
    /// Fail the load (default, safest)
    #[default]
    Error,
    /// Log a warning and mark the path deprecated in the lock
    Warn,
}

/// Parsed fields configuration.
#[derive(Debug, Clone)]
pub struct FieldsConfig {
    pub on_malformed: OnMalformed,
    pub on_remove: OnRemove,
    fields: Vec<TreeSelectField>,
    /// Lines dropped by `on_malformed = "skip"`, per field name.
    skipped: Vec<(String, ChoiceError)>,
}

/// Raw TOML structure.
#[derive(Debug, Deserialize)]
struct RawFieldsConfig {
    #[serde(default)]
    on_malformed: OnMalformed,
    #[serde(default)]
    on_remove: OnRemove,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    allow_parent: bool,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    return_format: ReturnFormat,
    /// Choice text, one `<path> : <label>` per line
    #[serde(default)]
    choices: String,
}

impl FieldsConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawFieldsConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let options = DecodeOptions {
            on_malformed: raw.on_malformed,
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut fields = Vec::with_capacity(raw.fields.len());
        let mut skipped = Vec::new();

        for field in raw.fields {
            validate_name(&field.name)?;
            if !seen.insert(field.name.clone()) {
                return Err(ConfigError::Validation(format!(
                    "Duplicate field name '{}'",
                    field.name
                )));
            }

            let decoded = decode_with(&field.choices, options).map_err(|source| {
                ConfigError::Choices {
                    field: field.name.clone(),
                    source,
                }
            })?;
            skipped.extend(decoded.skipped.into_iter().map(|e| (field.name.clone(), e)));

            fields.push(TreeSelectField::new(FieldSettings {
                label: field.label.unwrap_or_else(|| field.name.clone()),
                name: field.name,
                choices: decoded.tree,
                allow_parent: field.allow_parent,
                return_format: field.return_format,
                required: field.required,
            }));
        }

        Ok(Self {
            on_malformed: raw.on_malformed,
            on_remove: raw.on_remove,
            fields,
            skipped,
        })
    }

    /// Get all fields.
    pub fn fields(&self) -> impl Iterator<Item = &TreeSelectField> {
        self.fields.iter()
    }

    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&TreeSelectField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Lines skipped while decoding choices.
    pub fn skipped(&self) -> &[(String, ChoiceError)] {
        &self.skipped
    }

    /// Every `(field, choice path)` pair, in field then DFS order.
    pub fn choice_paths(&self) -> impl Iterator<Item = (&str, SelectionPath)> + '_ {
        self.fields
            .iter()
            .flat_map(|f| f.choices().paths().into_iter().map(move |p| (f.name(), p)))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Field names end up in form input names, so keep them to identifier-like
/// characters.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigError::Validation("Empty field name not allowed".into()));
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(ConfigError::Validation(format!(
            "Invalid field name '{}': must start with a letter or underscore",
            name
        )));
    }
    if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-') {
        return Err(ConfigError::Validation(format!(
            "Invalid field name '{}': contains invalid character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Errors during config parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Choices of field '{field}': {source}")]
    Choices {
        field: String,
        #[source]
        source: ChoiceError,
    },
}
