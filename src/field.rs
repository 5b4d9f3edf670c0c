//! Tree-select field: settings plus the load/save/validate operations a
//! host field framework calls.
//!
//! The host hands over plain strings and nested form values; everything here
//! is a pure transformation over them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{self, DecodeOptions};
use crate::error::{ChoiceError, FieldError};
use crate::form;
use crate::path::SelectionPath;
use crate::render::{self, SelectInput};
use crate::resolve::{resolve, Resolution};
use crate::tree::ChoiceTree;

/// Shape of the value handed to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnFormat {
    /// Selected keys, root first.
    #[default]
    Array,
}

/// Per-field configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSettings {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub choices: ChoiceTree,
    /// Accept a selection that stops on a choice with sub-choices.
    #[serde(default)]
    pub allow_parent: bool,
    #[serde(default)]
    pub return_format: ReturnFormat,
    #[serde(default)]
    pub required: bool,
}

/// Template-facing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormattedValue {
    Array(Vec<String>),
}

/// A configured tree-select field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSelectField {
    settings: FieldSettings,
}

impl TreeSelectField {
    pub fn new(settings: FieldSettings) -> Self {
        Self { settings }
    }

    #[inline]
    pub fn settings(&self) -> &FieldSettings {
        &self.settings
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    #[inline]
    pub fn choices(&self) -> &ChoiceTree {
        &self.settings.choices
    }

    /// Choices as editable text, for the settings form.
    pub fn settings_text(&self) -> Result<String, ChoiceError> {
        codec::encode(&self.settings.choices)
    }

    /// Replace the choices from edited text (strict decode).
    pub fn update_choices(&mut self, text: &str) -> Result<(), ChoiceError> {
        self.update_choices_with(text, DecodeOptions::default())
            .map(|_| ())
    }

    /// Replace the choices from edited text, returning the lines skipped in
    /// lenient mode.
    pub fn update_choices_with(
        &mut self,
        text: &str,
        options: DecodeOptions,
    ) -> Result<Vec<ChoiceError>, ChoiceError> {
        let decoded = codec::decode_with(text, options)?;
        self.settings.choices = decoded.tree;
        Ok(decoded.skipped)
    }

    /// Stored string → nested form value. Absent values load as empty.
    pub fn load_value(&self, stored: Option<&str>) -> Value {
        let path = stored.map(SelectionPath::parse).unwrap_or_default();
        form::to_nested(&path)
    }

    /// Nested form value → stored string.
    pub fn update_value(&self, posted: &Value) -> String {
        form::from_nested(posted).to_storage_string()
    }

    pub fn resolve(&self, path: &SelectionPath) -> Resolution {
        resolve(&self.settings.choices, path)
    }

    /// Selectors for the edit form.
    pub fn render(&self, path: &SelectionPath) -> Vec<SelectInput> {
        render::select_inputs(&self.settings.name, &self.settings.choices, path)
    }

    /// Check a submitted selection against the current choices.
    pub fn validate_value(&self, path: &SelectionPath) -> Result<(), FieldError> {
        let field = || self.settings.name.clone();

        if path.is_empty() {
            return if self.settings.required {
                Err(FieldError::Required { field: field() })
            } else {
                Ok(())
            };
        }

        let resolution = self.resolve(path);
        if let Some(broken) = resolution.broken {
            return Err(FieldError::BrokenPath {
                field: field(),
                depth: broken.depth,
                key: broken.key,
            });
        }

        if !self.settings.allow_parent && !resolution.leaf_selected {
            return Err(FieldError::ParentNotAllowed {
                field: field(),
                path: path.to_storage_string(),
            });
        }
        Ok(())
    }

    /// Value for templates. Only the valid prefix of a broken path is kept.
    pub fn format_value(&self, path: &SelectionPath) -> FormattedValue {
        let valid = self.resolve(path).selected_path();
        match self.settings.return_format {
            ReturnFormat::Array => FormattedValue::Array(valid.segments().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(allow_parent: bool, required: bool) -> TreeSelectField {
        let mut field = TreeSelectField::new(FieldSettings {
            name: "location".into(),
            label: "Location".into(),
            allow_parent,
            required,
            ..Default::default()
        });
        field
            .update_choices("region : Region\nregion / north : North\nonline : Online\n")
            .unwrap();
        field
    }

    #[test]
    fn settings_text_round_trips() {
        let f = field(false, false);
        assert_eq!(
            f.settings_text().unwrap(),
            "region : Region\nregion / north : North\nonline : Online\n"
        );
    }

    #[test]
    fn update_choices_rejects_bad_text() {
        let mut f = field(false, false);
        let before = f.choices().clone();
        assert!(f.update_choices("no separator").is_err());
        assert_eq!(f.choices(), &before);
    }

    #[test]
    fn form_keys_cannot_become_choices() {
        let mut f = field(false, false);
        for text in ["value : V\nvalue / x : X\n", "a[0] : A\n"] {
            assert!(matches!(
                f.update_choices(text),
                Err(ChoiceError::MalformedLine {
                    reason: "reserved key",
                    ..
                })
            ));
        }
        assert_eq!(f.choices().len(), 3);
    }

    #[test]
    fn lenient_update_reports_skipped() {
        let mut f = field(false, false);
        let skipped = f
            .update_choices_with("a : A\noops\n", DecodeOptions::lenient())
            .unwrap();
        assert_eq!(skipped.len(), 1);
        assert_eq!(f.choices().len(), 1);
    }

    #[test]
    fn load_and_update_value() {
        let f = field(false, false);
        let nested = f.load_value(Some("region/north"));
        assert_eq!(
            nested,
            json!({"0": {"value": "region", "region": {"value": "north"}}})
        );
        assert_eq!(f.update_value(&nested), "region/north");
        assert_eq!(f.load_value(None), json!({}));
        assert_eq!(f.update_value(&json!(null)), "");
    }

    #[test]
    fn leaf_required_without_allow_parent() {
        let f = field(false, false);
        assert!(f.validate_value(&"region/north".into()).is_ok());
        assert!(f.validate_value(&"online".into()).is_ok());
        assert_eq!(
            f.validate_value(&"region".into()).unwrap_err(),
            FieldError::ParentNotAllowed {
                field: "location".into(),
                path: "region".into()
            }
        );
    }

    #[test]
    fn parent_accepted_with_allow_parent() {
        let f = field(true, false);
        assert!(f.validate_value(&"region".into()).is_ok());
    }

    #[test]
    fn required_and_broken() {
        let f = field(true, true);
        assert!(matches!(
            f.validate_value(&SelectionPath::new()),
            Err(FieldError::Required { .. })
        ));
        assert!(field(true, false).validate_value(&SelectionPath::new()).is_ok());
        assert!(matches!(
            f.validate_value(&"region/east".into()),
            Err(FieldError::BrokenPath { depth: 1, .. })
        ));
    }

    #[test]
    fn format_value_keeps_valid_prefix() {
        let f = field(false, false);
        assert_eq!(
            f.format_value(&"region/gone".into()),
            FormattedValue::Array(vec!["region".into()])
        );
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: FieldSettings = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(!settings.allow_parent);
        assert_eq!(settings.return_format, ReturnFormat::Array);
        assert!(settings.choices.is_empty());
    }
}
