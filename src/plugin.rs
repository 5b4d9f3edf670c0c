//! Explicit field-type registration.
//!
//! The host collects field types in a [`FieldTypeRegistry`]; plugins add
//! theirs in [`FieldPlugin::build`]. Nothing registers itself on load.
//!
//! # Example
//!
//! ```
//! use treeselect::plugin::{FieldTypeRegistry, PluginSettings, TreeSelectPlugin};
//!
//! let mut registry = FieldTypeRegistry::new();
//! registry
//!     .add_plugin(TreeSelectPlugin::new(PluginSettings::new(
//!         "https://example.test/plugins/treeselect/",
//!         "0.1.0",
//!     )))
//!     .unwrap();
//!
//! let field_type = registry.get("treeselect").unwrap();
//! assert_eq!(field_type.label, "Tree Select");
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::field::{FieldSettings, TreeSelectField};

/// Name the tree-select field type registers under.
pub const FIELD_TYPE_NAME: &str = "treeselect";

/// Host-side script every field input script depends on.
const INPUT_DEPENDENCY: &str = "acf-input";

/// Where the plugin is installed and which version it is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Public base URL of the plugin directory, with trailing slash.
    pub url: String,
    pub version: String,
    /// Filesystem location of the plugin directory.
    #[serde(default)]
    pub path: PathBuf,
}

impl PluginSettings {
    pub fn new(url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: version.into(),
            path: PathBuf::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Absolute URL of a file below the plugin directory.
    pub fn asset_url(&self, relative: &str) -> String {
        if self.url.is_empty() || self.url.ends_with('/') {
            format!("{}{relative}", self.url)
        } else {
            format!("{}/{relative}", self.url)
        }
    }

    /// Location of a file below the plugin directory on disk.
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Style,
}

/// A script or stylesheet the edit screen must load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub handle: String,
    pub kind: AssetKind,
    pub url: String,
    /// Same file on disk, for hosts that inline or fingerprint assets.
    pub file: PathBuf,
    pub dependencies: Vec<String>,
    pub version: String,
}

/// A registered field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub name: String,
    pub label: String,
    pub category: String,
    pub defaults: FieldSettings,
    pub assets: Vec<Asset>,
}

impl FieldType {
    /// A field of this type, starting from the type defaults.
    pub fn create_field(
        &self,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> TreeSelectField {
        TreeSelectField::new(FieldSettings {
            name: name.into(),
            label: label.into(),
            ..self.defaults.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("field type '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Something that contributes field types to a registry.
pub trait FieldPlugin {
    fn build(&self, registry: &mut FieldTypeRegistry) -> Result<(), RegistryError>;
}

/// Field types known to the host, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FieldTypeRegistry {
    types: Vec<FieldType>,
    by_name: HashMap<String, usize>,
}

impl FieldTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_plugin(&mut self, plugin: impl FieldPlugin) -> Result<&mut Self, RegistryError> {
        plugin.build(self)?;
        Ok(self)
    }

    pub fn register(&mut self, field_type: FieldType) -> Result<(), RegistryError> {
        if self.by_name.contains_key(&field_type.name) {
            return Err(RegistryError::AlreadyRegistered(field_type.name));
        }
        info!(name = %field_type.name, assets = field_type.assets.len(), "registered field type");
        self.by_name.insert(field_type.name.clone(), self.types.len());
        self.types.push(field_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldType> {
        self.types.iter()
    }
}

/// Registers the `treeselect` field type.
///
/// ```ignore
/// registry.add_plugin(
///     TreeSelectPlugin::new(settings).allow_parent_by_default(true)
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct TreeSelectPlugin {
    settings: PluginSettings,
    defaults: FieldSettings,
}

impl TreeSelectPlugin {
    pub fn new(settings: PluginSettings) -> Self {
        Self {
            settings,
            defaults: FieldSettings::default(),
        }
    }

    /// Default for `allow_parent` on new fields.
    ///
    /// Default: `false`
    pub fn allow_parent_by_default(mut self, allow: bool) -> Self {
        self.defaults.allow_parent = allow;
        self
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    /// Scripts and styles for the edit screen, versioned with the plugin.
    pub fn assets(&self) -> Vec<Asset> {
        let asset = |handle: &str, kind, file: &str| Asset {
            handle: handle.to_string(),
            kind,
            url: self.settings.asset_url(file),
            file: self.settings.asset_path(file),
            dependencies: vec![INPUT_DEPENDENCY.to_string()],
            version: self.settings.version.clone(),
        };
        vec![
            asset("acf-input-treeselect", AssetKind::Script, "assets/js/input.js"),
            asset("acf-treeselect", AssetKind::Style, "assets/css/acf-treeselect.css"),
        ]
    }
}

impl FieldPlugin for TreeSelectPlugin {
    fn build(&self, registry: &mut FieldTypeRegistry) -> Result<(), RegistryError> {
        registry.register(FieldType {
            name: FIELD_TYPE_NAME.to_string(),
            label: "Tree Select".to_string(),
            category: "basic".to_string(),
            defaults: self.defaults.clone(),
            assets: self.assets(),
        })
    }
}
