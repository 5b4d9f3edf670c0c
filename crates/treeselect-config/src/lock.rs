//! Lock file tracking every choice path records may have stored.
//!
//! ```toml
//! generated_at = "2025-01-01T00:00:00+00:00"
//!
//! [[entries]]
//! field = "location"
//! path = "region/north"
//!
//! [[entries]]
//! field = "location"
//! path = "region/west"
//! deprecated = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FieldsConfig;

/// A choice path within one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChoiceRef {
    pub field: String,
    pub path: String,
}

impl std::fmt::Display for ChoiceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub field: String,
    pub path: String,
    /// Removed from config while `on_remove = "warn"`; stored records may
    /// still reference it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl LockEntry {
    fn choice_ref(&self) -> ChoiceRef {
        ChoiceRef {
            field: self.field.clone(),
            path: self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub entries: Vec<LockEntry>,
}

/// Differences between a lock and the current config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockDiff {
    /// In config, never locked.
    pub added: Vec<ChoiceRef>,
    /// Active in the lock, gone from config.
    pub removed: Vec<ChoiceRef>,
    /// Deprecated in the lock, back in config.
    pub restored: Vec<ChoiceRef>,
}

impl LockDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.restored.is_empty()
    }
}

impl LockFile {
    /// Fresh lock covering every path in `config`.
    pub fn from_config(config: &FieldsConfig) -> Self {
        let entries = config
            .choice_paths()
            .map(|(field, path)| LockEntry {
                field: field.to_string(),
                path: path.to_storage_string(),
                deprecated: false,
            })
            .collect();
        Self {
            generated_at: timestamp(),
            entries,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LockFileError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LockFileError> {
        toml::from_str(content).map_err(|e| LockFileError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, LockFileError> {
        let body = toml::to_string_pretty(self).map_err(|e| LockFileError::Serialize(e.to_string()))?;
        Ok(format!(
            "# Generated by treeselect-config. Do not edit by hand.\n# Delete to reset (stored selections may break).\n\n{}",
            body
        ))
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockFileError> {
        std::fs::write(path.as_ref(), self.to_toml_string()?)?;
        Ok(())
    }

    pub fn get(&self, field: &str, path: &str) -> Option<&LockEntry> {
        self.entries
            .iter()
            .find(|e| e.field == field && e.path == path)
    }

    pub fn active_entries(&self) -> impl Iterator<Item = &LockEntry> {
        self.entries.iter().filter(|e| !e.deprecated)
    }

    pub fn deprecated_entries(&self) -> impl Iterator<Item = &LockEntry> {
        self.entries.iter().filter(|e| e.deprecated)
    }

    /// Compare against the current config.
    pub fn diff(&self, config: &FieldsConfig) -> LockDiff {
        let current: HashSet<ChoiceRef> = config
            .choice_paths()
            .map(|(field, path)| ChoiceRef {
                field: field.to_string(),
                path: path.to_storage_string(),
            })
            .collect();

        let mut diff = LockDiff::default();
        let mut locked = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            let r = entry.choice_ref();
            match (current.contains(&r), entry.deprecated) {
                (false, false) => diff.removed.push(r.clone()),
                (true, true) => diff.restored.push(r.clone()),
                _ => {}
            }
            locked.insert(r);
        }

        // Keep config order for additions
        for (field, path) in config.choice_paths() {
            let r = ChoiceRef {
                field: field.to_string(),
                path: path.to_storage_string(),
            };
            if !locked.contains(&r) {
                diff.added.push(r);
            }
        }
        diff
    }

    /// Append an entry (no-op if already present).
    pub fn add_entry(&mut self, choice: &ChoiceRef) {
        if self.get(&choice.field, &choice.path).is_none() {
            self.entries.push(LockEntry {
                field: choice.field.clone(),
                path: choice.path.clone(),
                deprecated: false,
            });
        }
    }

    pub fn mark_deprecated(&mut self, choice: &ChoiceRef) {
        self.set_deprecated(choice, true);
    }

    pub fn mark_active(&mut self, choice: &ChoiceRef) {
        self.set_deprecated(choice, false);
    }

    fn set_deprecated(&mut self, choice: &ChoiceRef, deprecated: bool) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.field == choice.field && e.path == choice.path)
        {
            entry.deprecated = deprecated;
        }
    }

    /// Refresh the timestamp before writing an updated lock.
    pub fn touch(&mut self) {
        self.generated_at = timestamp();
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Error)]
pub enum LockFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(choices: &str) -> FieldsConfig {
        let toml = format!(
            "[[fields]]\nname = \"location\"\nchoices = \"\"\"\n{}\"\"\"\n",
            choices
        );
        FieldsConfig::from_str(&toml).unwrap()
    }

    fn r(path: &str) -> ChoiceRef {
        ChoiceRef {
            field: "location".into(),
            path: path.into(),
        }
    }

    #[test]
    fn from_config_lists_all_paths() {
        let lock = LockFile::from_config(&config("a : A\na / b : B\n"));
        assert_eq!(lock.entries.len(), 2);
        assert!(lock.get("location", "a/b").is_some());
        assert!(!lock.generated_at.is_empty());
    }

    #[test]
    fn diff_detects_added_and_removed() {
        let lock = LockFile::from_config(&config("a : A\na / b : B\n"));
        let diff = lock.diff(&config("a : A\na / c : C\n"));
        assert_eq!(diff.added, [r("a/c")]);
        assert_eq!(diff.removed, [r("a/b")]);
        assert!(diff.restored.is_empty());
    }

    #[test]
    fn deprecated_entries_are_not_removed_twice() {
        let mut lock = LockFile::from_config(&config("a : A\nb : B\n"));
        lock.mark_deprecated(&r("b"));

        let diff = lock.diff(&config("a : A\n"));
        assert!(diff.is_empty());

        let diff = lock.diff(&config("a : A\nb : B\n"));
        assert_eq!(diff.restored, [r("b")]);
    }

    #[test]
    fn toml_round_trip() {
        let mut lock = LockFile::from_config(&config("a : A\nb : B\n"));
        lock.mark_deprecated(&r("b"));
        let text = lock.to_toml_string().unwrap();
        assert!(text.contains("deprecated = true"));

        let back = LockFile::from_str(&text).unwrap();
        assert_eq!(back, lock);
    }

    #[test]
    fn add_entry_is_idempotent() {
        let mut lock = LockFile::default();
        lock.add_entry(&r("x"));
        lock.add_entry(&r("x"));
        assert_eq!(lock.entries.len(), 1);
    }
}
