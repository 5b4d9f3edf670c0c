//! Field definitions for treeselect, loaded from `fields.toml`.
//!
//! This crate provides tools for:
//! - Parsing `fields.toml` into ready-to-use [`TreeSelectField`]s
//! - Managing `fields.lock.toml` so stored selections never silently break
//!
//! # Usage
//!
//! ```ignore
//! let config = treeselect_config::load("fields.toml")?;
//! let field = config.field("location").unwrap();
//! ```
//!
//! # Lock File Mechanism
//!
//! Records store selections as choice paths. Removing a choice from
//! `fields.toml` would leave those records pointing at nothing, so:
//!
//! - First load: writes `fields.lock.toml` with every `(field, path)` pair
//! - Later loads: compare against the lock
//! - Path removed: **error** (default) or **warning** with `on_remove = "warn"`,
//!   which keeps the path in the lock marked `deprecated`
//! - Path added: appended to the lock
//!
//! To intentionally drop choices, delete the lock file and load again.
//!
//! [`TreeSelectField`]: treeselect::TreeSelectField

mod config;
mod lock;

pub use config::{ConfigError, FieldsConfig, OnRemove};
pub use lock::{ChoiceRef, LockDiff, LockEntry, LockFile, LockFileError};

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

/// Load `fields.toml`, checking it against the lock file next to it.
///
/// The lock path is derived from the config path (`fields.toml` →
/// `fields.lock.toml`).
///
/// # Errors
///
/// Returns an error if:
/// - `fields.toml` cannot be read or parsed, or its choices are malformed
/// - Choice paths were removed since the lock was written and
///   `on_remove = "error"`
/// - The lock file cannot be read or written
pub fn load(config_path: impl AsRef<Path>) -> Result<FieldsConfig, LoadError> {
    let config_path = config_path.as_ref();
    let lock_path = config_path.with_extension("lock.toml");
    load_with_lock(config_path, &lock_path)
}

/// Load with an explicit lock file path.
pub fn load_with_lock(
    config_path: impl AsRef<Path>,
    lock_path: impl AsRef<Path>,
) -> Result<FieldsConfig, LoadError> {
    let config_path = config_path.as_ref();
    let lock_path = lock_path.as_ref();

    // 1. Parse fields.toml
    let config = FieldsConfig::from_file(config_path)?;
    for (field, err) in config.skipped() {
        warn!(field = %field, error = %err, "skipped choice line");
    }

    // 2. Existing lock: diff. No lock: snapshot the config.
    if !lock_path.exists() {
        debug!(lock = %lock_path.display(), "creating lock file");
        LockFile::from_config(&config).write_to_file(lock_path)?;
        return Ok(config);
    }

    let mut lock = LockFile::from_file(lock_path)?;
    let diff = lock.diff(&config);
    if diff.is_empty() {
        return Ok(config);
    }

    // 3. Removed paths per on_remove
    if !diff.removed.is_empty() {
        match config.on_remove {
            OnRemove::Error => {
                return Err(LoadError::LockMismatch(format_lock_error(&diff, config_path)));
            }
            OnRemove::Warn => {
                for choice in &diff.removed {
                    warn!(
                        field = %choice.field,
                        path = %choice.path,
                        "choice removed from config and is now deprecated"
                    );
                    lock.mark_deprecated(choice);
                }
            }
        }
    }

    // 4. Restored and new paths
    for choice in &diff.restored {
        lock.mark_active(choice);
    }
    for choice in &diff.added {
        lock.add_entry(choice);
    }
    debug!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        restored = diff.restored.len(),
        "updating lock file"
    );

    // 5. Write updated lock
    lock.touch();
    lock.write_to_file(lock_path)?;

    Ok(config)
}

fn format_lock_error(diff: &LockDiff, config_path: &Path) -> String {
    let config_name = config_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fields.toml".to_string());

    let mut msg = String::new();
    msg.push_str("treeselect: Lock file mismatch!\n\n");
    msg.push_str(&format!("  Missing in {} (existed in lock):\n", config_name));
    for choice in &diff.removed {
        msg.push_str(&format!("    - {}\n", choice));
    }
    msg.push_str("\n  To fix:\n");
    msg.push_str(&format!("    1. Add the choice(s) back to {}, OR\n", config_name));
    msg.push_str("    2. Set `on_remove = \"warn\"` to deprecate instead, OR\n");
    msg.push_str("    3. Delete the lock file (stored selections may break!)\n");
    msg
}

/// Errors that can occur while loading field definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Lock file error: {0}")]
    Lock(#[from] LockFileError),
    /// Choice paths removed since the lock was written
    #[error("{0}")]
    LockMismatch(String),
}
