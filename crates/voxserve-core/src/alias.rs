//! Alias resolution for voice model names.
//!
//! Two namespaces merge into one lookup table: a builtin set fixed at process
//! start and a custom set that is operator-managed and persisted as a JSON
//! document inside the voices directory. Custom entries shadow builtin
//! entries of the same name on lookup; builtin entries are never deletable.

use crate::error::{VoxError, VoxResult};
use crate::voice_name;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Filename of the persisted custom alias table inside the voices directory
pub const ALIASES_FILE: &str = "aliases.json";

/// Builtin aliases for common piper voices, fixed at process start
static BUILTIN_ALIASES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("emma", "en_US-lessac-high"),
        ("amy", "en_US-amy-medium"),
        ("ryan", "en_US-ryan-high"),
        ("joe", "en_US-joe-medium"),
        ("alan", "en_GB-alan-medium"),
        ("alba", "en_GB-alba-medium"),
        ("thorsten", "de_DE-thorsten-medium"),
    ])
});

/// Mapping from short alias names to canonical model names
#[derive(Debug)]
pub struct AliasStore {
    voices_dir: PathBuf,
    // Guards both the in-memory table and the durable write, so concurrent
    // mutations cannot interleave into a corrupt persisted document.
    custom: Mutex<BTreeMap<String, String>>,
}

impl AliasStore {
    /// Create an alias store over `voices_dir`, loading any persisted custom
    /// table. An absent document is an empty table; a corrupt document is
    /// logged and treated as empty.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(voices_dir: P) -> Self {
        let voices_dir = voices_dir.into();
        let custom = Mutex::new(read_custom_table(&voices_dir.join(ALIASES_FILE)));
        Self { voices_dir, custom }
    }

    /// Path of the persisted custom alias document
    #[must_use]
    pub fn aliases_path(&self) -> PathBuf {
        self.voices_dir.join(ALIASES_FILE)
    }

    /// Resolve `name` to a canonical model name.
    ///
    /// Custom entries win over builtin entries; a name absent from both
    /// tables is returned unchanged (it is assumed to already be canonical).
    #[must_use]
    pub fn resolve(&self, name: &str) -> String {
        if let Some(model) = self.custom.lock().get(name) {
            return model.clone();
        }
        if let Some(model) = BUILTIN_ALIASES.get(name) {
            return (*model).to_string();
        }
        name.to_string()
    }

    /// Check whether `alias` is a builtin name
    #[must_use]
    pub fn is_builtin(&self, alias: &str) -> bool {
        BUILTIN_ALIASES.contains_key(alias)
    }

    /// Check whether any builtin alias points at `model`
    #[must_use]
    pub fn is_builtin_model(&self, model: &str) -> bool {
        BUILTIN_ALIASES.values().any(|m| *m == model)
    }

    /// The immutable builtin table
    #[must_use]
    pub fn builtin(&self) -> BTreeMap<String, String> {
        BUILTIN_ALIASES
            .iter()
            .map(|(a, m)| ((*a).to_string(), (*m).to_string()))
            .collect()
    }

    /// A snapshot of the custom table
    #[must_use]
    pub fn custom(&self) -> BTreeMap<String, String> {
        self.custom.lock().clone()
    }

    /// The merged lookup table: builtin entries with custom overrides applied
    #[must_use]
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = self.builtin();
        for (alias, model) in self.custom.lock().iter() {
            merged.insert(alias.clone(), model.clone());
        }
        merged
    }

    /// Create or overwrite a custom alias.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `alias` is empty or `model`'s artifact
    /// is not present on disk, and a persistence error if the durable write
    /// fails. On a persistence error the in-memory table already reflects
    /// the change; the caller must be told so it can retry or reload.
    pub fn set_alias(&self, alias: &str, model: &str) -> VoxResult<()> {
        if alias.is_empty() {
            return Err(VoxError::validation("alias must not be empty"));
        }
        if !voice_name::model_exists(&self.voices_dir, model) {
            return Err(VoxError::validation(format!(
                "model '{model}' has no artifact in the voices directory"
            )));
        }

        let mut custom = self.custom.lock();
        custom.insert(alias.to_string(), model.to_string());
        tracing::info!(alias, model, "custom alias set");
        self.persist(&custom)
    }

    /// Delete a custom alias.
    ///
    /// # Errors
    ///
    /// Returns an immutable error for builtin names (regardless of whether a
    /// custom override exists), a not-found error if the alias is absent
    /// from the custom table, and a persistence error if the durable write
    /// fails.
    pub fn delete_alias(&self, alias: &str) -> VoxResult<()> {
        if self.is_builtin(alias) {
            return Err(VoxError::immutable(alias));
        }

        let mut custom = self.custom.lock();
        if custom.remove(alias).is_none() {
            return Err(VoxError::not_found(alias));
        }
        tracing::info!(alias, "custom alias deleted");
        self.persist(&custom)
    }

    /// Remove every custom alias pointing at `model`, persisting once.
    ///
    /// Used by voice deletion; returns the removed alias names for
    /// reporting.
    pub fn remove_aliases_for(&self, model: &str) -> VoxResult<Vec<String>> {
        let mut custom = self.custom.lock();
        let removed: Vec<String> = custom
            .iter()
            .filter(|(_, m)| m.as_str() == model)
            .map(|(a, _)| a.clone())
            .collect();
        if removed.is_empty() {
            return Ok(removed);
        }

        for alias in &removed {
            custom.remove(alias);
        }
        tracing::info!(model, aliases = ?removed, "removed custom aliases for deleted model");
        self.persist(&custom)?;
        Ok(removed)
    }

    /// Re-read the custom table from durable storage, fully replacing the
    /// in-memory table. Last writer wins against concurrent unsaved
    /// mutation; this is an explicit operator action. Returns the number of
    /// custom aliases after the reload.
    pub fn reload(&self) -> usize {
        let table = read_custom_table(&self.aliases_path());
        let count = table.len();
        *self.custom.lock() = table;
        tracing::info!(custom_aliases = count, "custom alias table reloaded");
        count
    }

    // Caller holds the table lock, so writes cannot interleave.
    fn persist(&self, table: &BTreeMap<String, String>) -> VoxResult<()> {
        let json = serde_json::to_string_pretty(table)
            .map_err(|e| VoxError::persistence(e.to_string()))?;
        std::fs::write(self.aliases_path(), json).map_err(|e| {
            VoxError::persistence(format!(
                "failed to write {}: {e}",
                self.aliases_path().display()
            ))
        })
    }
}

fn read_custom_table(path: &Path) -> BTreeMap<String, String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read alias table, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt alias table, starting empty");
            BTreeMap::new()
        }
    }
}
