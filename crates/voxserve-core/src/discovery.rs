//! Filesystem discovery of available voices.
//!
//! Discovery performs a fresh scan of the voices directory per call and is
//! deliberately lock-free beyond point-in-time reads of loaded state:
//! concurrent downloads or deletions just make the listing eventually
//! consistent.

use crate::alias::AliasStore;
use crate::registry::VoiceRegistry;
use crate::voice::VoiceConfig;
use crate::voice_name::{self, VoiceName};
use serde::Serialize;
use std::path::Path;

/// Read-only projection of one discovered voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredVoice {
    /// Canonical model name derived from the artifact filename
    pub model: String,
    /// Language code, from the filename grammar unless the metadata
    /// document overrides it
    pub language: String,
    /// Whether the registry currently holds a loaded handle
    pub loaded: bool,
    /// Whether a builtin alias points at this model
    pub builtin: bool,
    /// An alias pointing at this model, if any (custom overrides applied)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Scan `voices_dir` and report every model with an on-disk artifact.
///
/// Metadata extraction is best-effort: language comes from the filename
/// grammar, overridden by an adjacent metadata document when present and
/// parseable. A missing or malformed document never fails the scan.
#[must_use]
pub fn scan(voices_dir: &Path, aliases: &AliasStore, registry: &VoiceRegistry) -> Vec<DiscoveredVoice> {
    let entries = match std::fs::read_dir(voices_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %voices_dir.display(), error = %e, "could not scan voices directory");
            return Vec::new();
        }
    };

    let merged = aliases.merged();
    let mut voices = Vec::new();

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(model) = file_name.strip_suffix(".onnx") else {
            continue;
        };
        if !entry.path().is_file() {
            continue;
        }

        let mut language = VoiceName::parse(model)
            .map(|name| name.locale())
            .unwrap_or_else(|_| "unknown".to_string());
        if let Some(code) = read_language_override(voices_dir, model) {
            language = code;
        }

        let alias = merged
            .iter()
            .find(|(_, m)| m.as_str() == model)
            .map(|(a, _)| a.clone());

        voices.push(DiscoveredVoice {
            model: model.to_string(),
            language,
            loaded: registry.is_loaded(model),
            builtin: aliases.is_builtin_model(model),
            alias,
        });
    }

    sort_for_listing(&mut voices);
    voices
}

/// Deterministic listing order: aliased voices first (by alias name), then
/// unaliased voices by model name.
pub fn sort_for_listing(voices: &mut [DiscoveredVoice]) {
    voices.sort_by(|a, b| match (&a.alias, &b.alias) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.model.cmp(&b.model),
    });
}

fn read_language_override(voices_dir: &Path, model: &str) -> Option<String> {
    let path = voice_name::config_path(voices_dir, model);
    let raw = std::fs::read_to_string(path).ok()?;
    match VoiceConfig::parse(&raw) {
        Ok(config) => config.language,
        Err(e) => {
            tracing::debug!(model, error = %e, "ignoring malformed metadata during scan");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn touch_model(dir: &Path, model: &str) {
        fs::write(voice_name::model_path(dir, model), b"onnx").unwrap();
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = TempDir::new().unwrap();
        let aliases = AliasStore::new(dir.path());
        let registry = VoiceRegistry::new(dir.path());
        assert!(scan(dir.path(), &aliases, &registry).is_empty());
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let aliases = AliasStore::new("/nonexistent/voices");
        let registry = VoiceRegistry::new("/nonexistent/voices");
        assert!(scan(Path::new("/nonexistent/voices"), &aliases, &registry).is_empty());
    }

    #[test]
    fn test_scan_reports_artifacts_only() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-lessac-high");
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::write(dir.path().join("aliases.json"), b"{}").unwrap();

        let aliases = AliasStore::new(dir.path());
        let registry = VoiceRegistry::new(dir.path());
        let voices = scan(dir.path(), &aliases, &registry);
        assert_eq!(voices.len(), 1);

        let voice = &voices[0];
        assert_eq!(voice.model, "en_US-lessac-high");
        assert_eq!(voice.language, "en_US");
        assert!(!voice.loaded);
        assert!(voice.builtin);
        assert_eq!(voice.alias.as_deref(), Some("emma"));
    }

    #[test]
    fn test_metadata_overrides_filename_language() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-amy-medium");
        fs::write(
            voice_name::config_path(dir.path(), "en_US-amy-medium"),
            r#"{"language": {"code": "en_GB"}}"#,
        )
        .unwrap();

        let aliases = AliasStore::new(dir.path());
        let registry = VoiceRegistry::new(dir.path());
        let voices = scan(dir.path(), &aliases, &registry);
        assert_eq!(voices[0].language, "en_GB");
    }

    #[test]
    fn test_malformed_metadata_never_fails_scan() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-amy-medium");
        fs::write(
            voice_name::config_path(dir.path(), "en_US-amy-medium"),
            b"{broken",
        )
        .unwrap();

        let aliases = AliasStore::new(dir.path());
        let registry = VoiceRegistry::new(dir.path());
        let voices = scan(dir.path(), &aliases, &registry);
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].language, "en_US");
    }

    #[tokio::test]
    async fn test_scan_reflects_loaded_state() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-amy-medium");
        let aliases = AliasStore::new(dir.path());
        let registry = Arc::new(VoiceRegistry::new(dir.path()));

        registry.get_or_load("en_US-amy-medium").await.unwrap();
        let voices = scan(dir.path(), &aliases, &registry);
        assert!(voices[0].loaded);
    }

    #[test]
    fn test_listing_order() {
        let mk = |model: &str, alias: Option<&str>| DiscoveredVoice {
            model: model.to_string(),
            language: "en_US".to_string(),
            loaded: false,
            builtin: false,
            alias: alias.map(str::to_string),
        };

        let mut voices = vec![
            mk("en_US-zz-low", None),
            mk("en_US-mm-low", Some("mike")),
            mk("en_US-aa-low", None),
            mk("en_US-bb-low", Some("bella")),
        ];
        sort_for_listing(&mut voices);

        let order: Vec<&str> = voices.iter().map(|v| v.model.as_str()).collect();
        assert_eq!(
            order,
            vec!["en_US-bb-low", "en_US-mm-low", "en_US-aa-low", "en_US-zz-low"]
        );
    }
}
