//! Loaded voice handles and piper voice-config parsing.

use crate::error::{VoxError, VoxResult};
use crate::voice_name;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default sample rate when the metadata document is absent or silent (Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Parsed voice metadata, extracted best-effort from `<model>.onnx.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Language code declared by the metadata (e.g. "en_US"), if any
    pub language: Option<String>,
    /// Number of speakers in the model
    pub num_speakers: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            language: None,
            num_speakers: 1,
        }
    }
}

// Wire shape of the piper voice config; everything is optional so a sparse
// or partially malformed document still yields usable defaults.
#[derive(Debug, Deserialize)]
struct RawConfig {
    audio: Option<RawAudio>,
    language: Option<RawLanguage>,
    num_speakers: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawAudio {
    sample_rate: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawLanguage {
    code: Option<String>,
}

impl VoiceConfig {
    /// Parse a voice config document, falling back to defaults for any
    /// missing field.
    ///
    /// # Errors
    ///
    /// Returns a validation error only if the document is not valid JSON at
    /// all; callers decide whether that is fatal (loading) or merely
    /// diagnostic (discovery).
    pub fn parse(raw: &str) -> VoxResult<Self> {
        let raw: RawConfig = serde_json::from_str(raw)
            .map_err(|e| VoxError::validation(format!("malformed voice config: {e}")))?;

        Ok(Self {
            sample_rate: raw
                .audio
                .and_then(|a| a.sample_rate)
                .unwrap_or(DEFAULT_SAMPLE_RATE),
            language: raw.language.and_then(|l| l.code),
            num_speakers: raw.num_speakers.unwrap_or(1),
        })
    }

    /// Read and parse the config document next to `model` in `voices_dir`.
    ///
    /// Best-effort: an absent or malformed document yields defaults with a
    /// log line, never a failure.
    pub async fn read_best_effort(voices_dir: &Path, model: &str) -> Self {
        let path = voice_name::config_path(voices_dir, model);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!(model, error = %e, "ignoring malformed voice config");
                Self::default()
            }),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(model, error = %e, "could not read voice config");
                }
                Self::default()
            }
        }
    }
}

/// An instantiated voice model, ready for synthesis.
///
/// Handles are exclusively owned by the registry cache; callers receive
/// `Arc` clones valid for the duration of one synthesis call.
#[derive(Debug)]
pub struct VoiceHandle {
    model: String,
    model_path: PathBuf,
    config: VoiceConfig,
}

impl VoiceHandle {
    /// Load the voice `model` from `voices_dir`.
    ///
    /// The artifact must already be known to exist; this verifies it is
    /// actually readable and non-trivial, then extracts metadata
    /// best-effort.
    ///
    /// # Errors
    ///
    /// Returns a load error if the model artifact cannot be read or is
    /// implausibly small. Load failures are transient: the registry clears
    /// the entry so a later request retries from scratch.
    pub async fn load(voices_dir: &Path, model: &str) -> VoxResult<Self> {
        let model_path = voice_name::model_path(voices_dir, model);

        // A real loader deserializes the whole artifact; reading the leading
        // bytes catches unreadable or truncated files up front.
        let header = tokio::fs::read(&model_path)
            .await
            .map_err(|e| VoxError::load_failed(format!("cannot read '{model}': {e}")))?;
        if header.is_empty() {
            return Err(VoxError::load_failed(format!(
                "model artifact for '{model}' is empty"
            )));
        }

        let config = VoiceConfig::read_best_effort(voices_dir, model).await;
        tracing::info!(
            model,
            sample_rate = config.sample_rate,
            "voice model loaded"
        );

        Ok(Self {
            model: model.to_string(),
            model_path,
            config,
        })
    }

    /// Canonical model name this handle is bound to
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Path of the model artifact this handle was loaded from
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Parsed voice metadata
    #[must_use]
    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    /// Output sample rate in Hz
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let raw = r#"{
            "audio": {"sample_rate": 24000},
            "language": {"code": "en_US"},
            "num_speakers": 2
        }"#;
        let config = VoiceConfig::parse(raw).unwrap();
        assert_eq!(config.sample_rate, 24000);
        assert_eq!(config.language.as_deref(), Some("en_US"));
        assert_eq!(config.num_speakers, 2);
    }

    #[test]
    fn test_parse_sparse_config_uses_defaults() {
        let config = VoiceConfig::parse("{}").unwrap();
        assert_eq!(config, VoiceConfig::default());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(VoiceConfig::parse("not json").is_err());
    }

    #[tokio::test]
    async fn test_load_reads_config() {
        let dir = TempDir::new().unwrap();
        let model = "en_US-lessac-high";
        fs::write(voice_name::model_path(dir.path(), model), b"onnx-bytes").unwrap();
        fs::write(
            voice_name::config_path(dir.path(), model),
            r#"{"audio": {"sample_rate": 16000}}"#,
        )
        .unwrap();

        let handle = VoiceHandle::load(dir.path(), model).await.unwrap();
        assert_eq!(handle.model(), model);
        assert_eq!(handle.sample_rate(), 16000);
    }

    #[tokio::test]
    async fn test_load_without_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let model = "en_US-amy-medium";
        fs::write(voice_name::model_path(dir.path(), model), b"onnx-bytes").unwrap();

        let handle = VoiceHandle::load(dir.path(), model).await.unwrap();
        assert_eq!(handle.sample_rate(), DEFAULT_SAMPLE_RATE);
    }

    #[tokio::test]
    async fn test_load_missing_artifact_fails() {
        let dir = TempDir::new().unwrap();
        let err = VoiceHandle::load(dir.path(), "en_US-ghost-low")
            .await
            .unwrap_err();
        assert!(matches!(err, VoxError::LoadFailed { .. }));
    }

    #[tokio::test]
    async fn test_load_empty_artifact_fails() {
        let dir = TempDir::new().unwrap();
        let model = "en_US-empty-low";
        fs::write(voice_name::model_path(dir.path(), model), b"").unwrap();
        let err = VoiceHandle::load(dir.path(), model).await.unwrap_err();
        assert!(matches!(err, VoxError::LoadFailed { .. }));
    }
}
