//! Voice lifecycle orchestration: downloading models into the voices
//! directory and deleting them with the required cache and alias cascade.

use crate::alias::AliasStore;
use crate::download::Downloader;
use crate::error::{VoxError, VoxResult};
use crate::registry::VoiceRegistry;
use crate::voice_name::{self, VoiceName};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Remote voice repository holding piper model artifacts
pub const VOICE_REPO_BASE: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/main";

/// Hard bound for fetching a model artifact
pub const MODEL_FETCH_TIMEOUT: Duration = Duration::from_secs(600);

/// Hard bound for fetching the (much smaller) metadata document
pub const CONFIG_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Manages the on-disk voice collection: downloads and deletion
pub struct VoiceLibrary {
    voices_dir: PathBuf,
    aliases: Arc<AliasStore>,
    registry: Arc<VoiceRegistry>,
    downloader: Arc<dyn Downloader>,
    repo_base: String,
}

impl VoiceLibrary {
    /// Compose a library over the shared stores and a downloader
    #[must_use]
    pub fn new<P: Into<PathBuf>>(
        voices_dir: P,
        aliases: Arc<AliasStore>,
        registry: Arc<VoiceRegistry>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            voices_dir: voices_dir.into(),
            aliases,
            registry,
            downloader,
            repo_base: VOICE_REPO_BASE.to_string(),
        }
    }

    /// Override the remote repository base URL (tests point this at a mock
    /// server)
    #[must_use]
    pub fn with_repo_base<S: Into<String>>(mut self, base: S) -> Self {
        self.repo_base = base.into();
        self
    }

    /// Ensure both artifacts for `model` are present in the voices
    /// directory, downloading them if absent. Returns `true` when the model
    /// already existed.
    ///
    /// No registry or alias locks are held while network I/O is in flight.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `model` does not match the name
    /// grammar, and a download error if either artifact cannot be fetched.
    /// On a partial download (model fetched by this call, metadata failed)
    /// the freshly fetched model artifact is removed again so discovery
    /// never sees a non-functional entry, and a later call re-attempts both
    /// fetches. A model artifact that was already on disk before the call is
    /// never removed.
    pub async fn ensure_model(&self, model: &str) -> VoxResult<bool> {
        let name = VoiceName::parse(model)?;

        let model_dest = voice_name::model_path(&self.voices_dir, model);
        let config_dest = voice_name::config_path(&self.voices_dir, model);
        let model_present = model_dest.is_file();
        if model_present && config_dest.is_file() {
            tracing::debug!(model, "model already present");
            return Ok(true);
        }

        let prefix = name.remote_prefix();
        if !model_present {
            let model_url = format!("{}/{}/{}.onnx", self.repo_base, prefix, model);
            self.downloader
                .fetch(&model_url, &model_dest, MODEL_FETCH_TIMEOUT)
                .await?;
        }

        let config_url = format!("{}/{}/{}.onnx.json", self.repo_base, prefix, model);
        if let Err(e) = self
            .downloader
            .fetch(&config_url, &config_dest, CONFIG_FETCH_TIMEOUT)
            .await
        {
            // Drop the model file so the pair stays consistent and the next
            // attempt starts from scratch, but only if this call fetched it:
            // a model that was already on disk keeps working without its
            // metadata document.
            if !model_present {
                if let Err(rm) = tokio::fs::remove_file(&model_dest).await {
                    tracing::warn!(model, error = %rm, "could not remove model after failed metadata fetch");
                }
            }
            return Err(VoxError::download(format!(
                "metadata fetch for '{model}' failed: {e}"
            )));
        }

        tracing::info!(model, "model downloaded");
        Ok(false)
    }

    /// Delete `model`: evict it from the registry, cascade-remove custom
    /// aliases pointing at it, then remove its artifacts. Returns the
    /// removed alias names.
    ///
    /// The cache entry and aliases go first, so a concurrent
    /// resolve-and-load observes a clean not-found rather than an alias
    /// pointing at missing files.
    ///
    /// # Errors
    ///
    /// Returns an immutable error for models referenced by a builtin alias,
    /// a not-found error if no artifact exists, and a persistence error if
    /// the alias cascade could not be persisted (in which case the
    /// artifacts are left in place).
    pub async fn delete_model(&self, model: &str) -> VoxResult<Vec<String>> {
        if self.aliases.is_builtin_model(model) {
            return Err(VoxError::immutable(model));
        }
        let model_dest = voice_name::model_path(&self.voices_dir, model);
        if !model_dest.is_file() {
            return Err(VoxError::not_found(model));
        }

        self.registry.evict(model).await;
        let removed = self.aliases.remove_aliases_for(model)?;

        tokio::fs::remove_file(&model_dest)
            .await
            .map_err(|e| VoxError::persistence(format!("could not delete '{model}': {e}")))?;
        let config_dest = voice_name::config_path(&self.voices_dir, model);
        if let Err(e) = tokio::fs::remove_file(&config_dest).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(model, error = %e, "could not delete metadata document");
            }
        }

        tracing::info!(model, aliases_removed = removed.len(), "model deleted");
        Ok(removed)
    }
}

impl std::fmt::Debug for VoiceLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceLibrary")
            .field("voices_dir", &self.voices_dir)
            .field("repo_base", &self.repo_base)
            .finish()
    }
}
