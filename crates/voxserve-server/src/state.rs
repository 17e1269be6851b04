//! Shared application state wired once at startup.

use std::path::PathBuf;
use std::sync::Arc;
use voxserve_core::{
    AliasStore, HttpDownloader, SynthesisGateway, ToneEngine, VoiceLibrary, VoiceRegistry,
};

/// Everything the handlers need, constructed once and shared via `Arc`.
pub struct AppState {
    /// Directory holding model artifacts and the alias table
    pub voices_dir: PathBuf,
    /// Model or alias used when a synthesis request names no voice
    pub default_voice: String,
    /// Alias tables (builtin + persisted custom)
    pub aliases: Arc<AliasStore>,
    /// Lazy-load cache of voice handles
    pub registry: Arc<VoiceRegistry>,
    /// Synthesis front door
    pub gateway: SynthesisGateway,
    /// Download/delete lifecycle
    pub library: VoiceLibrary,
}

impl AppState {
    /// Wire the full object graph over `voices_dir`.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(voices_dir: P, default_voice: S) -> Self {
        let voices_dir = voices_dir.into();
        let aliases = Arc::new(AliasStore::new(&voices_dir));
        let registry = Arc::new(VoiceRegistry::new(&voices_dir));
        let gateway = SynthesisGateway::new(
            aliases.clone(),
            registry.clone(),
            Arc::new(ToneEngine::new()),
        );
        let library = VoiceLibrary::new(
            &voices_dir,
            aliases.clone(),
            registry.clone(),
            Arc::new(HttpDownloader::new()),
        );
        Self {
            voices_dir,
            default_voice: default_voice.into(),
            aliases,
            registry,
            gateway,
            library,
        }
    }

    /// Point downloads at an alternate voice repository.
    #[must_use]
    pub fn with_repo_base<S: Into<String>>(mut self, base: S) -> Self {
        self.library = self.library.with_repo_base(base);
        self
    }

    /// Models to warm at startup: the default voice plus any explicitly
    /// requested names, alias-resolved and deduplicated, default first.
    #[must_use]
    pub fn warmup_models(&self, requested: &[String]) -> Vec<String> {
        let mut models = vec![self.aliases.resolve(&self.default_voice)];
        for name in requested {
            let model = self.aliases.resolve(name);
            if !models.contains(&model) {
                models.push(model);
            }
        }
        models
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("voices_dir", &self.voices_dir)
            .field("default_voice", &self.default_voice)
            .finish()
    }
}
