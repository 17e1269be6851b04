//! Composition of alias resolution, the registry and the synthesis seams
//! into a single synthesize-text-with-voice-X-in-format-Y operation.

use crate::alias::AliasStore;
use crate::audio::{self, AudioFormat, EncodedAudio, Mp3Encoder};
use crate::engine::SynthesisEngine;
use crate::error::{VoxError, VoxResult};
use crate::registry::VoiceRegistry;
use std::sync::Arc;

/// Answers a single synthesis request end to end
pub struct SynthesisGateway {
    aliases: Arc<AliasStore>,
    registry: Arc<VoiceRegistry>,
    engine: Arc<dyn SynthesisEngine>,
    mp3: Option<Arc<dyn Mp3Encoder>>,
}

impl SynthesisGateway {
    /// Compose a gateway over the shared stores and the engine collaborator
    #[must_use]
    pub fn new(
        aliases: Arc<AliasStore>,
        registry: Arc<VoiceRegistry>,
        engine: Arc<dyn SynthesisEngine>,
    ) -> Self {
        Self {
            aliases,
            registry,
            engine,
            mp3: None,
        }
    }

    /// Wire an external MP3 encoder. Without one, MP3 requests fall back to
    /// WAV (format is advisory).
    #[must_use]
    pub fn with_mp3_encoder(mut self, encoder: Arc<dyn Mp3Encoder>) -> Self {
        self.mp3 = Some(encoder);
        self
    }

    /// Synthesize `text` with the voice named by `voice_param` (an alias or
    /// a canonical model name) into the requested container format.
    ///
    /// Empty text is accepted and produces a minimal, empty-duration
    /// payload. The first use of a model populates the registry cache.
    ///
    /// # Errors
    ///
    /// Returns a not-found error carrying the original `voice_param` when no
    /// artifact exists for the resolved model, a load error if the model
    /// fails to instantiate, and a synthesis error from the engine.
    pub async fn synthesize(
        &self,
        voice_param: &str,
        text: &str,
        format: AudioFormat,
    ) -> VoxResult<EncodedAudio> {
        let model = self.aliases.resolve(voice_param);
        let handle = self
            .registry
            .get_or_load(&model)
            .await
            .map_err(|e| match e {
                // Report the name the caller actually asked for
                VoxError::NotFound { .. } => VoxError::not_found(voice_param),
                other => other,
            })?;

        let pcm = self.engine.synthesize(&handle, text).await?;
        tracing::debug!(
            voice = voice_param,
            model = %model,
            duration_secs = pcm.duration_secs(),
            %format,
            "synthesis complete"
        );

        match format {
            AudioFormat::Wav => Ok(EncodedAudio {
                format: AudioFormat::Wav,
                bytes: audio::encode_wav(&pcm),
            }),
            AudioFormat::Mp3 => match &self.mp3 {
                Some(encoder) => Ok(EncodedAudio {
                    format: AudioFormat::Mp3,
                    bytes: encoder.encode(&pcm)?,
                }),
                None => {
                    tracing::debug!("no mp3 encoder wired, falling back to wav");
                    Ok(EncodedAudio {
                        format: AudioFormat::Wav,
                        bytes: audio::encode_wav(&pcm),
                    })
                }
            },
        }
    }
}

impl std::fmt::Debug for SynthesisGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisGateway")
            .field("mp3_encoder", &self.mp3.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PcmAudio, ToneEngine};
    use crate::voice_name;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn gateway(dir: &Path) -> SynthesisGateway {
        SynthesisGateway::new(
            Arc::new(AliasStore::new(dir)),
            Arc::new(VoiceRegistry::new(dir)),
            Arc::new(ToneEngine::new()),
        )
    }

    fn touch_model(dir: &Path, model: &str) {
        fs::write(voice_name::model_path(dir, model), b"onnx").unwrap();
    }

    #[tokio::test]
    async fn test_synthesize_via_builtin_alias() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-lessac-high");
        let gateway = gateway(dir.path());

        let audio = gateway
            .synthesize("emma", "hello", AudioFormat::Wav)
            .await
            .unwrap();
        assert_eq!(audio.mime_type(), "audio/wav");
        assert_eq!(&audio.bytes[0..4], b"RIFF");
        assert!(audio.bytes.len() > 44);
    }

    #[tokio::test]
    async fn test_unknown_voice_reports_original_param() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(dir.path());

        // "emma" resolves to a model with no artifact; the error names the
        // parameter the caller sent, not the resolved model
        let err = gateway
            .synthesize("emma", "hello", AudioFormat::Wav)
            .await
            .unwrap_err();
        assert_eq!(err, VoxError::not_found("emma"));
    }

    #[tokio::test]
    async fn test_empty_text_is_accepted() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-lessac-high");
        let gateway = gateway(dir.path());

        let audio = gateway
            .synthesize("emma", "", AudioFormat::Wav)
            .await
            .unwrap();
        // Header-only payload, no validation error
        assert_eq!(audio.bytes.len(), 44);
    }

    #[tokio::test]
    async fn test_mp3_without_encoder_falls_back_to_wav() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-lessac-high");
        let gateway = gateway(dir.path());

        let audio = gateway
            .synthesize("emma", "hi", AudioFormat::Mp3)
            .await
            .unwrap();
        assert_eq!(audio.format, AudioFormat::Wav);
        assert_eq!(audio.mime_type(), "audio/wav");
    }

    #[tokio::test]
    async fn test_mp3_with_encoder() {
        struct StubEncoder;
        impl Mp3Encoder for StubEncoder {
            fn encode(&self, pcm: &PcmAudio) -> VoxResult<Vec<u8>> {
                Ok(vec![0xff, 0xfb, pcm.samples.len() as u8])
            }
        }

        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-lessac-high");
        let gateway = gateway(dir.path()).with_mp3_encoder(Arc::new(StubEncoder));

        let audio = gateway
            .synthesize("emma", "hi", AudioFormat::Mp3)
            .await
            .unwrap();
        assert_eq!(audio.format, AudioFormat::Mp3);
        assert_eq!(audio.mime_type(), "audio/mpeg");
        assert_eq!(&audio.bytes[0..2], &[0xff, 0xfb]);
    }

    #[tokio::test]
    async fn test_identical_requests_are_byte_identical() {
        let dir = TempDir::new().unwrap();
        touch_model(dir.path(), "en_US-lessac-high");
        let gateway = gateway(dir.path());

        let a = gateway
            .synthesize("emma", "hello", AudioFormat::Wav)
            .await
            .unwrap();
        let b = gateway
            .synthesize("emma", "hello", AudioFormat::Wav)
            .await
            .unwrap();
        assert_eq!(a.bytes, b.bytes);
    }
}
