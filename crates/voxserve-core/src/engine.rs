//! The synthesis-engine seam.
//!
//! The actual text-to-speech engine is an external collaborator: the
//! registry hands it a loaded voice handle and text, and gets back raw PCM
//! samples. `ToneEngine` is the bundled deterministic implementation so the
//! server runs end-to-end without a neural backend wired in.

use crate::error::VoxResult;
use crate::voice::VoiceHandle;
use async_trait::async_trait;

/// Raw PCM audio: signed 16-bit samples, mono
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    /// Interleaved signed 16-bit samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (always 1 for synthesis output)
    pub channels: u16,
}

impl PcmAudio {
    /// Create a mono PCM buffer at `sample_rate`
    #[must_use]
    pub fn mono(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the audio in seconds
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate) / f64::from(self.channels.max(1))
    }
}

/// Turns text plus a loaded voice handle into raw PCM samples
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Synthesize `text` with the given voice.
    ///
    /// Output is mono 16-bit PCM at the voice's declared sample rate. Empty
    /// text is valid input and produces an empty buffer.
    async fn synthesize(&self, voice: &VoiceHandle, text: &str) -> VoxResult<PcmAudio>;
}

/// Deterministic placeholder engine: renders each input byte as a short
/// pitched tone at the voice's sample rate. Identical input always produces
/// identical output.
#[derive(Debug, Clone)]
pub struct ToneEngine {
    /// Peak amplitude of the generated tones
    amplitude: f64,
    /// Duration of the tone rendered per input byte, in milliseconds
    ms_per_byte: u32,
}

impl ToneEngine {
    /// Create a tone engine with default amplitude and pacing
    #[must_use]
    pub fn new() -> Self {
        Self {
            amplitude: 0.3,
            ms_per_byte: 45,
        }
    }
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisEngine for ToneEngine {
    async fn synthesize(&self, voice: &VoiceHandle, text: &str) -> VoxResult<PcmAudio> {
        let sample_rate = voice.sample_rate();
        let tone_len = (sample_rate as usize * self.ms_per_byte as usize) / 1000;
        let mut samples = Vec::with_capacity(text.len() * tone_len);

        for byte in text.bytes() {
            // Map the byte into a speech-ish frequency band
            let freq = 110.0 + f64::from(byte) * 3.5;
            for n in 0..tone_len {
                let t = n as f64 / f64::from(sample_rate);
                // Linear attack/release envelope avoids clicks at tone edges
                let pos = n as f64 / tone_len as f64;
                let envelope = (pos * 10.0).min(1.0).min((1.0 - pos) * 10.0);
                let value = (std::f64::consts::TAU * freq * t).sin() * self.amplitude * envelope;
                samples.push((value * f64::from(i16::MAX)) as i16);
            }
        }

        tracing::debug!(
            voice = voice.model(),
            text_len = text.len(),
            samples = samples.len(),
            "synthesized tone audio"
        );
        Ok(PcmAudio::mono(samples, sample_rate))
    }
}
