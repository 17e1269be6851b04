//! Audio container formats and PCM encoding.
//!
//! WAV encoding is a pure in-memory RIFF writer; MP3 is an external
//! transcoding collaborator behind the [`Mp3Encoder`] trait.

use crate::engine::PcmAudio;
use crate::error::VoxResult;

/// Supported output container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioFormat {
    /// WAV container (uncompressed PCM), the default
    #[default]
    Wav,
    /// MP3 via the external encoder
    Mp3,
}

impl AudioFormat {
    /// Parse a requested format. The format is advisory, not strictly
    /// validated: unknown values fall back to WAV.
    #[must_use]
    pub fn from_param(param: &str) -> Self {
        match param.to_ascii_lowercase().as_str() {
            "mp3" => Self::Mp3,
            "wav" => Self::Wav,
            other => {
                if !other.is_empty() {
                    tracing::debug!(format = other, "unknown audio format, using wav");
                }
                Self::Wav
            }
        }
    }

    /// Get the file extension for the format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    /// Get the MIME type for the format
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Encoded audio bytes plus the container format they are in
#[derive(Debug, Clone)]
pub struct EncodedAudio {
    /// The container format of `bytes`
    pub format: AudioFormat,
    /// The encoded payload
    pub bytes: Vec<u8>,
}

impl EncodedAudio {
    /// MIME type of the payload
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Pure, stateless PCM-to-MP3 transcoder seam
pub trait Mp3Encoder: Send + Sync {
    /// Encode mono 16-bit PCM into an MP3 stream
    fn encode(&self, pcm: &PcmAudio) -> VoxResult<Vec<u8>>;
}

/// Wrap PCM samples into a WAV/RIFF container in memory (16-bit PCM).
#[must_use]
pub fn encode_wav(pcm: &PcmAudio) -> Vec<u8> {
    let data_size = (pcm.samples.len() * 2) as u32;
    let channels = pcm.channels.max(1);
    let byte_rate = pcm.sample_rate * u32::from(channels) * 2;
    let block_align = channels * 2;

    let mut out = Vec::with_capacity(44 + pcm.samples.len() * 2);

    // RIFF chunk
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk: 16-byte PCM header
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&pcm.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes()); // bit depth

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for sample in &pcm.samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_param() {
        assert_eq!(AudioFormat::from_param("wav"), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_param("mp3"), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_param("MP3"), AudioFormat::Mp3);
        // Advisory: unknown formats fall back to wav
        assert_eq!(AudioFormat::from_param("flac"), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_param(""), AudioFormat::Wav);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
    }

    #[test]
    fn test_wav_header_layout() {
        let pcm = PcmAudio::mono(vec![0, 1000, -1000, i16::MAX], 22_050);
        let wav = encode_wav(&pcm);

        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        // PCM format tag, mono
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
            22_050
        );
        // data chunk size
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 8);
    }

    #[test]
    fn test_empty_pcm_yields_header_only_wav() {
        let pcm = PcmAudio::mono(vec![], 22_050);
        let wav = encode_wav(&pcm);
        assert_eq!(wav.len(), 44);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 0);
    }
}
