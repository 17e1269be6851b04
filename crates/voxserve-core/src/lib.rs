//! # voxserve-core
//!
//! Voice registry for piper-style speech-synthesis voices: alias resolution,
//! a concurrency-safe lazy-load cache of voice model handles, filesystem
//! discovery, and the lifecycle rules for downloading and deleting voices.
//!
//! The synthesis engine itself and the MP3 transcoder are external
//! collaborators behind the [`SynthesisEngine`] and [`Mp3Encoder`] seams.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voxserve_core::{AliasStore, AudioFormat, SynthesisGateway, ToneEngine, VoiceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), voxserve_core::VoxError> {
//!     let voices_dir = "/voices";
//!     let gateway = SynthesisGateway::new(
//!         Arc::new(AliasStore::new(voices_dir)),
//!         Arc::new(VoiceRegistry::new(voices_dir)),
//!         Arc::new(ToneEngine::new()),
//!     );
//!     let audio = gateway.synthesize("emma", "Hello, world!", AudioFormat::Wav).await?;
//!     println!("{} bytes of {}", audio.bytes.len(), audio.mime_type());
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod alias;
pub mod audio;
pub mod discovery;
pub mod download;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod library;
pub mod registry;
pub mod voice;
pub mod voice_name;

// Re-export main types for convenience
pub use alias::AliasStore;
pub use audio::{AudioFormat, EncodedAudio, Mp3Encoder};
pub use discovery::{scan, sort_for_listing, DiscoveredVoice};
pub use download::{Downloader, HttpDownloader};
pub use engine::{PcmAudio, SynthesisEngine, ToneEngine};
pub use error::{VoxError, VoxResult};
pub use gateway::SynthesisGateway;
pub use library::VoiceLibrary;
pub use registry::VoiceRegistry;
pub use voice::{VoiceConfig, VoiceHandle};
pub use voice_name::{Quality, VoiceName};

/// Version information for the voxserve-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
