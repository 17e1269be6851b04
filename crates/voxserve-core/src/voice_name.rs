//! Canonical model-name grammar and artifact path helpers.
//!
//! A canonical model name has the fixed form `{lang}_{REGION}-{name}-{quality}`
//! (e.g. `en_US-lessac-high`) and identifies exactly one pair of on-disk
//! artifacts in the voices directory: `<model>.onnx` plus an optional
//! `<model>.onnx.json` metadata document.

use crate::error::{VoxError, VoxResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Voice quality tier, the last component of a canonical model name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Smallest models, lowest fidelity
    XLow,
    /// Low fidelity
    Low,
    /// Default tier
    Medium,
    /// Largest models, highest fidelity
    High,
}

impl Quality {
    /// Parse a quality tier from its canonical spelling
    pub fn parse(s: &str) -> VoxResult<Self> {
        match s {
            "x_low" => Ok(Self::XLow),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(VoxError::validation(format!(
                "unknown quality tier '{other}' (expected x_low, low, medium or high)"
            ))),
        }
    }

    /// Get the canonical spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XLow => "x_low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed canonical model name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceName {
    /// Lowercase language code (e.g. "en")
    pub language: String,
    /// Uppercase region code (e.g. "US")
    pub region: String,
    /// Voice name (e.g. "lessac")
    pub name: String,
    /// Quality tier
    pub quality: Quality,
}

impl VoiceName {
    /// Parse a canonical model name of the form `{lang}_{REGION}-{name}-{quality}`
    ///
    /// # Errors
    ///
    /// Returns a validation error if the string does not match the grammar.
    pub fn parse(model: &str) -> VoxResult<Self> {
        let invalid = || {
            VoxError::validation(format!(
                "invalid model name '{model}' (expected {{lang}}_{{REGION}}-{{name}}-{{quality}}, e.g. en_US-lessac-high)"
            ))
        };

        let mut parts = model.split('-');
        let locale = parts.next().ok_or_else(invalid)?;
        let name = parts.next().ok_or_else(invalid)?;
        let quality = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let (language, region) = locale.split_once('_').ok_or_else(invalid)?;
        if language.is_empty()
            || region.is_empty()
            || name.is_empty()
            || !language.chars().all(|c| c.is_ascii_lowercase())
            || !region.chars().all(|c| c.is_ascii_uppercase())
        {
            return Err(invalid());
        }

        Ok(Self {
            language: language.to_string(),
            region: region.to_string(),
            name: name.to_string(),
            quality: Quality::parse(quality).map_err(|_| invalid())?,
        })
    }

    /// Locale string, e.g. `en_US`
    #[must_use]
    pub fn locale(&self) -> String {
        format!("{}_{}", self.language, self.region)
    }

    /// Path segments of this voice below the remote voice repository root,
    /// `{lang}/{lang}_{REGION}/{name}/{quality}`
    #[must_use]
    pub fn remote_prefix(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.language,
            self.locale(),
            self.name,
            self.quality
        )
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.locale(), self.name, self.quality)
    }
}

/// Path of the model artifact for `model` inside `voices_dir`
#[must_use]
pub fn model_path(voices_dir: &Path, model: &str) -> PathBuf {
    voices_dir.join(format!("{model}.onnx"))
}

/// Path of the optional metadata document for `model` inside `voices_dir`
#[must_use]
pub fn config_path(voices_dir: &Path, model: &str) -> PathBuf {
    voices_dir.join(format!("{model}.onnx.json"))
}

/// Check whether the model artifact for `model` is present in `voices_dir`
#[must_use]
pub fn model_exists(voices_dir: &Path, model: &str) -> bool {
    model_path(voices_dir, model).is_file()
}
