//! # Settings Module
//!
//! Modello tipizzato dei parametri di compressione, una variante per tipo di media.
//!
//! ## Responsabilità:
//! - `video`: strategia di codifica come tagged union (quality, variable-bitrate,
//!   constant-bitrate, scale, target-size), ognuna con i soli campi rilevanti
//! - `audio`: qualità audio (low / medium / high)
//! - `image`: qualità immagine 0-100
//! - `resolver`: selezione strategia, modifica campi e validazione pre-dispatch
//!
//! ## Validazione:
//! Nessun valore viene mai corretto in silenzio: un parametro fuori range produce un
//! `ValidationError` e il job non viene registrato.
//!
//! ## Esempio:
//! ```rust
//! use media_compressor::settings::{StrategyTag, QualityPreset, VideoSettings};
//!
//! let settings = VideoSettings::default().select_strategy(StrategyTag::Quality(QualityPreset::High));
//! assert_eq!(settings.crf(), Some(18));
//! ```

pub mod audio;
pub mod image;
pub mod resolver;
pub mod video;

pub use audio::AudioSettings;
pub use image::ImageSettings;
pub use resolver::SettingsResolver;
pub use video::{QualityPreset, Resolution, StrategyTag, VideoField, VideoSettings, VideoStrategy};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of media a job operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio quality level shared by audio jobs and the audio track of video jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl AudioQuality {
    /// AAC bitrate handed to the encoder for this level
    pub fn aac_bitrate(&self) -> &'static str {
        match self {
            Self::Low => "96k",
            Self::Medium => "128k",
            Self::High => "192k",
        }
    }

    /// Same bitrate as a number, used when a video bitrate budget must leave room for audio
    pub fn aac_kbps(&self) -> u32 {
        match self {
            Self::Low => 96,
            Self::Medium => 128,
            Self::High => 192,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioQuality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

/// Resolved settings for one job, tagged with the media kind they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "settings", rename_all = "lowercase")]
pub enum MediaSettings {
    Video(VideoSettings),
    Audio(AudioSettings),
    Image(ImageSettings),
}

impl MediaSettings {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Video(_) => MediaKind::Video,
            Self::Audio(_) => MediaKind::Audio,
            Self::Image(_) => MediaKind::Image,
        }
    }

    /// Check every rule that must hold before the settings can be dispatched
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Video(settings) => settings.validate(),
            Self::Audio(settings) => settings.validate(),
            Self::Image(settings) => settings.validate(),
        }
    }

    /// Validate and additionally require the settings to match `kind`
    pub fn validate_for(&self, kind: MediaKind) -> Result<(), ValidationError> {
        if self.kind() != kind {
            return Err(ValidationError::KindMismatch {
                requested: kind,
                settings: self.kind(),
            });
        }
        self.validate()
    }
}

impl From<VideoSettings> for MediaSettings {
    fn from(settings: VideoSettings) -> Self {
        Self::Video(settings)
    }
}

impl From<AudioSettings> for MediaSettings {
    fn from(settings: AudioSettings) -> Self {
        Self::Audio(settings)
    }
}

impl From<ImageSettings> for MediaSettings {
    fn from(settings: ImageSettings) -> Self {
        Self::Image(settings)
    }
}

/// Settings rule violations found before dispatch
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("CRF must be between 0 and 51, got {0}")]
    CrfOutOfRange(u8),

    #[error("Image quality must be between 0 and 100, got {0}")]
    ImageQualityOutOfRange(u8),

    #[error("Scale percent must be greater than 0, got {0}")]
    ScalePercentNotPositive(f64),

    #[error("Target size must be greater than 0 MB, got {0}")]
    TargetSizeNotPositive(f64),

    #[error("Target bitrate must be greater than 0 kbps, got {0}")]
    TargetBitrateNotPositive(u32),

    #[error("{settings} settings cannot be used for a {requested} job")]
    KindMismatch {
        requested: MediaKind,
        settings: MediaKind,
    },
}

/// Rejections produced while editing a single settings field.
///
/// The settings object is left untouched whenever one of these is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },

    #[error("Unknown {kind} settings field '{field}'")]
    UnknownField { kind: MediaKind, field: String },

    #[error("{field} is locked while the {strategy} strategy is active")]
    FieldLocked { field: VideoField, strategy: StrategyTag },

    #[error("{field} does not apply to the {strategy} strategy")]
    NotApplicable { field: VideoField, strategy: StrategyTag },

    #[error("{field} can only be changed with custom overrides enabled")]
    OverridesDisabled { field: VideoField },
}

/// Parse a numeric field, refusing anything that is not a finite number
pub(crate) fn parse_number<T>(field: impl fmt::Display, value: &str) -> Result<T, SettingsError>
where
    T: FromStr + IsFinite,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(IsFinite::is_finite_value)
        .ok_or_else(|| SettingsError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Finite check for the numeric types settings fields use
pub(crate) trait IsFinite {
    fn is_finite_value(&self) -> bool;
}

impl IsFinite for f64 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

macro_rules! always_finite {
    ($($t:ty),*) => {
        $(impl IsFinite for $t {
            fn is_finite_value(&self) -> bool {
                true
            }
        })*
    };
}

always_finite!(u8, u32);
