//! # Video Settings
//!
//! Strategia di codifica video modellata come tagged union.
//!
//! ## Default per strategia:
//! | Strategia | Risoluzione | CRF | Altro |
//! |-----------|-------------|-----|-------|
//! | quality (small) | 480p | 28 | audio low |
//! | quality (balanced) | 720p | 23 | audio medium |
//! | quality (high) | 1080p | 18 | audio high |
//! | variable-bitrate | original | 22 | - |
//! | constant-bitrate | original | - | 1000 kbps |
//! | scale | original | - | 50% |
//! | target-size | original | - | 100 MB |
//!
//! ## Override:
//! Con `custom_overrides` attivo si possono cambiare risoluzione, CRF e qualità audio
//! indipendentemente dalla strategia. Il CRF resta bloccato solo in constant-bitrate;
//! in scale e target-size è un override opzionale, assente di default.

use super::{parse_number, AudioQuality, SettingsError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest CRF value accepted by x264/x265
pub const MAX_CRF: u8 = 51;

/// Quality preset for the quality strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    Small,
    #[default]
    Balanced,
    High,
}

impl QualityPreset {
    pub fn resolution(&self) -> Resolution {
        match self {
            Self::Small => Resolution::P480,
            Self::Balanced => Resolution::P720,
            Self::High => Resolution::P1080,
        }
    }

    pub fn crf(&self) -> u8 {
        match self {
            Self::Small => 28,
            Self::Balanced => 23,
            Self::High => 18,
        }
    }

    pub fn audio_quality(&self) -> AudioQuality {
        match self {
            Self::Small => AudioQuality::Low,
            Self::Balanced => AudioQuality::Medium,
            Self::High => AudioQuality::High,
        }
    }

    /// x264 speed preset used for this quality level
    pub fn encoder_preset(&self) -> &'static str {
        match self {
            Self::Small => "fast",
            Self::Balanced => "medium",
            Self::High => "slow",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Balanced => "balanced",
            Self::High => "high",
        }
    }
}

/// Output resolution, `Original` keeps the source dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    /// Target frame height, `None` for the source resolution
    pub fn height(&self) -> Option<u32> {
        match self {
            Self::Original => None,
            Self::P480 => Some(480),
            Self::P720 => Some(720),
            Self::P1080 => Some(1080),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "480p" | "480" => Ok(Self::P480),
            "720p" | "720" => Ok(Self::P720),
            "1080p" | "1080" => Ok(Self::P1080),
            _ => Err(()),
        }
    }
}

/// Strategy selector, the payload-free counterpart of [`VideoStrategy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyTag {
    Quality(QualityPreset),
    VariableBitrate,
    ConstantBitrate,
    Scale,
    TargetSize,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quality(preset) => write!(f, "quality ({})", preset.as_str()),
            Self::VariableBitrate => f.write_str("variable-bitrate"),
            Self::ConstantBitrate => f.write_str("constant-bitrate"),
            Self::Scale => f.write_str("scale"),
            Self::TargetSize => f.write_str("target-size"),
        }
    }
}

impl FromStr for StrategyTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(Self::Quality(QualityPreset::Small)),
            "quality" | "balanced" => Ok(Self::Quality(QualityPreset::Balanced)),
            "high" => Ok(Self::Quality(QualityPreset::High)),
            "vbr" | "variable-bitrate" => Ok(Self::VariableBitrate),
            "cbr" | "constant-bitrate" => Ok(Self::ConstantBitrate),
            "scale" => Ok(Self::Scale),
            "size" | "target-size" => Ok(Self::TargetSize),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// Active encoding strategy with only the fields it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum VideoStrategy {
    Quality { preset: QualityPreset, crf: u8 },
    VariableBitrate { crf: u8 },
    ConstantBitrate { target_bitrate_kbps: u32 },
    /// `crf` is only set through custom overrides
    Scale { scale_percent: f64, crf: Option<u8> },
    /// `crf` is only set through custom overrides
    TargetSize {
        target_size_mb: f64,
        crf: Option<u8>,
    },
}

impl VideoStrategy {
    /// Default parameters for a strategy
    pub fn defaults(tag: StrategyTag) -> Self {
        match tag {
            StrategyTag::Quality(preset) => Self::Quality {
                preset,
                crf: preset.crf(),
            },
            StrategyTag::VariableBitrate => Self::VariableBitrate { crf: 22 },
            StrategyTag::ConstantBitrate => Self::ConstantBitrate {
                target_bitrate_kbps: 1000,
            },
            StrategyTag::Scale => Self::Scale {
                scale_percent: 50.0,
                crf: None,
            },
            StrategyTag::TargetSize => Self::TargetSize {
                target_size_mb: 100.0,
                crf: None,
            },
        }
    }

    pub fn tag(&self) -> StrategyTag {
        match self {
            Self::Quality { preset, .. } => StrategyTag::Quality(*preset),
            Self::VariableBitrate { .. } => StrategyTag::VariableBitrate,
            Self::ConstantBitrate { .. } => StrategyTag::ConstantBitrate,
            Self::Scale { .. } => StrategyTag::Scale,
            Self::TargetSize { .. } => StrategyTag::TargetSize,
        }
    }
}

/// Editable video settings fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoField {
    Resolution,
    Crf,
    TargetBitrateKbps,
    ScalePercent,
    TargetSizeMb,
    AudioQuality,
    CustomOverrides,
}

impl VideoField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolution => "resolution",
            Self::Crf => "crf",
            Self::TargetBitrateKbps => "target_bitrate_kbps",
            Self::ScalePercent => "scale_percent",
            Self::TargetSizeMb => "target_size_mb",
            Self::AudioQuality => "audio_quality",
            Self::CustomOverrides => "custom_overrides",
        }
    }
}

impl fmt::Display for VideoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").to_lowercase().as_str() {
            "resolution" => Ok(Self::Resolution),
            "crf" | "crf_value" | "crfvalue" => Ok(Self::Crf),
            "target_bitrate_kbps" | "bitrate" | "targetbitratekbps" => Ok(Self::TargetBitrateKbps),
            "scale_percent" | "scale" | "scalepercent" => Ok(Self::ScalePercent),
            "target_size_mb" | "target_size" | "targetsizemb" => Ok(Self::TargetSizeMb),
            "audio_quality" | "audioquality" => Ok(Self::AudioQuality),
            "custom_overrides" | "custom_settings" | "customoverrides" | "customsettings" => {
                Ok(Self::CustomOverrides)
            }
            _ => Err(()),
        }
    }
}

/// Complete video settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub strategy: VideoStrategy,
    pub resolution: Resolution,
    pub audio_quality: AudioQuality,
    #[serde(default)]
    pub custom_overrides: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self::for_strategy(StrategyTag::Quality(QualityPreset::Balanced))
    }
}

impl VideoSettings {
    /// Fresh settings with every default for `tag` applied
    pub fn for_strategy(tag: StrategyTag) -> Self {
        let (resolution, audio_quality) = match tag {
            StrategyTag::Quality(preset) => (preset.resolution(), preset.audio_quality()),
            _ => (Resolution::Original, AudioQuality::default()),
        };

        Self {
            strategy: VideoStrategy::defaults(tag),
            resolution,
            audio_quality,
            custom_overrides: false,
        }
    }

    pub fn tag(&self) -> StrategyTag {
        self.strategy.tag()
    }

    /// CRF in effect, if the active strategy uses one
    pub fn crf(&self) -> Option<u8> {
        match &self.strategy {
            VideoStrategy::Quality { crf, .. } | VideoStrategy::VariableBitrate { crf } => Some(*crf),
            VideoStrategy::Scale { crf, .. } | VideoStrategy::TargetSize { crf, .. } => *crf,
            VideoStrategy::ConstantBitrate { .. } => None,
        }
    }

    /// Switch strategy and reset its parameters to the strategy defaults.
    ///
    /// Quality presets bring their own audio quality; the other strategies keep the
    /// current one. Custom overrides are switched off, as choosing a strategy replaces
    /// any hand-tuned values.
    pub fn select_strategy(&self, tag: StrategyTag) -> Self {
        let mut next = Self::for_strategy(tag);
        if !matches!(tag, StrategyTag::Quality(_)) {
            next.audio_quality = self.audio_quality;
        }
        next
    }

    /// Update a single field from its textual value.
    ///
    /// On error the settings are unchanged.
    pub fn set_field(&mut self, field: VideoField, value: &str) -> Result<(), SettingsError> {
        let strategy = self.tag();
        let overrides = self.custom_overrides;

        match field {
            VideoField::CustomOverrides => {
                self.custom_overrides = parse_flag(field, value)?;
            }
            VideoField::Resolution => {
                require_overrides(field, overrides)?;
                self.resolution = value.parse().map_err(|_| invalid(field, value))?;
            }
            VideoField::AudioQuality => {
                require_overrides(field, overrides)?;
                self.audio_quality = value.parse().map_err(|_| invalid(field, value))?;
            }
            VideoField::Crf => match &mut self.strategy {
                VideoStrategy::ConstantBitrate { .. } => {
                    return Err(SettingsError::FieldLocked { field, strategy });
                }
                VideoStrategy::Quality { crf, .. } | VideoStrategy::VariableBitrate { crf } => {
                    require_overrides(field, overrides)?;
                    *crf = parse_number(field, value)?;
                }
                VideoStrategy::Scale { crf, .. } | VideoStrategy::TargetSize { crf, .. } => {
                    require_overrides(field, overrides)?;
                    *crf = Some(parse_number(field, value)?);
                }
            },
            VideoField::TargetBitrateKbps => match &mut self.strategy {
                VideoStrategy::ConstantBitrate { target_bitrate_kbps } => {
                    *target_bitrate_kbps = parse_number(field, value)?;
                }
                _ => return Err(SettingsError::NotApplicable { field, strategy }),
            },
            VideoField::ScalePercent => match &mut self.strategy {
                VideoStrategy::Scale { scale_percent, .. } => {
                    *scale_percent = parse_number(field, value)?;
                }
                _ => return Err(SettingsError::NotApplicable { field, strategy }),
            },
            VideoField::TargetSizeMb => match &mut self.strategy {
                VideoStrategy::TargetSize { target_size_mb, .. } => {
                    *target_size_mb = parse_number(field, value)?;
                }
                _ => return Err(SettingsError::NotApplicable { field, strategy }),
            },
        }

        Ok(())
    }

    /// Check the rules of the active strategy
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(crf) = self.crf() {
            if crf > MAX_CRF {
                return Err(ValidationError::CrfOutOfRange(crf));
            }
        }

        match &self.strategy {
            VideoStrategy::ConstantBitrate { target_bitrate_kbps } if *target_bitrate_kbps == 0 => {
                Err(ValidationError::TargetBitrateNotPositive(*target_bitrate_kbps))
            }
            VideoStrategy::Scale { scale_percent, .. } if !(*scale_percent > 0.0) => {
                Err(ValidationError::ScalePercentNotPositive(*scale_percent))
            }
            VideoStrategy::TargetSize { target_size_mb, .. } if !(*target_size_mb > 0.0) => {
                Err(ValidationError::TargetSizeNotPositive(*target_size_mb))
            }
            _ => Ok(()),
        }
    }
}

fn require_overrides(field: VideoField, overrides: bool) -> Result<(), SettingsError> {
    if overrides {
        Ok(())
    } else {
        Err(SettingsError::OverridesDisabled { field })
    }
}

fn invalid(field: VideoField, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_flag(field: VideoField, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_preset_defaults() {
        let small = VideoSettings::for_strategy(StrategyTag::Quality(QualityPreset::Small));
        assert_eq!(small.resolution, Resolution::P480);
        assert_eq!(small.crf(), Some(28));
        assert_eq!(small.audio_quality, AudioQuality::Low);

        let balanced = VideoSettings::default();
        assert_eq!(balanced.resolution, Resolution::P720);
        assert_eq!(balanced.crf(), Some(23));
        assert_eq!(balanced.audio_quality, AudioQuality::Medium);

        let high = balanced.select_strategy(StrategyTag::Quality(QualityPreset::High));
        assert_eq!(high.resolution, Resolution::P1080);
        assert_eq!(high.crf(), Some(18));
        assert_eq!(high.audio_quality, AudioQuality::High);
    }

    #[test]
    fn test_non_quality_strategy_defaults() {
        let current = VideoSettings::for_strategy(StrategyTag::Quality(QualityPreset::High));

        let vbr = current.select_strategy(StrategyTag::VariableBitrate);
        assert_eq!(vbr.resolution, Resolution::Original);
        assert_eq!(vbr.crf(), Some(22));
        assert_eq!(vbr.audio_quality, AudioQuality::High);

        let cbr = current.select_strategy(StrategyTag::ConstantBitrate);
        assert_eq!(cbr.strategy, VideoStrategy::ConstantBitrate { target_bitrate_kbps: 1000 });
        assert_eq!(cbr.crf(), None);

        let scale = current.select_strategy(StrategyTag::Scale);
        assert_eq!(scale.strategy, VideoStrategy::Scale { scale_percent: 50.0, crf: None });

        let size = current.select_strategy(StrategyTag::TargetSize);
        assert_eq!(size.strategy, VideoStrategy::TargetSize { target_size_mb: 100.0, crf: None });
        assert_eq!(size.resolution, Resolution::Original);
        assert_eq!(size.crf(), None);
    }

    #[test]
    fn test_switching_strategy_drops_previous_fields() {
        let mut settings = VideoSettings::default().select_strategy(StrategyTag::ConstantBitrate);
        settings.set_field(VideoField::TargetBitrateKbps, "2500").unwrap();

        let scale = settings.select_strategy(StrategyTag::Scale);
        let back = scale.select_strategy(StrategyTag::ConstantBitrate);
        assert_eq!(back.strategy, VideoStrategy::ConstantBitrate { target_bitrate_kbps: 1000 });
    }

    #[test]
    fn test_crf_locked_under_constant_bitrate() {
        let mut settings = VideoSettings::default().select_strategy(StrategyTag::ConstantBitrate);
        settings.set_field(VideoField::CustomOverrides, "true").unwrap();
        let before = settings.clone();

        let result = settings.set_field(VideoField::Crf, "30");
        assert_eq!(
            result,
            Err(SettingsError::FieldLocked {
                field: VideoField::Crf,
                strategy: StrategyTag::ConstantBitrate,
            })
        );
        assert_eq!(settings, before);
        assert_eq!(settings.crf(), None);
    }

    #[test]
    fn test_overrides_required_for_resolution_and_crf() {
        let mut settings = VideoSettings::default();
        assert_eq!(
            settings.set_field(VideoField::Crf, "30"),
            Err(SettingsError::OverridesDisabled { field: VideoField::Crf })
        );
        assert!(settings.set_field(VideoField::Resolution, "1080p").is_err());

        settings.set_field(VideoField::CustomOverrides, "on").unwrap();
        settings.set_field(VideoField::Crf, "30").unwrap();
        settings.set_field(VideoField::Resolution, "1080p").unwrap();
        settings.set_field(VideoField::AudioQuality, "high").unwrap();

        assert_eq!(settings.crf(), Some(30));
        assert_eq!(settings.resolution, Resolution::P1080);
        assert_eq!(settings.audio_quality, AudioQuality::High);
        assert_eq!(settings.tag(), StrategyTag::Quality(QualityPreset::Balanced));
    }

    #[test]
    fn test_crf_override_under_scale() {
        let mut settings = VideoSettings::default().select_strategy(StrategyTag::Scale);
        settings.set_field(VideoField::CustomOverrides, "true").unwrap();
        settings.set_field(VideoField::Crf, "26").unwrap();
        assert_eq!(settings.crf(), Some(26));
    }

    #[test]
    fn test_crf_override_under_target_size() {
        let mut settings = VideoSettings::default().select_strategy(StrategyTag::TargetSize);
        assert_eq!(
            settings.set_field(VideoField::Crf, "26"),
            Err(SettingsError::OverridesDisabled { field: VideoField::Crf })
        );

        settings.set_field(VideoField::CustomOverrides, "true").unwrap();
        settings.set_field(VideoField::Crf, "26").unwrap();
        assert_eq!(settings.crf(), Some(26));
        assert_eq!(
            settings.strategy,
            VideoStrategy::TargetSize { target_size_mb: 100.0, crf: Some(26) }
        );
        assert_eq!(settings.validate(), Ok(()));

        settings.set_field(VideoField::Crf, "52").unwrap();
        assert_eq!(settings.validate(), Err(ValidationError::CrfOutOfRange(52)));
    }

    #[test]
    fn test_non_numeric_values_leave_settings_unchanged() {
        let mut settings = VideoSettings::default().select_strategy(StrategyTag::Scale);
        let before = settings.clone();

        assert!(matches!(
            settings.set_field(VideoField::ScalePercent, "half"),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(settings.set_field(VideoField::ScalePercent, "NaN").is_err());
        assert_eq!(settings, before);

        settings.set_field(VideoField::ScalePercent, "25").unwrap();
        assert_eq!(settings.strategy, VideoStrategy::Scale { scale_percent: 25.0, crf: None });
    }

    #[test]
    fn test_field_not_applicable_to_strategy() {
        let mut settings = VideoSettings::default();
        assert_eq!(
            settings.set_field(VideoField::TargetSizeMb, "50"),
            Err(SettingsError::NotApplicable {
                field: VideoField::TargetSizeMb,
                strategy: StrategyTag::Quality(QualityPreset::Balanced),
            })
        );
    }

    #[test]
    fn test_validation_reports_without_clamping() {
        let mut settings = VideoSettings::default();
        settings.set_field(VideoField::CustomOverrides, "true").unwrap();
        settings.set_field(VideoField::Crf, "60").unwrap();
        assert_eq!(settings.validate(), Err(ValidationError::CrfOutOfRange(60)));
        assert_eq!(settings.crf(), Some(60));

        let mut cbr = VideoSettings::default().select_strategy(StrategyTag::ConstantBitrate);
        cbr.set_field(VideoField::TargetBitrateKbps, "0").unwrap();
        assert_eq!(cbr.validate(), Err(ValidationError::TargetBitrateNotPositive(0)));

        let mut scale = VideoSettings::default().select_strategy(StrategyTag::Scale);
        scale.set_field(VideoField::ScalePercent, "0").unwrap();
        assert_eq!(scale.validate(), Err(ValidationError::ScalePercentNotPositive(0.0)));

        let mut size = VideoSettings::default().select_strategy(StrategyTag::TargetSize);
        size.set_field(VideoField::TargetSizeMb, "-5").unwrap();
        assert_eq!(size.validate(), Err(ValidationError::TargetSizeNotPositive(-5.0)));
    }

    #[test]
    fn test_scale_percent_above_hundred_is_valid() {
        let mut scale = VideoSettings::default().select_strategy(StrategyTag::Scale);
        scale.set_field(VideoField::ScalePercent, "150").unwrap();
        assert!(scale.validate().is_ok());
    }

    #[test]
    fn test_strategy_tag_parsing() {
        assert_eq!("balanced".parse::<StrategyTag>(), Ok(StrategyTag::Quality(QualityPreset::Balanced)));
        assert_eq!("cbr".parse::<StrategyTag>(), Ok(StrategyTag::ConstantBitrate));
        assert_eq!("target-size".parse::<StrategyTag>(), Ok(StrategyTag::TargetSize));
        assert!("lossless".parse::<StrategyTag>().is_err());
        assert_eq!("crfValue".parse::<VideoField>(), Ok(VideoField::Crf));
        assert_eq!("target-size-mb".parse::<VideoField>(), Ok(VideoField::TargetSizeMb));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = VideoSettings::default().select_strategy(StrategyTag::TargetSize);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"mode\":\"target-size\""));
        let back: VideoSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
