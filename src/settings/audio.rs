//! Audio compression settings.

use super::{AudioQuality, MediaKind, SettingsError, ValidationError};
use serde::{Deserialize, Serialize};

/// Settings for an audio job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioSettings {
    pub quality: AudioQuality,
}

impl AudioSettings {
    pub fn new(quality: AudioQuality) -> Self {
        Self { quality }
    }

    /// Update a field by name; audio settings only carry a quality level
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), SettingsError> {
        match field.trim().to_lowercase().as_str() {
            "quality" | "audio_quality" => {
                self.quality = value.parse().map_err(|_| SettingsError::InvalidValue {
                    field: "quality".to_string(),
                    value: value.to_string(),
                })?;
                Ok(())
            }
            _ => Err(SettingsError::UnknownField {
                kind: MediaKind::Audio,
                field: field.to_string(),
            }),
        }
    }

    /// Every quality level is dispatch-ready
    pub fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_quality() {
        let mut settings = AudioSettings::default();
        assert_eq!(settings.quality, AudioQuality::Medium);

        settings.set_field("quality", "low").unwrap();
        assert_eq!(settings.quality, AudioQuality::Low);

        assert!(settings.set_field("quality", "lossless").is_err());
        assert_eq!(settings.quality, AudioQuality::Low);

        assert!(matches!(
            settings.set_field("bitrate", "128"),
            Err(SettingsError::UnknownField { .. })
        ));
    }
}
