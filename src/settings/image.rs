//! Image compression settings.

use super::{parse_number, MediaKind, SettingsError, ValidationError};
use serde::{Deserialize, Serialize};

/// Highest accepted image quality
pub const MAX_IMAGE_QUALITY: u8 = 100;

/// Settings for an image job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    /// Quality 0-100, higher keeps more detail
    pub quality: u8,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self { quality: 75 }
    }
}

impl ImageSettings {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), SettingsError> {
        match field.trim().to_lowercase().as_str() {
            "quality" => {
                self.quality = parse_number("quality", value)?;
                Ok(())
            }
            _ => Err(SettingsError::UnknownField {
                kind: MediaKind::Image,
                field: field.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quality > MAX_IMAGE_QUALITY {
            return Err(ValidationError::ImageQualityOutOfRange(self.quality));
        }
        Ok(())
    }

    /// Map quality 0-100 onto ffmpeg's `-q:v` scale, where 2 is best and 31 worst
    pub fn ffmpeg_qscale(&self) -> u8 {
        let quality = self.quality.min(MAX_IMAGE_QUALITY) as u32;
        (31 - (quality * 29 + 50) / 100) as u8
    }
}
