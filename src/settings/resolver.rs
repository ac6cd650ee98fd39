//! # Settings Resolver
//!
//! Mantiene le impostazioni correnti per ogni tipo di media e produce un oggetto
//! `MediaSettings` completo e validato per il dispatch.
//!
//! ## Operazioni:
//! - `select_strategy()`: cambia strategia video applicando i default della tabella
//! - `set_field()`: modifica un singolo campo (parsing numerico, lock del CRF)
//! - `resolve()`: restituisce le impostazioni del tipo richiesto, già validate

use super::{
    AudioSettings, ImageSettings, MediaKind, MediaSettings, SettingsError, StrategyTag,
    ValidationError, VideoField, VideoSettings,
};
use tracing::debug;

/// Pure form of [`VideoSettings::select_strategy`]
pub fn select_strategy(tag: StrategyTag, current: &VideoSettings) -> VideoSettings {
    current.select_strategy(tag)
}

/// Pure form of [`VideoSettings::set_field`]: returns the updated copy or the rejection
pub fn set_field(
    field: VideoField,
    value: &str,
    current: &VideoSettings,
) -> Result<VideoSettings, SettingsError> {
    let mut next = current.clone();
    next.set_field(field, value)?;
    Ok(next)
}

/// Current user selections for every media kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsResolver {
    video: VideoSettings,
    audio: AudioSettings,
    image: ImageSettings,
}

impl SettingsResolver {
    pub fn new(video: VideoSettings, audio: AudioSettings, image: ImageSettings) -> Self {
        Self { video, audio, image }
    }

    pub fn video(&self) -> &VideoSettings {
        &self.video
    }

    pub fn audio(&self) -> &AudioSettings {
        &self.audio
    }

    pub fn image(&self) -> &ImageSettings {
        &self.image
    }

    /// Switch the video strategy
    pub fn select_strategy(&mut self, tag: StrategyTag) -> &VideoSettings {
        self.video = self.video.select_strategy(tag);
        debug!("Video strategy set to {}", tag);
        &self.video
    }

    /// Set a named field on the settings of `kind`
    pub fn set_field(&mut self, kind: MediaKind, field: &str, value: &str) -> Result<(), SettingsError> {
        let result = match kind {
            MediaKind::Video => {
                let video_field: VideoField = field.parse().map_err(|_| SettingsError::UnknownField {
                    kind,
                    field: field.to_string(),
                })?;
                self.video.set_field(video_field, value)
            }
            MediaKind::Audio => self.audio.set_field(field, value),
            MediaKind::Image => self.image.set_field(field, value),
        };

        if let Err(ref e) = result {
            debug!("Rejected {} settings change {}={}: {}", kind, field, value, e);
        }
        result
    }

    /// Current settings for `kind`, without validation
    pub fn current(&self, kind: MediaKind) -> MediaSettings {
        match kind {
            MediaKind::Video => MediaSettings::Video(self.video.clone()),
            MediaKind::Audio => MediaSettings::Audio(self.audio),
            MediaKind::Image => MediaSettings::Image(self.image),
        }
    }

    /// Dispatch-ready settings for `kind`
    pub fn resolve(&self, kind: MediaKind) -> Result<MediaSettings, ValidationError> {
        let settings = self.current(kind);
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AudioQuality, QualityPreset, Resolution};

    #[test]
    fn test_balanced_scenario() {
        let mut resolver = SettingsResolver::default();
        resolver.select_strategy(StrategyTag::Quality(QualityPreset::Balanced));

        match resolver.resolve(MediaKind::Video).unwrap() {
            MediaSettings::Video(video) => {
                assert_eq!(video.resolution, Resolution::P720);
                assert_eq!(video.crf(), Some(23));
                assert_eq!(video.audio_quality, AudioQuality::Medium);
            }
            other => panic!("expected video settings, got {:?}", other),
        }
    }

    #[test]
    fn test_pure_functions_do_not_mutate_input() {
        let current = VideoSettings::default().select_strategy(StrategyTag::ConstantBitrate);
        let next = set_field(VideoField::TargetBitrateKbps, "4000", &current).unwrap();
        assert_ne!(current, next);

        let locked = set_field(VideoField::Crf, "20", &next);
        assert!(matches!(locked, Err(SettingsError::FieldLocked { .. })));

        let vbr = select_strategy(StrategyTag::VariableBitrate, &next);
        assert_eq!(vbr.crf(), Some(22));
    }

    #[test]
    fn test_set_field_routes_by_kind() {
        let mut resolver = SettingsResolver::default();
        resolver.set_field(MediaKind::Image, "quality", "40").unwrap();
        resolver.set_field(MediaKind::Audio, "quality", "high").unwrap();
        assert_eq!(resolver.image().quality, 40);
        assert_eq!(resolver.audio().quality, AudioQuality::High);

        assert!(matches!(
            resolver.set_field(MediaKind::Video, "framerate", "30"),
            Err(SettingsError::UnknownField { kind: MediaKind::Video, .. })
        ));
    }

    #[test]
    fn test_resolve_reports_validation_error() {
        let mut resolver = SettingsResolver::default();
        resolver.set_field(MediaKind::Image, "quality", "120").unwrap();
        assert_eq!(
            resolver.resolve(MediaKind::Image),
            Err(ValidationError::ImageQualityOutOfRange(120))
        );
        assert!(resolver.resolve(MediaKind::Video).is_ok());
    }
}
