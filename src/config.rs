//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri del motore e i default per tipo di media
//! - Fornisce validazione dei parametri (inclusi i settings di default)
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//!
//! ## Parametri di configurazione:
//! - `ffmpeg_path` / `ffprobe_path`: binari espliciti (default: risolti dal PATH)
//! - `output_suffix`: suffisso dei file di output derivati (default: "_compressed")
//! - `progress_channel_capacity`: capacità del canale di progresso (default: 256)
//! - `poll_interval_ms`: intervallo di refresh della CLI (default: 100)
//! - `json_output`: output JSON line-delimited invece della progress bar
//! - `video` / `audio` / `image`: impostazioni di default per tipo di media
//!
//! ## Esempio:
//! ```rust
//! use media_compressor::Config;
//!
//! let config = Config {
//!     output_suffix: "_small".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::settings::{AudioSettings, ImageSettings, VideoSettings};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the compressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit ffmpeg binary
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe binary
    pub ffprobe_path: Option<PathBuf>,
    /// Suffix appended to the file stem of derived output paths
    pub output_suffix: String,
    /// Bounded capacity of the progress channel
    pub progress_channel_capacity: usize,
    /// CLI refresh period in milliseconds
    pub poll_interval_ms: u64,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    pub video: VideoSettings,
    pub audio: AudioSettings,
    pub image: ImageSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            output_suffix: "_compressed".to_string(),
            progress_channel_capacity: 256,
            poll_interval_ms: 100,
            json_output: false,
            video: VideoSettings::default(),
            audio: AudioSettings::default(),
            image: ImageSettings::default(),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.output_suffix.is_empty() {
            return Err(anyhow::anyhow!("Output suffix must not be empty"));
        }

        if self.output_suffix.contains(['/', '\\']) {
            return Err(anyhow::anyhow!(
                "Output suffix must not contain path separators: {}",
                self.output_suffix
            ));
        }

        if self.progress_channel_capacity == 0 {
            return Err(anyhow::anyhow!("Progress channel capacity must be greater than 0"));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("Poll interval must be greater than 0"));
        }

        self.video
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid default video settings: {}", e))?;
        self.audio
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid default audio settings: {}", e))?;
        self.image
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid default image settings: {}", e))?;

        Ok(())
    }

    /// Command used to run ffmpeg
    pub fn ffmpeg_command(&self) -> String {
        Self::command_or(&self.ffmpeg_path, "ffmpeg")
    }

    /// Command used to run ffprobe
    pub fn ffprobe_command(&self) -> String {
        Self::command_or(&self.ffprobe_path, "ffprobe")
    }

    fn command_or(path: &Option<PathBuf>, base_name: &str) -> String {
        match path {
            Some(path) => path.to_string_lossy().into_owned(),
            None => crate::platform::PlatformCommands::instance()
                .get_command(base_name)
                .to_string(),
        }
    }

    /// Load configuration from file; a missing file yields the defaults
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AudioQuality, StrategyTag};
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.progress_channel_capacity = 0;
        assert!(config.validate().is_err());

        config.progress_channel_capacity = 16;
        config.output_suffix = "out/".to_string();
        assert!(config.validate().is_err());

        config.output_suffix = "_c".to_string();
        config.image = ImageSettings::new(120);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.output_suffix, "_compressed");
        assert_eq!(config.progress_channel_capacity, 256);
        assert_eq!(config.poll_interval_ms, 100);
        assert!(!config.json_output);
        assert_eq!(config.video, VideoSettings::default());
        assert_eq!(config.audio.quality, AudioQuality::Medium);
        assert_eq!(config.image.quality, 75);
        assert!(config.ffmpeg_path.is_none());
    }

    #[test]
    fn test_explicit_commands() {
        let config = Config {
            ffmpeg_path: Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")),
            ..Default::default()
        };
        assert_eq!(config.ffmpeg_command(), "/opt/ffmpeg/bin/ffmpeg");
        assert!(config.ffprobe_command().starts_with("ffprobe"));
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            output_suffix: "_small".to_string(),
            poll_interval_ms: 250,
            json_output: true,
            video: VideoSettings::default().select_strategy(StrategyTag::ConstantBitrate),
            audio: AudioSettings::new(AudioQuality::High),
            image: ImageSettings::new(60),
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[tokio::test]
    async fn test_partial_and_missing_files() {
        let temp_dir = TempDir::new().unwrap();

        let missing = Config::from_file(&temp_dir.path().join("missing.json")).await.unwrap();
        assert_eq!(missing, Config::default());

        let partial_path = temp_dir.path().join("partial.json");
        tokio::fs::write(&partial_path, r#"{"output_suffix": "_min"}"#).await.unwrap();
        let partial = Config::from_file(&partial_path).await.unwrap();
        assert_eq!(partial.output_suffix, "_min");
        assert_eq!(partial.progress_channel_capacity, 256);

        let invalid_path = temp_dir.path().join("invalid.json");
        tokio::fs::write(&invalid_path, r#"{"image": {"quality": 101}}"#).await.unwrap();
        assert!(Config::from_file(&invalid_path).await.is_err());
    }
}
