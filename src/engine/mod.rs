//! # Compression Engine Boundary
//!
//! Il motore di compressione è un collaboratore esterno: riceve `(input, output,
//! settings)`, risponde in modo asincrono con un messaggio di successo o di errore e,
//! in parallelo, pubblica eventi di progresso sul canale del `ProgressBridge`.
//!
//! ## Moduli:
//! - `args`: costruzione degli argomenti FFmpeg a partire dalle impostazioni risolte
//! - `ffmpeg`: implementazione `FfmpegEngine` basata su `tokio::process`
//! - `probe`: analisi durata/bitrate con ffprobe (necessaria per target-size)

pub mod args;
pub mod ffmpeg;
pub mod probe;

pub use ffmpeg::FfmpegEngine;

use crate::error::CompressError;
use crate::settings::{AudioSettings, ImageSettings, MediaSettings, VideoSettings};
use async_trait::async_trait;

/// Failure message returned by an engine, kept verbatim
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineFailure(pub String);

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<EngineFailure> for CompressError {
    fn from(failure: EngineFailure) -> Self {
        CompressError::EngineFailure(failure.0)
    }
}

/// The three commands an engine exposes, one outstanding call per job
#[async_trait]
pub trait CompressionEngine: Send + Sync {
    async fn compress_video(
        &self,
        input_path: &str,
        output_path: &str,
        settings: &VideoSettings,
    ) -> Result<String, EngineFailure>;

    async fn compress_audio(
        &self,
        input_path: &str,
        output_path: &str,
        settings: &AudioSettings,
    ) -> Result<String, EngineFailure>;

    async fn compress_image(
        &self,
        input_path: &str,
        output_path: &str,
        settings: &ImageSettings,
    ) -> Result<String, EngineFailure>;
}

/// Route a job to the engine command matching its settings
pub async fn invoke(
    engine: &dyn CompressionEngine,
    input_path: &str,
    output_path: &str,
    settings: &MediaSettings,
) -> Result<String, EngineFailure> {
    match settings {
        MediaSettings::Video(video) => engine.compress_video(input_path, output_path, video).await,
        MediaSettings::Audio(audio) => engine.compress_audio(input_path, output_path, audio).await,
        MediaSettings::Image(image) => engine.compress_image(input_path, output_path, image).await,
    }
}
