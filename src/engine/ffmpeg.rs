//! # FFmpeg Engine
//!
//! Implementazione di `CompressionEngine` basata sul binario `ffmpeg`.
//!
//! ## Pipeline:
//! 1. Verifica che il file di input esista e ne legge la dimensione
//! 2. Per la strategia target-size analizza la durata con ffprobe e ricava il bitrate
//! 3. Avvia ffmpeg con `-progress pipe:2` e legge stderr riga per riga:
//!    `Duration:` fissa la durata totale, `time=` produce eventi di progresso
//! 4. Al termine pubblica un ultimo evento a 100 e restituisce un messaggio con la
//!    dimensione finale e la variazione rispetto all'input
//!
//! In caso di errore il messaggio è `FFmpeg command failed: <stderr>`, con le ultime
//! righe di diagnostica di ffmpeg.

use super::args::{audio_args, image_args, video_args};
use super::probe::VideoInfo;
use super::{CompressionEngine, EngineFailure};
use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::FileManager;
use crate::orchestrator::path_resolver::PathResolver;
use crate::orchestrator::progress_bridge::ProgressSender;
use crate::platform::PlatformCommands;
use crate::settings::{AudioSettings, ImageSettings, VideoSettings, VideoStrategy};
use async_trait::async_trait;
use regex::Regex;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Diagnostic lines of stderr kept for the failure message
const STDERR_TAIL_LINES: usize = 40;

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid duration regex")
    })
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid time regex")
    })
}

/// `key=value` lines written by `-progress`
fn progress_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z_0-9]+=\S*$").expect("valid progress key regex"))
}

fn timestamp_seconds(caps: &regex::Captures<'_>) -> Option<f64> {
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Turns ffmpeg stderr lines into percentages
#[derive(Debug, Default)]
pub struct ProgressParser {
    duration: Option<f64>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Feed one line; returns a percentage capped at 100 once the duration is known
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        if self.duration.is_none() {
            if let Some(caps) = duration_regex().captures(line) {
                self.duration = timestamp_seconds(&caps).filter(|d| *d > 0.0);
                return None;
            }
        }

        let duration = self.duration?;
        let caps = time_regex().captures(line)?;
        let elapsed = timestamp_seconds(&caps)?;
        Some((elapsed / duration * 100.0).clamp(0.0, 100.0))
    }
}

/// Compression engine that shells out to ffmpeg
pub struct FfmpegEngine {
    ffmpeg: String,
    ffprobe: String,
    progress: ProgressSender,
}

impl FfmpegEngine {
    pub fn new(config: &Config, progress: ProgressSender) -> Self {
        Self::with_commands(config.ffmpeg_command(), config.ffprobe_command(), progress)
    }

    pub fn with_commands(
        ffmpeg: impl Into<String>,
        ffprobe: impl Into<String>,
        progress: ProgressSender,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            progress,
        }
    }

    /// Check that ffmpeg and ffprobe can be found
    pub async fn check_dependencies(&self) -> Result<(), CompressError> {
        PlatformCommands::instance()
            .require(&[self.ffmpeg.as_str(), self.ffprobe.as_str()])
            .await
    }

    async fn input_size(input_path: &str) -> Result<u64, EngineFailure> {
        FileManager::file_size(Path::new(input_path))
            .await
            .map_err(|e| EngineFailure::new(format!("Input file not found: {} ({})", input_path, e)))
    }

    async fn run(
        &self,
        input_path: &str,
        output_path: &str,
        input_size: u64,
        args: Vec<String>,
    ) -> Result<String, EngineFailure> {
        PathResolver::ensure_parent_dirs(Path::new(output_path))
            .await
            .map_err(|e| EngineFailure::new(format!("Failed to create output directory: {}", e)))?;

        debug!("{} {}", self.ffmpeg, args.join(" "));
        let start_time = Instant::now();

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineFailure::new(format!("Failed to execute {}: {}", self.ffmpeg, e)))?;

        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut parser = ProgressParser::new();
        let mut last_emitted: Option<f64> = None;

        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Error reading ffmpeg output for {}: {}", input_path, e);
                        break;
                    }
                };

                if let Some(progress) = parser.feed(&line) {
                    if last_emitted.map_or(true, |last| (progress - last).abs() >= 0.1) {
                        self.progress.emit(input_path, progress).await;
                        last_emitted = Some(progress);
                    }
                }

                let line = line.trim();
                if !line.is_empty() && !progress_key_regex().is_match(line) {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_string());
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineFailure::new(format!("Failed to wait for {}: {}", self.ffmpeg, e)))?;

        if !status.success() {
            let stderr = Vec::from(tail).join("\n");
            warn!(
                "FFmpeg failed after {:.1}s for {} ({})",
                start_time.elapsed().as_secs_f64(),
                input_path,
                status
            );
            return Err(EngineFailure::new(format!("FFmpeg command failed: {}", stderr)));
        }

        self.progress.emit(input_path, 100.0).await;

        let output_size = FileManager::file_size(Path::new(output_path)).await.map_err(|e| {
            EngineFailure::new(format!("Output file missing after compression: {} ({})", output_path, e))
        })?;

        info!(
            "Compressed {} in {:.1}s",
            input_path,
            start_time.elapsed().as_secs_f64()
        );
        Ok(success_message(output_path, input_size, output_size))
    }
}

/// Message returned on success: output size plus the change relative to the input
pub fn success_message(output_path: &str, input_size: u64, output_size: u64) -> String {
    format!(
        "Saved {} ({}, {})",
        output_path,
        FileManager::format_size(output_size),
        FileManager::describe_change(input_size, output_size)
    )
}

#[async_trait]
impl CompressionEngine for FfmpegEngine {
    async fn compress_video(
        &self,
        input_path: &str,
        output_path: &str,
        settings: &VideoSettings,
    ) -> Result<String, EngineFailure> {
        let input_size = Self::input_size(input_path).await?;

        let target_video_kbps = match settings.strategy {
            VideoStrategy::TargetSize { target_size_mb, .. } => {
                let info = VideoInfo::probe(&self.ffprobe, input_path).await?;
                info.target_video_bitrate_kbps(target_size_mb, settings.audio_quality.aac_kbps())
            }
            _ => None,
        };

        let args = video_args(input_path, output_path, settings, target_video_kbps)?;
        self.run(input_path, output_path, input_size, args).await
    }

    async fn compress_audio(
        &self,
        input_path: &str,
        output_path: &str,
        settings: &AudioSettings,
    ) -> Result<String, EngineFailure> {
        let input_size = Self::input_size(input_path).await?;
        let args = audio_args(input_path, output_path, settings);
        self.run(input_path, output_path, input_size, args).await
    }

    async fn compress_image(
        &self,
        input_path: &str,
        output_path: &str,
        settings: &ImageSettings,
    ) -> Result<String, EngineFailure> {
        let input_size = Self::input_size(input_path).await?;
        let args = image_args(input_path, output_path, settings);
        self.run(input_path, output_path, input_size, args).await
    }
}
