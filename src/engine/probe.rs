//! Media analysis with ffprobe.

use super::EngineFailure;
use tokio::process::Command;
use tracing::debug;

/// Video file information
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub duration: f64,
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

impl VideoInfo {
    /// Run ffprobe on `video_path`
    pub async fn probe(ffprobe_cmd: &str, video_path: &str) -> Result<Self, EngineFailure> {
        let output = Command::new(ffprobe_cmd)
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_format",
                "-show_streams",
                video_path,
            ])
            .output()
            .await
            .map_err(|e| EngineFailure::new(format!("Failed to execute {}: {}", ffprobe_cmd, e)))?;

        if !output.status.success() {
            return Err(EngineFailure::new(format!(
                "ffprobe failed for {}: {}",
                video_path,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let info = Self::from_json(&String::from_utf8_lossy(&output.stdout))?;
        debug!(
            "Probed {}: {:.2}s, {}x{}, {} ({} bps)",
            video_path, info.duration, info.width, info.height, info.codec, info.bitrate
        );
        Ok(info)
    }

    /// Parse the JSON document printed by `ffprobe -print_format json`
    pub fn from_json(raw: &str) -> Result<Self, EngineFailure> {
        let info: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| EngineFailure::new(format!("Invalid ffprobe output: {}", e)))?;

        let format = &info["format"];
        let duration = format["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let bitrate = format["bit_rate"]
            .as_str()
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0);

        let video_stream = info["streams"]
            .as_array()
            .and_then(|streams| streams.iter().find(|s| s["codec_type"] == "video"))
            .unwrap_or(&serde_json::Value::Null);

        Ok(Self {
            duration,
            bitrate,
            width: video_stream["width"].as_u64().unwrap_or(0) as u32,
            height: video_stream["height"].as_u64().unwrap_or(0) as u32,
            codec: video_stream["codec_name"].as_str().unwrap_or("unknown").to_string(),
        })
    }

    /// Video bitrate that lands the output near `target_size_mb`, leaving room for audio.
    ///
    /// `None` when the duration is unknown or the budget is used up by the audio track.
    pub fn target_video_bitrate_kbps(&self, target_size_mb: f64, audio_kbps: u32) -> Option<u32> {
        if !(self.duration > 0.0) || !(target_size_mb > 0.0) {
            return None;
        }

        let total_kbps = target_size_mb * 8.0 * 1024.0 / self.duration;
        let video_kbps = total_kbps - audio_kbps as f64;
        if video_kbps < 1.0 {
            return None;
        }
        Some(video_kbps.floor() as u32)
    }
}
