//! FFmpeg argument construction.
//!
//! Pure functions: the resolved settings go in, the argument vector comes out.

use super::EngineFailure;
use crate::args;
use crate::settings::{AudioSettings, ImageSettings, VideoSettings, VideoStrategy};

/// Arguments shared by every invocation: quiet banner, machine-readable progress on stderr
fn base_args(input_path: &str) -> Vec<String> {
    args!["-hide_banner", "-nostats", "-progress", "pipe:2", "-i", input_path]
}

/// Build the ffmpeg arguments for a video job.
///
/// `target_video_kbps` is required for the target-size strategy; it is derived from
/// the probed duration by the caller.
pub fn video_args(
    input_path: &str,
    output_path: &str,
    settings: &VideoSettings,
    target_video_kbps: Option<u32>,
) -> Result<Vec<String>, EngineFailure> {
    let mut args = base_args(input_path);
    args.extend(args!["-c:v", "libx264"]);

    match &settings.strategy {
        VideoStrategy::Quality { preset, crf } => {
            args.extend(args!["-crf", crf, "-preset", preset.encoder_preset()]);
        }
        VideoStrategy::VariableBitrate { crf } => {
            args.extend(args!["-crf", crf, "-preset", "medium"]);
        }
        VideoStrategy::ConstantBitrate { target_bitrate_kbps } => {
            args.extend(bitrate_args(*target_bitrate_kbps));
        }
        VideoStrategy::Scale { crf, .. } => {
            if let Some(crf) = crf {
                args.extend(args!["-crf", crf]);
            }
            args.extend(args!["-preset", "medium"]);
        }
        VideoStrategy::TargetSize { target_size_mb, crf } => {
            let kbps = target_video_kbps.ok_or_else(|| {
                EngineFailure::new(format!(
                    "Unable to reach a target size of {} MB: video duration unknown",
                    target_size_mb
                ))
            })?;
            // CRF, with the derived bitrate as ceiling
            match crf {
                Some(crf) => args.extend(args![
                    "-crf",
                    crf,
                    "-maxrate",
                    format!("{}k", kbps),
                    "-bufsize",
                    format!("{}k", kbps.saturating_mul(2)),
                ]),
                None => args.extend(bitrate_args(kbps)),
            }
        }
    }

    if let Some(filter) = scale_filter(settings) {
        args.extend(args!["-vf", filter]);
    }

    args.extend(args!["-c:a", "aac", "-b:a", settings.audio_quality.aac_bitrate()]);
    args.extend(args!["-y", output_path]);
    Ok(args)
}

/// Arguments for an audio-only job
pub fn audio_args(input_path: &str, output_path: &str, settings: &AudioSettings) -> Vec<String> {
    let mut args = base_args(input_path);
    args.extend(args!["-vn", "-b:a", settings.quality.aac_bitrate(), "-y", output_path]);
    args
}

/// Arguments for a single image
pub fn image_args(input_path: &str, output_path: &str, settings: &ImageSettings) -> Vec<String> {
    let mut args = base_args(input_path);
    args.extend(args!["-q:v", settings.ffmpeg_qscale(), "-frames:v", 1, "-y", output_path]);
    args
}

fn bitrate_args(kbps: u32) -> Vec<String> {
    args![
        "-b:v",
        format!("{}k", kbps),
        "-maxrate",
        format!("{}k", kbps),
        "-bufsize",
        format!("{}k", kbps.saturating_mul(2)),
    ]
}

/// An explicit resolution wins; otherwise the scale strategy applies its percentage.
/// Dimensions are kept even as x264 requires.
fn scale_filter(settings: &VideoSettings) -> Option<String> {
    if let Some(height) = settings.resolution.height() {
        return Some(format!("scale=-2:{}", height));
    }

    match &settings.strategy {
        VideoStrategy::Scale { scale_percent, .. } => {
            let factor = scale_percent / 100.0;
            Some(format!(
                "scale=trunc(iw*{f}/2)*2:trunc(ih*{f}/2)*2",
                f = factor
            ))
        }
        _ => None,
    }
}
