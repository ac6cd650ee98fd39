//! # File Management Module
//!
//! Utilità sui file usate ai bordi del sistema (CLI e motore FFmpeg).
//!
//! ## Responsabilità:
//! - Determinazione del tipo di media dall'estensione
//! - Lettura dimensione file
//! - Formattazione human-readable delle dimensioni
//! - Descrizione della variazione di dimensione dopo la compressione
//!
//! ## Formati supportati:
//! - **Video**: MP4, MOV, AVI, MKV, WMV, FLV, WebM
//! - **Audio**: MP3, WAV, AAC, FLAC, OGG, M4A
//! - **Immagini**: JPG, JPEG, PNG, WebP, BMP, GIF
//!
//! ## Esempio:
//! ```rust
//! use media_compressor::file_manager::FileManager;
//! use media_compressor::settings::MediaKind;
//! use std::path::Path;
//!
//! assert_eq!(FileManager::detect_kind(Path::new("clip.MOV")), Some(MediaKind::Video));
//! assert_eq!(FileManager::format_size(1536), "1.50 KB");
//! ```

use crate::settings::MediaKind;
use std::path::Path;
use tokio::fs;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg", "m4a"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// File helpers
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Media kind from the file extension, case-insensitive
    pub fn detect_kind(path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction (negative when the file grew)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }

    /// "reduced by x%", "increased by x%" or "unchanged"
    pub fn describe_change(original_size: u64, new_size: u64) -> String {
        let reduction = Self::calculate_reduction(original_size, new_size);
        if new_size == original_size || reduction.abs() < 0.005 {
            "unchanged".to_string()
        } else if reduction > 0.0 {
            format!("reduced by {:.2}%", reduction)
        } else {
            format!("increased by {:.2}%", -reduction)
        }
    }
}
