//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di output quando l'utente non ne indica uno:
//! il file compresso viene scritto accanto all'input, con un suffisso sul nome.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// `<stem><suffix>.<ext>` next to the input, or `<name><suffix>` without an extension
    pub fn derive_output_path(input_path: &Path, suffix: &str) -> PathBuf {
        let file_name = match (input_path.file_stem(), input_path.extension()) {
            (Some(stem), Some(ext)) => format!(
                "{}{}.{}",
                stem.to_string_lossy(),
                suffix,
                ext.to_string_lossy()
            ),
            (Some(stem), None) => format!("{}{}", stem.to_string_lossy(), suffix),
            (None, _) => format!("output{}", suffix),
        };

        let result = input_path.with_file_name(file_name);
        debug!("Resolved output path: {} -> {}", input_path.display(), result.display());
        result
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> std::io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_with_extension() {
        let out = PathResolver::derive_output_path(Path::new("/media/clip.mov"), "_compressed");
        assert_eq!(out, PathBuf::from("/media/clip_compressed.mov"));
    }

    #[test]
    fn test_derive_keeps_inner_dots() {
        let out = PathResolver::derive_output_path(Path::new("/media/my.holiday.mp4"), "_c");
        assert_eq!(out, PathBuf::from("/media/my.holiday_c.mp4"));
    }

    #[test]
    fn test_derive_without_extension() {
        let out = PathResolver::derive_output_path(Path::new("/media/recording"), "_compressed");
        assert_eq!(out, PathBuf::from("/media/recording_compressed"));
    }

    #[tokio::test]
    async fn test_ensure_parent_dirs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("nested/deeper/out.mp4");
        PathResolver::ensure_parent_dirs(&target).await.unwrap();
        assert!(target.parent().unwrap().is_dir());
        PathResolver::ensure_parent_dirs(Path::new("relative.mp4")).await.unwrap();
    }
}
