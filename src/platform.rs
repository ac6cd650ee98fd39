//! # Platform-specific utilities
//!
//! Questo modulo centralizza la risoluzione cross-platform dei binari esterni
//! (ffmpeg, ffprobe) e la verifica della loro presenza nel PATH.

use crate::error::CompressError;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Platform-specific command manager
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    which_command: &'static str,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut commands = HashMap::new();
        let which_command = if cfg!(windows) {
            commands.insert("ffmpeg", "ffmpeg.exe");
            commands.insert("ffprobe", "ffprobe.exe");
            "where"
        } else {
            commands.insert("ffmpeg", "ffmpeg");
            commands.insert("ffprobe", "ffprobe");
            "which"
        };

        Self {
            commands,
            which_command,
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Get the command used to check if a program exists
    pub fn which_command(&self) -> &str {
        self.which_command
    }

    /// Check if a command (base name or explicit path) is available
    pub async fn is_command_available(&self, command: &str) -> bool {
        if std::path::Path::new(command).is_absolute() {
            return tokio::fs::metadata(command).await.map(|m| m.is_file()).unwrap_or(false);
        }

        let command_name = self.get_command(command);
        let result = tokio::process::Command::new(self.which_command)
            .arg(command_name)
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!("Unable to run {} {}: {}", self.which_command, command_name, e);
                false
            }
        }
    }

    /// Fail with `MissingDependency` listing every command that cannot be found
    pub async fn require(&self, commands: &[&str]) -> Result<(), CompressError> {
        let mut missing = Vec::new();
        for command in commands {
            if !self.is_command_available(command).await {
                missing.push(*command);
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CompressError::MissingDependency(missing.join(", ")))
        }
    }
}
