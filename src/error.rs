//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Validation`: impostazioni non valide, il task non viene mai creato
//! - `DuplicateActiveTask`: esiste già un task attivo per la stessa chiave
//!   (notifica all'utente, nessuna mutazione del registry)
//! - `EngineFailure`: il motore di compressione ha rifiutato il job; il messaggio
//!   viene conservato così com'è nel task
//! - `Io` / `Json`: errori di I/O e serializzazione ai bordi (config, CLI)
//! - `MissingDependency`: tool esterno mancante (ffmpeg, ffprobe)
//!
//! Gli eventi di progresso "stale" (task sconosciuto o già terminato) non sono
//! errori: vengono scartati dal registry e compaiono solo nei log di debug.
//!
//! ## Esempio:
//! ```rust
//! use media_compressor::CompressError;
//!
//! let err = CompressError::DuplicateActiveTask { key: "/a/b.mp4".to_string() };
//! assert!(err.is_user_notice());
//! ```

use crate::settings::ValidationError;

/// Custom error types for job submission and compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Validation(#[from] ValidationError),

    #[error("Already queued: {key} is still being processed")]
    DuplicateActiveTask { key: String },

    #[error("{0}")]
    EngineFailure(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),
}

impl CompressError {
    /// Errors that are shown to the user as a notice rather than a failure
    pub fn is_user_notice(&self) -> bool {
        matches!(self, Self::DuplicateActiveTask { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_message_is_verbatim() {
        let err = CompressError::EngineFailure("ffmpeg error".to_string());
        assert_eq!(err.to_string(), "ffmpeg error");
        assert!(!err.is_user_notice());
    }

    #[test]
    fn test_validation_conversion() {
        let err: CompressError = ValidationError::CrfOutOfRange(70).into();
        assert!(matches!(err, CompressError::Validation(ValidationError::CrfOutOfRange(70))));
        assert_eq!(err.to_string(), "Invalid settings: CRF must be between 0 and 51, got 70");
    }
}
