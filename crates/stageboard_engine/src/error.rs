use std::io;

use thiserror::Error;

/// Failures surfaced to the invocation caller. Recoverable file conditions
/// (missing snapshot, unreadable index) never show up here; they degrade to
/// "no data" inside the engine.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("input payload failed validation: {0}")]
    InvalidPayload(String),
    #[error("display toolkit unavailable: {0}")]
    Toolkit(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
