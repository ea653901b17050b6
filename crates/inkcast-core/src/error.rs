//! Error types for the annotation pipeline.
//!
//! None of these are fatal. Callers log them and carry on with the next
//! point, message or send.

use thiserror::Error;

/// Failure to map a position through a camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The camera has a zero-extent viewport (not initialised yet).
    #[error("camera not ready: viewport has zero extent")]
    CameraNotReady,
    /// The input position has a NaN or infinite coordinate.
    #[error("position is not finite")]
    NonFinite,
}

/// Malformed or truncated wire payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload has neither a `clear` nor a `points` key")]
    UnknownKind,
    #[error("clear directive must carry `\"clear\": true`")]
    InvalidClear,
    #[error("stroke has no points")]
    EmptyStroke,
    #[error("{field} = {value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no channel available")]
    ChannelUnavailable,
    #[error("already connected")]
    AlreadyConnected,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("send failed: {0}")]
    Send(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Palette selection errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("color index {index} out of range (palette has {len} colors)")]
    OutOfRange { index: usize, len: usize },
}
