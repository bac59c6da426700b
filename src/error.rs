//! # Error Types
//!
//! This module defines error types used throughout the brasa library.
//!
//! All failures are synchronous and surface at the offending call. A failed
//! physical write is fatal for that call: the serial link has no
//! acknowledgment protocol, so there is nothing to justify automatic retry.

use thiserror::Error;

use crate::protocol::TextEncoding;

/// Main error type for brasa operations
#[derive(Debug, Error)]
pub enum BrasaError {
    /// A command name with no entry in the wire-command table
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Wrong number of arguments for a fixed-arity command
    #[error("invalid argument count for {command}: expected {expected}, got {got}")]
    InvalidArgumentCount {
        command: String,
        expected: usize,
        got: usize,
    },

    /// A command argument that does not fit in a single unsigned byte
    #[error("value {0} does not fit in a single byte (0-255)")]
    ValueOutOfRange(u16),

    /// A calibration or register value outside its closed, stepped range
    #[error("{field} not in range: {value}; must be {low} <= {field} < {high} in steps of {step}")]
    Range {
        field: &'static str,
        value: u32,
        low: u32,
        high: u32,
        step: u32,
    },

    /// Bitmap byte count is not a multiple of the row width
    #[error("bad image format: {len} bytes is not a multiple of row width {row_width}")]
    BadImageFormat { len: usize, row_width: usize },

    /// A character the selected text encoding cannot represent
    #[error("character '{ch}' (U+{code:04X}) is not representable in {encoding:?}")]
    Encoding {
        ch: char,
        code: u32,
        encoding: TextEncoding,
    },

    /// Malformed payload shape (custom character dimensions, QR input, ...)
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Image decoding or processing failure
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Underlying device I/O failure
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level errors (device setup, unsupported baud rate)
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration file could not be parsed
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
