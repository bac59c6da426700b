//! # Printer Configuration
//!
//! Hardware constants of the supported control board plus the JSON config
//! file written by `brasa calibrate` and consumed at startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BrasaError;
use crate::transport::serial::{DEFAULT_BAUDRATE, DEFAULT_DEVICE};

/// Characters per text line at the built-in font size
pub const CHARS_PER_LINE: u8 = 32;

/// Print head width in dots
pub const DOTS_PER_LINE: u16 = 384;

/// Maximum bitmap row width in bytes (`DOTS_PER_LINE / 8`)
pub const MAX_ROW_BYTES: u8 = 48;

/// Per-device calibration settings.
///
/// Serialized as the JSON object
/// `{dev, baudrate, max_dots, heat_time, interval}`; the heat values are in
/// physical units (dots, microseconds) and are range-checked when applied,
/// not when loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// Serial device path
    pub dev: String,
    pub baudrate: u32,
    /// Maximum dots heated per pass
    pub max_dots: u32,
    /// Heating time per pass, microseconds
    pub heat_time: u32,
    /// Pause between passes, microseconds
    pub interval: u32,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            dev: DEFAULT_DEVICE.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            max_dots: 64,
            heat_time: 800,
            interval: 20,
        }
    }
}

impl PrinterConfig {
    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BrasaError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Serialize for display or writing back to disk.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("config serialization cannot fail")
    }
}
