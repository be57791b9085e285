//! # Error Types
//!
//! Custom error types for Teleop Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Teleop Bridge
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Configuration errors (TOML parsing and validation)
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Binding table errors (unknown action, conflicting physical input)
    #[error("Binding error: {0}")]
    Binding(String),

    /// Gamepad device errors (scan, open, read)
    #[error("Gamepad error: {0}")]
    Gamepad(String),

    /// No gamepad device found on the system
    #[error("No gamepad device found")]
    GamepadNotFound,

    /// Arm driver communication errors
    #[error("Arm driver error: {0}")]
    Driver(String),

    /// Audio playback errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Teleop Bridge
pub type Result<T> = std::result::Result<T, TeleopError>;
