//! Error types for leproc

use crate::exit_codes::{
    EXIT_CONFIG_ERROR, EXIT_DEPENDENCY_ERROR, EXIT_ERROR, EXIT_EXECUTION_ERROR, EXIT_INVALID_ARGS,
    EXIT_IO_ERROR,
};
use std::fmt;

/// Main error type for launch operations
#[derive(Debug)]
pub enum LaunchError {
    /// Native loader components are absent from the launcher directory
    MissingDependency(Vec<String>),

    /// No target was given on the command line
    Usage,

    /// Target could not be found in the working directory or on the search path
    PathNotFound(String),

    /// Non-executable target with no registered opener for its extension
    AssociationNotFound(String),

    /// Locale name unknown to the locale service
    UnknownLocale(String),

    /// Native loader returned a non-zero result code
    NativeLoaderFailure { code: u32, command_line: String },

    /// Relaunching the launcher with elevated rights failed
    ElevationFailed(String),

    /// Invalid profile or launcher configuration
    Config(String),

    /// IO error
    IoError(std::io::Error),

    /// JSON parsing error
    JsonError(serde_json::Error),

    /// Generic error with message
    Generic(String),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::MissingDependency(names) => {
                write!(f, "Missing native components: {}", names.join(", "))
            }
            LaunchError::Usage => write!(f, "Usage: leproc path [args]"),
            LaunchError::PathNotFound(target) => write!(f, "{target}: No such file or directory"),
            LaunchError::AssociationNotFound(ext) => {
                write!(f, "No program is associated with {ext}")
            }
            LaunchError::UnknownLocale(name) => write!(f, "Unknown locale: {name}"),
            LaunchError::NativeLoaderFailure { code, command_line } => {
                write!(f, "Error Code: {code:X}\r\nCommand: {command_line}")
            }
            LaunchError::ElevationFailed(msg) => write!(f, "Elevation failed: {msg}"),
            LaunchError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LaunchError::IoError(err) => write!(f, "IO error: {err}"),
            LaunchError::JsonError(err) => write!(f, "JSON error: {err}"),
            LaunchError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaunchError::IoError(err) => Some(err),
            LaunchError::JsonError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LaunchError {
    fn from(err: std::io::Error) -> Self {
        LaunchError::IoError(err)
    }
}

impl From<serde_json::Error> for LaunchError {
    fn from(err: serde_json::Error) -> Self {
        LaunchError::JsonError(err)
    }
}

impl LaunchError {
    /// Exit status for a failure that happened before the loader was reached
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::MissingDependency(_) => EXIT_DEPENDENCY_ERROR,
            LaunchError::Usage => EXIT_INVALID_ARGS,
            LaunchError::PathNotFound(_) | LaunchError::IoError(_) => EXIT_IO_ERROR,
            LaunchError::UnknownLocale(_) | LaunchError::Config(_) | LaunchError::JsonError(_) => {
                EXIT_CONFIG_ERROR
            }
            LaunchError::AssociationNotFound(_)
            | LaunchError::NativeLoaderFailure { .. }
            | LaunchError::ElevationFailed(_) => EXIT_EXECUTION_ERROR,
            LaunchError::Generic(_) => EXIT_ERROR,
        }
    }
}

/// Result type for launch operations
pub type Result<T> = std::result::Result<T, LaunchError>;
