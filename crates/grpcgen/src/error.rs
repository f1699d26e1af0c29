//! Error types for the code-generation driver.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Errors that can occur while generating bindings.
///
/// A generator that runs and exits non-zero is not an error at this level;
/// it is reported through [`crate::InvocationResult`]. Only the lifecycle hook
/// turns it into [`GenerateError::HookFailed`].
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The search root does not exist or cannot be canonicalized.
    #[error("Proto search root {path} not found: {source}")]
    Discovery {
        /// Configured search root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The search root exists but is not a directory.
    #[error("Proto search root is not a directory: {path}")]
    NotADirectory {
        /// Resolved search root.
        path: PathBuf,
    },

    /// A directory could not be read while enumerating sources.
    #[error("Failed to scan {path}: {source}")]
    Walk {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// An output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    Planning {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An output option resolved to an empty path.
    #[error("Output path for {kind} is empty")]
    EmptyOutput {
        /// Output flag name (e.g. `python_out`).
        kind: &'static str,
    },

    /// The generator process could not be started.
    #[error("Failed to start generator {program}: {source}")]
    Spawn {
        /// Program that was executed.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration mapping was rejected.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Generation failed while running as a lifecycle hook.
    #[error("Error: {event} hook failed, generator exited with code {code}")]
    HookFailed {
        /// Name of the lifecycle event.
        event: &'static str,
        /// Exit code reported by the generator.
        code: i32,
    },

    /// A command was requested that no plugin registered.
    #[error("Unknown command: {name}")]
    UnknownCommand {
        /// Requested command name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_failed_display() {
        let err = GenerateError::HookFailed {
            event: "post-update",
            code: 1,
        };
        assert_eq!(
            err.to_string(),
            "Error: post-update hook failed, generator exited with code 1"
        );
    }

    #[test]
    fn test_empty_output_display() {
        let err = GenerateError::EmptyOutput { kind: "mypy_out" };
        assert_eq!(err.to_string(), "Output path for mypy_out is empty");
    }

    #[test]
    fn test_discovery_display_names_path() {
        let err = GenerateError::Discovery {
            path: PathBuf::from("protos"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("protos"));
    }
}
