//! Configuration error types for loading and parsing TOML config files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("Invalid configuration at {path}:{line}:{column}: {message}")]
    ParseError {
        /// Path to the file containing the error.
        path: PathBuf,
        /// One-based line index of the error (0 if unknown).
        line: usize,
        /// One-based column index of the error (0 if unknown).
        column: usize,
        /// Human-readable description of the parse failure.
        message: String,
    },

    /// A value parsed as TOML but is not usable.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Dotted key of the offending field, e.g. `daemon.poll_interval`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound {
        /// Path that was requested but does not exist.
        path: PathBuf,
    },

    /// A configuration file already exists at the target path.
    #[error("Configuration file already exists: {path}")]
    AlreadyExists {
        /// Path where the file already exists.
        path: PathBuf,
    },

    /// Failed to write a configuration file to disk.
    #[error("Failed to write configuration file: {path}")]
    WriteError {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_read_error() {
        let err = ConfigError::ReadError {
            path: PathBuf::from("/etc/varwatch/config.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/varwatch/config.toml"));
        assert!(msg.contains("Failed to read"));
    }

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("config.toml"),
            line: 5,
            column: 12,
            message: "expected `=`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("5:12"), "ParseError should show line:column");
        assert!(msg.contains("expected `=`"));
    }

    #[test]
    fn display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "daemon.poll_interval".to_string(),
            message: "expected a duration".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for daemon.poll_interval: expected a duration"
        );
    }

    #[test]
    fn display_not_found_and_already_exists() {
        let path = PathBuf::from("/tmp/vw.toml");
        assert!(ConfigError::NotFound { path: path.clone() }
            .to_string()
            .contains("/tmp/vw.toml"));
        assert!(ConfigError::AlreadyExists { path }
            .to_string()
            .contains("already exists"));
    }

    #[test]
    fn source_is_preserved_for_io_variants() {
        use std::error::Error;
        let err = ConfigError::WriteError {
            path: PathBuf::from("x"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(err.source().is_some());
    }
}
