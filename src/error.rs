//! Error handling module for archdock
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every fallible step returns these types so `main` can map them to exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archdock
#[derive(Error, Debug)]
pub enum ArchDockError {
    /// IO errors (temp directories, reading the environment)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A command could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A command ran and exited unsuccessfully
    #[error("Command failed (exit code {}): {command}", display_code(.code))]
    CommandFailed { command: String, code: Option<i32> },

    /// The package manager lock never cleared within the attempt budget
    #[error("Package manager lock {} still held after {attempts} attempt(s)", .lock_file.display())]
    LockHeld { lock_file: PathBuf, attempts: u32 },

    /// Neither the compose plugin nor the standalone binary answered after install
    #[error("Docker Compose not found: neither `docker compose` nor `docker-compose` is usable")]
    ComposeMissing,

    /// Pre-flight environment checks failed
    #[error("Pre-flight check failed: {0}")]
    Preflight(String),

    /// Invalid runtime configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Result type alias for archdock operations
pub type Result<T> = std::result::Result<T, ArchDockError>;

impl ArchDockError {
    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, code: Option<i32>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            code,
        }
    }

    /// Create a pre-flight error
    pub fn preflight(msg: impl Into<String>) -> Self {
        Self::Preflight(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code for this error.
    ///
    /// A failed command propagates its own status when it is a valid non-zero
    /// exit code; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                code: Some(code @ 1..=255),
                ..
            } => *code,
            _ => 1,
        }
    }

    /// Whether the user has already been shown this failure.
    ///
    /// Pre-flight failures print their own banner before returning, so `main`
    /// must not log them a second time.
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Preflight(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArchDockError::command_failed("pacman -Syu --noconfirm", Some(1));
        assert_eq!(
            err.to_string(),
            "Command failed (exit code 1): pacman -Syu --noconfirm"
        );

        let err = ArchDockError::command_failed("docker run --rm hello-world", None);
        assert!(err.to_string().contains("exit code none"));

        let err = ArchDockError::LockHeld {
            lock_file: PathBuf::from("/var/lib/pacman/db.lck"),
            attempts: 10,
        };
        assert_eq!(
            err.to_string(),
            "Package manager lock /var/lib/pacman/db.lck still held after 10 attempt(s)"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ArchDockError::ComposeMissing.exit_code(), 1);
        assert_eq!(ArchDockError::command_failed("git clone", Some(128)).exit_code(), 128);
        assert_eq!(ArchDockError::command_failed("makepkg", None).exit_code(), 1);
        assert_eq!(ArchDockError::command_failed("weird", Some(-3)).exit_code(), 1);
        assert_eq!(ArchDockError::command_failed("weird", Some(300)).exit_code(), 1);
        assert_eq!(ArchDockError::preflight("not root").exit_code(), 1);
    }

    #[test]
    fn test_only_preflight_is_reported() {
        assert!(ArchDockError::preflight("not running as root").is_reported());
        assert!(!ArchDockError::ComposeMissing.is_reported());
        assert!(!ArchDockError::command_failed("pacman -Syu --noconfirm", Some(1)).is_reported());
        assert!(!ArchDockError::config("max attempts must be at least 1").is_reported());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ArchDockError = io_err.into();
        assert!(matches!(err, ArchDockError::Io(_)));
    }
}
