//! Error types for Setlist core operations.
//!
//! Each operation family gets its own typed error so the shell can tell a
//! failed load from a rejected publish without string matching. The
//! crate-level [`Error`] wraps them for callers that drive several
//! operations through one code path (the controller, the CLI).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading a playlist source file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The file extension is not a format the loader can read.
    #[error("Unsupported playlist format '{extension}': {path}")]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
        /// Extension as found on the path (may be empty).
        extension: String,
    },

    /// The file was read but its content is not a playlist.
    #[error("Malformed playlist {path}: {reason}")]
    MalformedContent {
        /// Offending path.
        path: PathBuf,
        /// What was wrong with the content.
        reason: String,
    },

    /// The file could not be read.
    #[error("Failed to read playlist {path}: {reason}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },
}

impl LoadError {
    /// Path of the source file that failed to load.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::UnsupportedFormat { path, .. }
            | Self::MalformedContent { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

/// Errors raised by track reordering.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ReorderError {
    /// One of the indices does not address an existing track.
    #[error("Track move {from} -> {to} out of bounds for {len} tracks")]
    OutOfBounds {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
        /// Number of tracks at the time of the move.
        len: usize,
    },
}

/// Errors raised while exporting a session to a file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    /// The output format is reserved but has no writer yet.
    #[error("{format} export not implemented yet")]
    NotImplemented {
        /// Format name, e.g. `txt`.
        format: String,
    },

    /// Unknown output extension and CSV fallback is disabled.
    #[error("Unsupported export format '{extension}'")]
    UnsupportedFormat {
        /// Extension as found on the output path (may be empty).
        extension: String,
    },

    /// There is no loaded playlist to export.
    #[error("No playlist loaded")]
    NoData,

    /// Writing the output failed; nothing was left behind.
    #[error("Failed to write {path}: {reason}")]
    Io {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error message.
        reason: String,
    },
}

/// Errors raised while publishing a session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    /// There is no loaded playlist to publish.
    #[error("No playlist loaded")]
    NoData,

    /// The upload target could not be reached.
    #[error("Publish target {endpoint} unreachable: {reason}")]
    Unreachable {
        /// Endpoint that was contacted.
        endpoint: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The upload target answered but refused the push.
    #[error("Publish rejected: {reason}")]
    Rejected {
        /// Reason reported by the target.
        reason: String,
    },
}

/// Broad category of an [`Error`], for programmatic handling in the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Loading a playlist failed.
    Load,
    /// Reordering tracks failed.
    Reorder,
    /// Exporting a playlist failed.
    Export,
    /// Publishing a playlist failed.
    Publish,
    /// Configuration is invalid or could not be stored.
    Configuration,
    /// Generic I/O failure.
    Io,
    /// JSON (de)serialization failure.
    Serialization,
}

/// Errors that can occur in Setlist core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Loading a playlist failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Reordering tracks failed.
    #[error(transparent)]
    Reorder(#[from] ReorderError),

    /// Exporting a playlist failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Publishing a playlist failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Load(_) => ErrorKind::Load,
            Self::Reorder(_) => ErrorKind::Reorder,
            Self::Export(_) => ErrorKind::Export,
            Self::Publish(_) => ErrorKind::Publish,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the caller may reasonably retry the same operation.
    ///
    /// The core itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Publish(PublishError::Unreachable { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display_includes_path() {
        let err = LoadError::MalformedContent {
            path: PathBuf::from("/music/set.csv"),
            reason: "no track rows".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/music/set.csv"));
        assert!(msg.contains("no track rows"));
    }

    #[test]
    fn test_load_error_path() {
        let err = LoadError::UnsupportedFormat {
            path: PathBuf::from("notes.doc"),
            extension: "doc".to_string(),
        };
        assert_eq!(err.path(), Path::new("notes.doc"));
    }

    #[test]
    fn test_not_implemented_display() {
        let err = ExportError::NotImplemented {
            format: "txt".to_string(),
        };
        assert_eq!(err.to_string(), "txt export not implemented yet");
    }

    #[test]
    fn test_reorder_error_display() {
        let err = ReorderError::OutOfBounds {
            from: 5,
            to: 0,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "Track move 5 -> 0 out of bounds for 3 tracks"
        );
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(Error::from(ExportError::NoData).kind(), ErrorKind::Export);
        assert_eq!(Error::from(PublishError::NoData).kind(), ErrorKind::Publish);
        assert_eq!(
            Error::Configuration("bad".to_string()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_only_unreachable_is_retryable() {
        let unreachable = Error::from(PublishError::Unreachable {
            endpoint: "http://localhost:9".to_string(),
            reason: "connection refused".to_string(),
        });
        let rejected = Error::from(PublishError::Rejected {
            reason: "403 Forbidden".to_string(),
        });
        assert!(unreachable.is_retryable());
        assert!(!rejected.is_retryable());
        assert!(!Error::from(ExportError::NoData).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
