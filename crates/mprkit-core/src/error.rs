//! Error handling for MPRKit
//!
//! Provides the error taxonomy shared by every stage of a post-processing run:
//! - Command errors (one input command unusable, recovered locally)
//! - Artifact errors (content missing or not textual)
//! - Output location errors (no usable target directory)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Errors attached to a single input command.
///
/// These never abort a run. The normalizer records them, skips the command
/// and carries on with the rest of the stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The command names a known kind but lacks the fields that kind needs
    #[error("Malformed command #{index} '{name}': {reason}")]
    Malformed {
        /// Position of the command in the raw input.
        index: usize,
        /// The command word as supplied.
        name: String,
        /// What was missing or invalid.
        reason: String,
    },

    /// The command word is not one the generator understands
    #[error("Unrecognized command #{index} '{name}'")]
    Unrecognized {
        /// Position of the command in the raw input.
        index: usize,
        /// The command word as supplied.
        name: String,
    },
}

impl CommandError {
    /// Create a malformed-command error
    pub fn malformed(index: usize, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            index,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unrecognized-command error
    pub fn unrecognized(index: usize, name: impl Into<String>) -> Self {
        Self::Unrecognized {
            index,
            name: name.into(),
        }
    }

    /// Index of the offending command in the raw input
    pub fn index(&self) -> usize {
        match self {
            Self::Malformed { index, .. } | Self::Unrecognized { index, .. } => *index,
        }
    }
}

/// Main error type for MPRKit
///
/// Per-command problems are wrapped here only when they are reported; the
/// run-level variants (`EmptyContent`, `UnresolvableDirectory`) are fatal.
#[derive(Error, Debug)]
pub enum PostError {
    /// A single command could not be used
    #[error(transparent)]
    Command(#[from] CommandError),

    /// An artifact resolved to no content although there were features to emit
    #[error("Empty {kind} content generated for a non-empty feature list")]
    EmptyContent {
        /// The artifact kind ("mpr", "nc", "report").
        kind: String,
    },

    /// Every directory rule was exhausted without a usable candidate
    #[error("No usable output directory: {reason}")]
    UnresolvableDirectory {
        /// Which candidates were tried and why they were rejected.
        reason: String,
    },

    /// Artifact content was not text and had to be converted
    #[error("Artifact {kind} content is not valid text: {detail}")]
    TypeMismatch {
        /// The artifact kind.
        kind: String,
        /// Description of the conversion applied.
        detail: String,
    },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job description could not be decoded
    #[error("Job decoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl PostError {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        PostError::Other(msg.into())
    }

    /// Whether the error only affects one command and the run may continue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PostError::Command(_) | PostError::TypeMismatch { .. })
    }
}

/// Result type using PostError
pub type Result<T> = std::result::Result<T, PostError>;
