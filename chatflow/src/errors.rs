//! Error types for the chatflow pipeline.
//!
//! Two kinds of failure exist. [`ChatflowError`] aborts a pipeline run and is
//! propagated to the caller. [`TagParseError`] describes malformed tag data;
//! stages never propagate it, they log it and fall back to a documented
//! default instead.

use thiserror::Error;

/// The main error type for chatflow operations.
#[derive(Debug, Error)]
pub enum ChatflowError {
    /// An external collaborator (XP service, display manager, ...) failed.
    #[error("{collaborator} failed: {source}")]
    Collaborator {
        /// Name of the collaborator that failed.
        collaborator: &'static str,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// A stage failed for a reason of its own.
    #[error("Stage '{stage}' failed: {message}")]
    StageExecution {
        /// The stage name.
        stage: String,
        /// Failure description.
        message: String,
    },

    /// Invalid pipeline configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The logging subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl ChatflowError {
    /// Wraps a collaborator failure.
    #[must_use]
    pub fn collaborator(collaborator: &'static str, source: anyhow::Error) -> Self {
        Self::Collaborator {
            collaborator,
            source,
        }
    }

    /// Creates a stage execution error.
    #[must_use]
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageExecution {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error came from an external collaborator.
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::Collaborator { .. })
    }
}

/// Malformed data found in message tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagParseError {
    /// An emote position is not of the form `start-end`.
    #[error("Malformed emote position '{0}'")]
    MalformedPosition(String),

    /// An emote position ends before it starts.
    #[error("Emote position '{0}' ends before it starts")]
    InvertedPosition(String),

    /// A subscriber month count is not a positive integer.
    #[error("Invalid subscriber month count '{0}'")]
    InvalidMonths(String),

    /// A raw IRC tag entry could not be interpreted.
    #[error("Malformed tag '{tag}': {reason}")]
    MalformedTag {
        /// The tag key.
        tag: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Convenience result alias.
pub type Result<T, E = ChatflowError> = std::result::Result<T, E>;
