//! Error types for the reader.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a [`MailFolder`](crate::MailFolder) implementation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection to the server failed or was lost.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The folder must be open for this operation.
    #[error("Folder is not open: {0}")]
    FolderNotOpen(String),

    /// The server rejected the operation.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Any other transport or protocol failure.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur while configuring or running a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value was rejected.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the rejected parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The mailbox session failed.
    #[error("Mailbox session error: {0}")]
    Session(#[from] SessionError),

    /// Destination directory does not exist and was not to be created.
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O error while persisting messages or reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration values are inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Returns true if this is [`Error::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A multi-item retrieval that stopped early.
///
/// Items retrieved before the failure are not rolled back; they are handed
/// back together with the error that ended the batch.
#[derive(Debug, Error)]
#[error("Retrieval interrupted after {} item(s): {error}", .fetched.len())]
pub struct Interrupted<T: std::fmt::Debug> {
    /// Items retrieved before the interruption, in delivery order.
    pub fetched: Vec<T>,
    /// Cause of the interruption.
    #[source]
    pub error: Error,
}

impl<T: std::fmt::Debug> Interrupted<T> {
    /// Creates an interruption with no items retrieved.
    #[must_use]
    pub const fn new(error: Error) -> Self {
        Self {
            fetched: Vec::new(),
            error,
        }
    }

    /// Creates an interruption carrying partial results.
    #[must_use]
    pub const fn with_fetched(fetched: Vec<T>, error: Error) -> Self {
        Self { fetched, error }
    }

    /// Returns true if the batch ended because of cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.error.is_cancelled()
    }

    /// Splits into partial results and cause.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Error) {
        (self.fetched, self.error)
    }
}

impl<T: std::fmt::Debug> From<Error> for Interrupted<T> {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}
