//! Error types for taskkit
//!
//! This module provides the error handling for the library:
//! - A single crate-wide [`Error`] with one variant per failure class
//!   (configuration, hook, stream, persistence, worker)
//! - A [`WorkerError`] sub-enum for the isolated worker boundary
//! - Contextual fields (output name, filename, path) to help diagnose issues
//!
//! Skipping a task (no items, or `enabled: false`) is not an error, and neither
//! are empty writes or size threshold overages; those are reported through the
//! logger only.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for taskkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for taskkit
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which option is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The option key that caused the error (e.g., "items")
        key: Option<String>,
    },

    /// A process hook failed for one item
    #[error("processing `{output}` failed: {message}")]
    Hook {
        /// The output name of the item whose hook failed
        output: String,
        /// The reason the hook failed
        message: String,
        /// The error the hook returned, when it was not already a hook failure
        #[source]
        cause: Option<Box<Error>>,
    },

    /// A content byte stream failed while it was being drained
    #[error("stream error while writing {filename}: {source}")]
    Stream {
        /// The logical filename being written
        filename: String,
        /// The underlying read error
        #[source]
        source: std::io::Error,
    },

    /// Creating the destination directory or persisting the file failed
    #[error("failed to persist {path}: {source}")]
    Persistence {
        /// The destination path (file or directory) that could not be written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Isolated worker failed or its message channel broke
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error for a specific option key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Build a hook failure for the item with the given output name
    pub fn hook(output: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Hook {
            output: output.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// Attribute an error returned by a process hook to its item
    ///
    /// Hook failures pass through unchanged; anything else is wrapped, keeping
    /// the original error as the source.
    pub fn hook_from(output: impl Into<String>, cause: Error) -> Self {
        match cause {
            Error::Hook { .. } => cause,
            other => Error::Hook {
                output: output.into(),
                message: other.to_string(),
                cause: Some(Box::new(other)),
            },
        }
    }

    /// Whether this error was raised by a process hook
    pub fn is_hook_failure(&self) -> bool {
        matches!(self, Error::Hook { .. })
    }
}

/// Isolated worker errors (spawn, channel, protocol, remote failure)
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread or process could not be started
    #[error("failed to spawn worker for task {task}: {reason}")]
    Spawn {
        /// The task the worker was bound to
        task: String,
        /// The reason spawning failed
        reason: String,
    },

    /// The worker went away without sending its completion message
    #[error("worker for task {task} exited without a reply")]
    ChannelClosed {
        /// The task the worker was bound to
        task: String,
    },

    /// A message on the worker channel could not be understood
    #[error("malformed worker message: {0}")]
    Protocol(String),

    /// The worker ran the task and reported a failure
    #[error("task {task} failed in worker: {message}")]
    Failed {
        /// The task the worker was bound to
        task: String,
        /// The error message reported by the worker
        message: String,
    },

    /// No task with this name is registered on the worker side
    #[error("no task registered under name {0}")]
    UnknownTask(String),
}
