//! Error types for the façade
//!
//! Parameter and engine errors are wrapped as they travel up; nothing is
//! swallowed or retried on the way.

use crate::handle::Handle;
use hefacade_engine::{EngineError, EngineId};
use hefacade_params::ParamsError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for façade calls
#[derive(Error, Debug)]
pub enum FacadeError {
    /// Context or key generation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Handle is not in the registry
    #[error("Handle not found: {handle}")]
    HandleNotFound { handle: Handle },

    /// No context and keys yet
    #[error("No context and keys: call generate or restore first")]
    NotReady,

    /// Persisting or restoring state failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Engine rejected an operation
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A thread panicked while holding the session lock
    #[error("Session lock poisoned")]
    Poisoned,
}

/// Result type alias for façade operations
pub type FacadeResult<T> = Result<T, FacadeError>;

/// Failures while turning parameters into a context and keys
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Parameters(#[from] ParamsError),

    #[error("Context or key generation failed: {0}")]
    Engine(#[from] EngineError),
}

/// Failures while writing or reading persisted state
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing {0} line")]
    MissingLine(&'static str),

    #[error("Malformed {line} line: {reason}")]
    Malformed { line: &'static str, reason: String },

    #[error("State was written by the {found} engine, this session uses {expected}")]
    EngineMismatch { expected: EngineId, found: EngineId },

    #[error("Engine rejected persisted state: {0}")]
    Engine(#[from] EngineError),
}

impl PersistenceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(line: &'static str, reason: impl ToString) -> Self {
        Self::Malformed {
            line,
            reason: reason.to_string(),
        }
    }
}
