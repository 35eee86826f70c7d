//! Error types for parameter handling
//!
//! Every failure here happens before a context exists, so callers treat all of
//! them as configuration errors.

use crate::ring::RingQuery;
use thiserror::Error;

/// Errors raised while validating, loading or deriving parameters
#[derive(Error, Debug)]
pub enum ParamsError {
    /// A field violates its invariant
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// No cyclotomic index satisfies the query
    #[error("No cyclotomic index satisfies {query}: {reason}")]
    NoCyclotomicIndex { query: RingQuery, reason: String },

    /// Named preset does not exist
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// I/O errors for configuration files
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Result type alias for parameter operations
pub type ParamsResult<T> = Result<T, ParamsError>;

impl ParamsError {
    /// Create an invalid-parameter error
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create a failed-search error
    pub fn no_index(query: &RingQuery, reason: impl Into<String>) -> Self {
        Self::NoCyclotomicIndex {
            query: query.clone(),
            reason: reason.into(),
        }
    }
}
