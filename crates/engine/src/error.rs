//! Error types for HE engines

use thiserror::Error;

/// Errors raised by an engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Ring or modulus chain cannot be built
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    /// Plaintext space the engine cannot represent
    #[error("Unsupported plaintext space: {0}")]
    UnsupportedPlaintext(String),

    /// Slot polynomial the engine cannot encode with
    #[error("Unsupported slot polynomial of degree {degree}: {reason}")]
    UnsupportedPolynomial { degree: u64, reason: String },

    #[error("Invalid Hamming weight {weight}: {reason}")]
    InvalidHammingWeight { weight: u64, reason: String },

    /// More values than the encoder has slots
    #[error("{len} values exceed the {slots} available slots")]
    TooManyValues { len: usize, slots: usize },

    /// Operands or keys belong to different contexts
    #[error("Objects belong to different contexts")]
    ContextMismatch,

    /// Ciphertext was encoded under a different slot polynomial
    #[error("Ciphertext was encoded under a different slot polynomial than the current encoder")]
    EncoderMismatch,

    /// Ciphertext was encrypted under a different key
    #[error("Ciphertext was encrypted under a different key")]
    KeyMismatch,

    /// Operation needs key-switching material that was never generated
    #[error("Missing key-switching material for {0}")]
    MissingKeySwitching(&'static str),

    /// Not enough levels left in the modulus chain
    #[error("Modulus chain exhausted: {operation} needs {needed} level(s), {available} left")]
    LevelExhausted {
        operation: &'static str,
        needed: u64,
        available: u64,
    },

    /// Persisted record cannot be decoded
    #[error("Malformed {record} record: {reason}")]
    MalformedRecord { record: &'static str, reason: String },

    /// Errors from fhe.rs
    #[error("FHE library error: {0}")]
    Fhe(#[from] fhe::Error),

    /// Record (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
