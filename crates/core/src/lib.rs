//! # hefacade
//!
//! A handle-based façade over homomorphic-encryption engines.
//!
//! Callers hand in heuristic [`SecurityParameters`], get back opaque
//! [`Handle`]s for encrypted slot vectors and drive every homomorphic
//! operation by handle. The façade owns all ciphertexts; operations mutate
//! the ciphertext under their first handle in place.
//!
//! ```no_run
//! use hefacade::{MockEngine, SecurityParameters, Session};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(MockEngine);
//! session.generate(&SecurityParameters::builder().set_plaintext_modulus(65537).build()?)?;
//! let a = session.encrypt(&[1, 2, 3])?;
//! let b = session.encrypt(&[4, 5, 6])?;
//! session.multiply(&a, &b)?;
//! assert_eq!(&session.decrypt(&a)?[..3], &[4, 10, 18]);
//! # Ok(())
//! # }
//! ```
//!
//! [`Session`] is the thread-safe entry point. [`KeyManager`],
//! [`CiphertextRegistry`] and [`Evaluator`] are its building blocks and can
//! be used directly from single-threaded code.

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod handle;
pub mod keys;
pub mod manager;
pub mod persist;
pub mod registry;
pub mod session;

pub use environment::Environment;
pub use error::{ConfigError, FacadeError, FacadeResult, PersistenceError};
pub use evaluator::Evaluator;
pub use handle::{Handle, HandleGenerator};
pub use keys::{Decryptor, Encryptor, KeyPair};
pub use manager::KeyManager;
pub use registry::CiphertextRegistry;
pub use session::Session;

pub use hefacade_engine::{
    self as engine, BfvEngine, EngineError, EngineId, HeEngine, MockEngine, SlotPolynomial,
};
pub use hefacade_params::{
    self as params, ChainLengthEstimator, HeuristicChainLength, ResolvedParameters,
    SecurityParameters, SecurityParametersBuilder,
};
