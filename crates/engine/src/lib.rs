//! # hefacade-engine
//!
//! The narrow interface between hefacade and a homomorphic-encryption library.
//!
//! [`HeEngine`] covers exactly what the façade needs: context construction,
//! key generation, encoding, the homomorphic algebra and serialization of
//! contexts and secret keys. Two engines implement it:
//!
//! - [`BfvEngine`]: RLWE batching over power-of-two cyclotomics, backed by fhe.rs
//! - [`MockEngine`]: clear slots with level bookkeeping. **NOT SECURE**, for tests

pub mod bfv;
pub mod error;
pub mod mock;
pub mod traits;

pub use bfv::{BfvCiphertext, BfvContext, BfvEncoder, BfvEngine, BfvPublicKey, BfvSecretKey};
pub use error::{EngineError, EngineResult};
pub use mock::{MockCiphertext, MockContext, MockEncoder, MockEngine, MockPublicKey, MockSecretKey};
pub use traits::{EngineId, HeEngine, SlotPolynomial};
