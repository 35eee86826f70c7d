//! The HE engine interface

use crate::error::{EngineError, EngineResult};
use hefacade_params::{ContextBase, CyclotomicSearch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Identifies which engine produced a persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineId {
    /// RLWE/BFV through fhe.rs
    #[serde(rename = "bfv")]
    Bfv,
    /// Clear-slot engine for testing
    #[serde(rename = "mock")]
    Mock,
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineId::Bfv => write!(f, "bfv"),
            EngineId::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for EngineId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bfv" | "fhe.rs" => Ok(EngineId::Bfv),
            "mock" | "test" => Ok(EngineId::Mock),
            other => Err(EngineError::InvalidContext(format!("Unknown engine: {other}"))),
        }
    }
}

/// Polynomial defining the slot field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotPolynomial {
    /// The ring's own factorization, giving slots of degree `ord_m(p)`
    Intrinsic,
    /// An explicit irreducible polynomial of the given degree
    Irreducible { degree: u64 },
}

impl SlotPolynomial {
    /// `Intrinsic` for `d == 0`, otherwise an explicit degree-`d` polynomial
    pub fn from_field_degree(d: u64) -> Self {
        match d {
            0 => SlotPolynomial::Intrinsic,
            degree => SlotPolynomial::Irreducible { degree },
        }
    }

    pub fn degree(&self) -> Option<u64> {
        match self {
            SlotPolynomial::Intrinsic => None,
            SlotPolynomial::Irreducible { degree } => Some(*degree),
        }
    }
}

/// Operations the façade needs from a homomorphic-encryption library.
///
/// Contexts are shared behind `Arc`; secret keys own their public view, which
/// [`HeEngine::public_key`] hands out. Every algebraic operation mutates its
/// first ciphertext in place.
pub trait HeEngine: CyclotomicSearch + Send + Sync + 'static {
    type Context: Send + Sync;
    type SecretKey: Send + Sync;
    type PublicKey: Send + Sync;
    type Encoder: Send + Sync;
    type Ciphertext: Clone + fmt::Debug + Send + Sync;

    fn id(&self) -> EngineId;

    fn name(&self) -> &'static str;

    /// Build a context and its modulus chain from the ring descriptor
    fn build_context(
        &self,
        base: &ContextBase,
        chain_length: u64,
        columns: u64,
    ) -> EngineResult<Self::Context>;

    fn context_base(&self, context: &Self::Context) -> ContextBase;

    /// Number of levels in the context's modulus chain
    fn chain_length(&self, context: &Self::Context) -> u64;

    /// Sample a secret key with the requested Hamming weight
    fn generate_secret_key(
        &self,
        context: &Arc<Self::Context>,
        hamming_weight: u64,
    ) -> EngineResult<Self::SecretKey>;

    /// Add relinearization and rotation material to a secret key
    fn add_key_switching(&self, secret_key: &mut Self::SecretKey) -> EngineResult<()>;

    /// Public view of a secret key
    fn public_key(&self, secret_key: &Self::SecretKey) -> Self::PublicKey;

    fn build_encoder(
        &self,
        context: &Arc<Self::Context>,
        polynomial: SlotPolynomial,
    ) -> EngineResult<Self::Encoder>;

    fn slot_count(&self, encoder: &Self::Encoder) -> usize;

    /// Encode and encrypt. Values are reduced into the plaintext space and
    /// zero-padded to the slot count.
    fn encrypt(
        &self,
        encoder: &Self::Encoder,
        public_key: &Self::PublicKey,
        values: &[i64],
    ) -> EngineResult<Self::Ciphertext>;

    /// Decrypt and decode all slots
    fn decrypt(
        &self,
        encoder: &Self::Encoder,
        secret_key: &Self::SecretKey,
        ciphertext: &Self::Ciphertext,
    ) -> EngineResult<Vec<i64>>;

    /// `ct += other`, or `ct -= other` when `negate` is set
    fn add(
        &self,
        ct: &mut Self::Ciphertext,
        other: &Self::Ciphertext,
        negate: bool,
    ) -> EngineResult<()>;

    /// `ct *= other`, relinearized
    fn multiply(
        &self,
        public_key: &Self::PublicKey,
        ct: &mut Self::Ciphertext,
        other: &Self::Ciphertext,
    ) -> EngineResult<()>;

    /// `ct *= first * second`
    fn multiply_by_two(
        &self,
        public_key: &Self::PublicKey,
        ct: &mut Self::Ciphertext,
        first: &Self::Ciphertext,
        second: &Self::Ciphertext,
    ) -> EngineResult<()> {
        self.multiply(public_key, ct, first)?;
        self.multiply(public_key, ct, second)
    }

    fn square(&self, public_key: &Self::PublicKey, ct: &mut Self::Ciphertext) -> EngineResult<()>;

    fn cube(&self, public_key: &Self::PublicKey, ct: &mut Self::Ciphertext) -> EngineResult<()>;

    fn negate(&self, ct: &mut Self::Ciphertext) -> EngineResult<()>;

    /// Structural equality; with `compare_keys` the encrypting keys must match too
    fn equals(&self, ct: &Self::Ciphertext, other: &Self::Ciphertext, compare_keys: bool) -> bool;

    /// Replace every slot with the sum of all slots
    fn total_sums(
        &self,
        encoder: &Self::Encoder,
        public_key: &Self::PublicKey,
        ct: &mut Self::Ciphertext,
    ) -> EngineResult<()>;

    /// Cyclic rotation; positive amounts move values towards higher slot indices
    fn rotate(
        &self,
        encoder: &Self::Encoder,
        public_key: &Self::PublicKey,
        ct: &mut Self::Ciphertext,
        amount: i64,
    ) -> EngineResult<()>;

    /// Non-cyclic shift with zero fill; positive amounts move values towards
    /// higher slot indices
    fn shift(
        &self,
        encoder: &Self::Encoder,
        public_key: &Self::PublicKey,
        ct: &mut Self::Ciphertext,
        amount: i64,
    ) -> EngineResult<()>;

    /// Engine-native context record
    fn write_context(&self, context: &Self::Context) -> EngineResult<Vec<u8>>;

    fn read_context(&self, base: &ContextBase, bytes: &[u8]) -> EngineResult<Self::Context>;

    /// Engine-native secret-key record
    fn write_secret_key(&self, secret_key: &Self::SecretKey) -> EngineResult<Zeroizing<Vec<u8>>>;

    fn read_secret_key(
        &self,
        context: &Arc<Self::Context>,
        bytes: &[u8],
    ) -> EngineResult<Self::SecretKey>;
}

/// Left-rotation amount equivalent to moving values `amount` slots towards
/// higher indices in a vector of `len` slots.
pub(crate) fn left_rotation(amount: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let right = amount.rem_euclid(len as i64) as usize;
    (len - right) % len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_id_round_trip() {
        for id in [EngineId::Bfv, EngineId::Mock] {
            assert_eq!(id.to_string().parse::<EngineId>().unwrap(), id);
        }
        assert!("openfhe".parse::<EngineId>().is_err());
        assert_eq!(serde_json::to_string(&EngineId::Bfv).unwrap(), "\"bfv\"");
    }

    #[test]
    fn test_slot_polynomial_from_degree() {
        assert_eq!(SlotPolynomial::from_field_degree(0), SlotPolynomial::Intrinsic);
        assert_eq!(
            SlotPolynomial::from_field_degree(4),
            SlotPolynomial::Irreducible { degree: 4 }
        );
        assert_eq!(SlotPolynomial::Intrinsic.degree(), None);
    }

    #[test]
    fn test_left_rotation() {
        assert_eq!(left_rotation(1, 8), 7);
        assert_eq!(left_rotation(-1, 8), 1);
        assert_eq!(left_rotation(8, 8), 0);
        assert_eq!(left_rotation(-17, 8), 1);
        assert_eq!(left_rotation(3, 0), 0);
    }
}
