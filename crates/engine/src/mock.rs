//! Mock HE engine for testing
//!
//! NOT SECURE - slots are kept in the clear. The engine does model the parts
//! of HE bookkeeping the façade depends on: plaintext arithmetic mod `p^r`,
//! slot structure `φ(m) / ord_m(p)`, levels consumed by multiplication,
//! key identity, key-switching availability and encoder identity.

use crate::error::{EngineError, EngineResult};
use crate::traits::{EngineId, HeEngine, SlotPolynomial, left_rotation};
use hefacade_params::ring::{euler_phi, gcd, multiplicative_order};
use hefacade_params::search::find_odd_cyclotomic_index;
use hefacade_params::{ContextBase, CyclotomicSearch, ParamsResult, RingQuery};
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Largest cyclotomic index the mock engine accepts
pub const MAX_MOCK_INDEX: u64 = 1 << 22;

#[derive(Debug, Clone, Copy, Default)]
pub struct MockEngine;

/// Ring structure and plaintext space of a mock context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockContext {
    base: ContextBase,
    chain_length: u64,
    columns: u64,
    phi: u64,
    order: u64,
    plaintext_space: u64,
}

impl MockContext {
    /// `φ(m)`
    pub fn ring_dimension(&self) -> u64 {
        self.phi
    }

    /// `ord_m(p)`, the intrinsic slot degree
    pub fn slot_order(&self) -> u64 {
        self.order
    }

    pub fn plaintext_space(&self) -> u64 {
        self.plaintext_space
    }

    pub fn slot_count(&self) -> usize {
        (self.phi / self.order) as usize
    }
}

pub struct MockSecretKey {
    context: Arc<MockContext>,
    seed: Zeroizing<[u8; 32]>,
    hamming_weight: u64,
    public: MockPublicKey,
}

impl MockSecretKey {
    pub fn hamming_weight(&self) -> u64 {
        self.hamming_weight
    }
}

impl fmt::Debug for MockSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSecretKey")
            .field("key_id", &self.public.key_id)
            .field("hamming_weight", &self.hamming_weight)
            .finish_non_exhaustive()
    }
}

/// Public view of a mock secret key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPublicKey {
    context: Arc<MockContext>,
    key_id: u64,
    key_switching: bool,
}

impl MockPublicKey {
    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    pub fn has_key_switching(&self) -> bool {
        self.key_switching
    }

    fn require_key_switching(&self, purpose: &'static str) -> EngineResult<()> {
        if self.key_switching {
            Ok(())
        } else {
            Err(EngineError::MissingKeySwitching(purpose))
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockEncoder {
    context: Arc<MockContext>,
    polynomial: SlotPolynomial,
}

impl MockEncoder {
    pub fn polynomial(&self) -> SlotPolynomial {
        self.polynomial
    }
}

/// Clear slots plus the metadata a real ciphertext would carry implicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCiphertext {
    slots: Vec<u64>,
    plaintext_space: u64,
    levels: u64,
    key_id: u64,
    polynomial: SlotPolynomial,
    nonce: u64,
}

impl MockCiphertext {
    /// Levels left before multiplication fails
    pub fn levels(&self) -> u64 {
        self.levels
    }

    fn check_compatible(&self, other: &Self) -> EngineResult<()> {
        if self.slots.len() != other.slots.len() || self.plaintext_space != other.plaintext_space {
            return Err(EngineError::ContextMismatch);
        }
        if self.polynomial != other.polynomial {
            return Err(EngineError::EncoderMismatch);
        }
        Ok(())
    }

    fn consume_levels(
        &mut self,
        operation: &'static str,
        needed: u64,
        available: u64,
    ) -> EngineResult<()> {
        if available < needed {
            return Err(EngineError::LevelExhausted {
                operation,
                needed,
                available,
            });
        }
        self.levels = available - needed;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct MockSecretKeyRecord {
    seed: [u8; 32],
    hamming_weight: u64,
    key_switching: bool,
}

fn mul_mod(a: u64, b: u64, t: u64) -> u64 {
    ((a as u128 * b as u128) % t as u128) as u64
}

fn mix_nonce(a: u64, b: u64) -> u64 {
    a.rotate_left(17) ^ b.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

fn key_id_from_seed(seed: &[u8; 32]) -> u64 {
    ChaCha8Rng::from_seed(*seed).next_u64()
}

impl MockEngine {
    fn secret_key_from_seed(
        context: &Arc<MockContext>,
        seed: Zeroizing<[u8; 32]>,
        hamming_weight: u64,
        key_switching: bool,
    ) -> EngineResult<MockSecretKey> {
        if hamming_weight == 0 || hamming_weight > context.phi {
            return Err(EngineError::InvalidHammingWeight {
                weight: hamming_weight,
                reason: format!("must be in [1, {}]", context.phi),
            });
        }
        let public = MockPublicKey {
            context: Arc::clone(context),
            key_id: key_id_from_seed(&seed),
            key_switching,
        };
        Ok(MockSecretKey {
            context: Arc::clone(context),
            seed,
            hamming_weight,
            public,
        })
    }

    fn check_encoder(encoder: &MockEncoder, ct: &MockCiphertext) -> EngineResult<()> {
        if ct.slots.len() != encoder.context.slot_count()
            || ct.plaintext_space != encoder.context.plaintext_space
        {
            return Err(EngineError::ContextMismatch);
        }
        Ok(())
    }
}

impl CyclotomicSearch for MockEngine {
    fn find_cyclotomic_index(&self, query: &RingQuery) -> ParamsResult<u64> {
        find_odd_cyclotomic_index(query)
    }
}

impl HeEngine for MockEngine {
    type Context = MockContext;
    type SecretKey = MockSecretKey;
    type PublicKey = MockPublicKey;
    type Encoder = MockEncoder;
    type Ciphertext = MockCiphertext;

    fn id(&self) -> EngineId {
        EngineId::Mock
    }

    fn name(&self) -> &'static str {
        "Mock (TESTING ONLY)"
    }

    fn build_context(
        &self,
        base: &ContextBase,
        chain_length: u64,
        columns: u64,
    ) -> EngineResult<MockContext> {
        let m = base.cyclotomic_index;
        let p = base.plaintext_modulus;
        if !(2..=MAX_MOCK_INDEX).contains(&m) {
            return Err(EngineError::InvalidContext(format!(
                "cyclotomic index {m} outside [2, {MAX_MOCK_INDEX}]"
            )));
        }
        if chain_length == 0 {
            return Err(EngineError::InvalidContext("chain length must be >= 1".into()));
        }
        if gcd(p, m) != 1 {
            return Err(EngineError::InvalidContext(format!("p = {p} divides m = {m}")));
        }
        let plaintext_space = base
            .plaintext_space()
            .filter(|t| *t < (1 << 62))
            .ok_or_else(|| {
                EngineError::UnsupportedPlaintext(format!(
                    "{p}^{} does not fit in 62 bits",
                    base.hensel_lift
                ))
            })?;
        let order = multiplicative_order(p, m, m)
            .ok_or_else(|| EngineError::InvalidContext(format!("p = {p} is not a unit mod {m}")))?;
        let phi = euler_phi(m);

        if base.generators.len() != base.orders.len() {
            return Err(EngineError::InvalidContext(
                "generators and orders differ in length".into(),
            ));
        }
        if !base.orders.is_empty() {
            let product: u64 = base.orders.iter().map(|o| o.unsigned_abs()).product();
            if product != phi / order {
                return Err(EngineError::InvalidContext(format!(
                    "generator orders multiply to {product}, the ring has {} slots",
                    phi / order
                )));
            }
        }

        debug!(m, phi, order, slots = phi / order, chain_length, "built mock context");
        Ok(MockContext {
            base: base.clone(),
            chain_length,
            columns,
            phi,
            order,
            plaintext_space,
        })
    }

    fn context_base(&self, context: &MockContext) -> ContextBase {
        context.base.clone()
    }

    fn chain_length(&self, context: &MockContext) -> u64 {
        context.chain_length
    }

    fn generate_secret_key(
        &self,
        context: &Arc<MockContext>,
        hamming_weight: u64,
    ) -> EngineResult<MockSecretKey> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *seed);
        Self::secret_key_from_seed(context, seed, hamming_weight, false)
    }

    fn add_key_switching(&self, secret_key: &mut MockSecretKey) -> EngineResult<()> {
        secret_key.public.key_switching = true;
        Ok(())
    }

    fn public_key(&self, secret_key: &MockSecretKey) -> MockPublicKey {
        secret_key.public.clone()
    }

    fn build_encoder(
        &self,
        context: &Arc<MockContext>,
        polynomial: SlotPolynomial,
    ) -> EngineResult<MockEncoder> {
        if let SlotPolynomial::Irreducible { degree } = polynomial {
            if degree == 0 || context.order % degree != 0 {
                return Err(EngineError::UnsupportedPolynomial {
                    degree,
                    reason: format!("degree must divide ord_m(p) = {}", context.order),
                });
            }
        }
        Ok(MockEncoder {
            context: Arc::clone(context),
            polynomial,
        })
    }

    fn slot_count(&self, encoder: &MockEncoder) -> usize {
        encoder.context.slot_count()
    }

    fn encrypt(
        &self,
        encoder: &MockEncoder,
        public_key: &MockPublicKey,
        values: &[i64],
    ) -> EngineResult<MockCiphertext> {
        if *public_key.context != *encoder.context {
            return Err(EngineError::ContextMismatch);
        }
        let slots = encoder.context.slot_count();
        if values.len() > slots {
            return Err(EngineError::TooManyValues {
                len: values.len(),
                slots,
            });
        }
        let t = encoder.context.plaintext_space;
        let mut reduced: Vec<u64> = values
            .iter()
            .map(|v| v.rem_euclid(t as i64) as u64)
            .collect();
        reduced.resize(slots, 0);

        Ok(MockCiphertext {
            slots: reduced,
            plaintext_space: t,
            levels: encoder.context.chain_length,
            key_id: public_key.key_id,
            polynomial: encoder.polynomial,
            nonce: OsRng.next_u64(),
        })
    }

    fn decrypt(
        &self,
        encoder: &MockEncoder,
        secret_key: &MockSecretKey,
        ciphertext: &MockCiphertext,
    ) -> EngineResult<Vec<i64>> {
        Self::check_encoder(encoder, ciphertext)?;
        if *secret_key.context != *encoder.context {
            return Err(EngineError::ContextMismatch);
        }
        if ciphertext.key_id != secret_key.public.key_id {
            return Err(EngineError::KeyMismatch);
        }
        if ciphertext.polynomial != encoder.polynomial {
            return Err(EngineError::EncoderMismatch);
        }
        Ok(ciphertext.slots.iter().map(|&v| v as i64).collect())
    }

    fn add(
        &self,
        ct: &mut MockCiphertext,
        other: &MockCiphertext,
        negate: bool,
    ) -> EngineResult<()> {
        ct.check_compatible(other)?;
        let t = ct.plaintext_space;
        for (a, &b) in ct.slots.iter_mut().zip(&other.slots) {
            *a = if negate { (*a + t - b) % t } else { (*a + b) % t };
        }
        ct.levels = ct.levels.min(other.levels);
        ct.nonce = mix_nonce(ct.nonce, other.nonce);
        Ok(())
    }

    fn multiply(
        &self,
        public_key: &MockPublicKey,
        ct: &mut MockCiphertext,
        other: &MockCiphertext,
    ) -> EngineResult<()> {
        public_key.require_key_switching("relinearization")?;
        ct.check_compatible(other)?;
        ct.consume_levels("multiply", 1, ct.levels.min(other.levels))?;
        let t = ct.plaintext_space;
        for (a, &b) in ct.slots.iter_mut().zip(&other.slots) {
            *a = mul_mod(*a, b, t);
        }
        ct.nonce = mix_nonce(ct.nonce, other.nonce);
        Ok(())
    }

    fn multiply_by_two(
        &self,
        public_key: &MockPublicKey,
        ct: &mut MockCiphertext,
        first: &MockCiphertext,
        second: &MockCiphertext,
    ) -> EngineResult<()> {
        public_key.require_key_switching("relinearization")?;
        ct.check_compatible(first)?;
        ct.check_compatible(second)?;
        ct.consume_levels("multiply3", 2, ct.levels.min(first.levels).min(second.levels))?;
        let t = ct.plaintext_space;
        for ((a, &b), &c) in ct.slots.iter_mut().zip(&first.slots).zip(&second.slots) {
            *a = mul_mod(mul_mod(*a, b, t), c, t);
        }
        ct.nonce = mix_nonce(mix_nonce(ct.nonce, first.nonce), second.nonce);
        Ok(())
    }

    fn square(&self, public_key: &MockPublicKey, ct: &mut MockCiphertext) -> EngineResult<()> {
        public_key.require_key_switching("relinearization")?;
        ct.consume_levels("square", 1, ct.levels)?;
        let t = ct.plaintext_space;
        for a in ct.slots.iter_mut() {
            *a = mul_mod(*a, *a, t);
        }
        Ok(())
    }

    fn cube(&self, public_key: &MockPublicKey, ct: &mut MockCiphertext) -> EngineResult<()> {
        public_key.require_key_switching("relinearization")?;
        ct.consume_levels("cube", 2, ct.levels)?;
        let t = ct.plaintext_space;
        for a in ct.slots.iter_mut() {
            *a = mul_mod(mul_mod(*a, *a, t), *a, t);
        }
        Ok(())
    }

    fn negate(&self, ct: &mut MockCiphertext) -> EngineResult<()> {
        let t = ct.plaintext_space;
        for a in ct.slots.iter_mut() {
            *a = (t - *a) % t;
        }
        Ok(())
    }

    fn equals(&self, ct: &MockCiphertext, other: &MockCiphertext, compare_keys: bool) -> bool {
        ct.slots == other.slots
            && ct.plaintext_space == other.plaintext_space
            && ct.levels == other.levels
            && ct.polynomial == other.polynomial
            && ct.nonce == other.nonce
            && (!compare_keys || ct.key_id == other.key_id)
    }

    fn total_sums(
        &self,
        encoder: &MockEncoder,
        public_key: &MockPublicKey,
        ct: &mut MockCiphertext,
    ) -> EngineResult<()> {
        public_key.require_key_switching("rotation")?;
        Self::check_encoder(encoder, ct)?;
        let t = ct.plaintext_space;
        let sum = ct.slots.iter().fold(0u64, |acc, &v| (acc + v) % t);
        ct.slots.fill(sum);
        Ok(())
    }

    fn rotate(
        &self,
        encoder: &MockEncoder,
        public_key: &MockPublicKey,
        ct: &mut MockCiphertext,
        amount: i64,
    ) -> EngineResult<()> {
        public_key.require_key_switching("rotation")?;
        Self::check_encoder(encoder, ct)?;
        let left = left_rotation(amount, ct.slots.len());
        ct.slots.rotate_left(left);
        Ok(())
    }

    fn shift(
        &self,
        encoder: &MockEncoder,
        public_key: &MockPublicKey,
        ct: &mut MockCiphertext,
        amount: i64,
    ) -> EngineResult<()> {
        public_key.require_key_switching("rotation")?;
        Self::check_encoder(encoder, ct)?;
        let len = ct.slots.len();
        let distance = amount.unsigned_abs() as usize;
        if distance >= len {
            ct.slots.fill(0);
        } else if amount > 0 {
            ct.slots.rotate_right(distance);
            ct.slots[..distance].fill(0);
        } else if amount < 0 {
            ct.slots.rotate_left(distance);
            ct.slots[len - distance..].fill(0);
        }
        Ok(())
    }

    fn write_context(&self, context: &MockContext) -> EngineResult<Vec<u8>> {
        Ok(serde_json::to_vec(context)?)
    }

    fn read_context(&self, base: &ContextBase, bytes: &[u8]) -> EngineResult<MockContext> {
        let context: MockContext = serde_json::from_slice(bytes)?;
        if context.base != *base {
            return Err(EngineError::MalformedRecord {
                record: "context",
                reason: "ring descriptor does not match the context base".into(),
            });
        }
        let rebuilt = self.build_context(base, context.chain_length, context.columns)?;
        if rebuilt != context {
            return Err(EngineError::MalformedRecord {
                record: "context",
                reason: "stored ring structure is inconsistent".into(),
            });
        }
        Ok(rebuilt)
    }

    fn write_secret_key(&self, secret_key: &MockSecretKey) -> EngineResult<Zeroizing<Vec<u8>>> {
        let record = MockSecretKeyRecord {
            seed: *secret_key.seed,
            hamming_weight: secret_key.hamming_weight,
            key_switching: secret_key.public.key_switching,
        };
        Ok(Zeroizing::new(serde_json::to_vec(&record)?))
    }

    fn read_secret_key(
        &self,
        context: &Arc<MockContext>,
        bytes: &[u8],
    ) -> EngineResult<MockSecretKey> {
        let record: MockSecretKeyRecord = serde_json::from_slice(bytes)?;
        Self::secret_key_from_seed(
            context,
            Zeroizing::new(record.seed),
            record.hamming_weight,
            record.key_switching,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // m = 257, p = 2: ord = 16, 256 / 16 = 16 slots
    fn base(p: u64) -> ContextBase {
        ContextBase {
            cyclotomic_index: 257,
            plaintext_modulus: p,
            hensel_lift: 1,
            generators: Vec::new(),
            orders: Vec::new(),
        }
    }

    fn setup(chain_length: u64) -> (Arc<MockContext>, MockSecretKey, MockEncoder) {
        let engine = MockEngine;
        let context = Arc::new(engine.build_context(&base(65537), chain_length, 2).unwrap());
        let mut sk = engine.generate_secret_key(&context, 64).unwrap();
        engine.add_key_switching(&mut sk).unwrap();
        let encoder = engine.build_encoder(&context, SlotPolynomial::Intrinsic).unwrap();
        (context, sk, encoder)
    }

    #[test]
    fn test_context_structure() {
        let context = MockEngine.build_context(&base(2), 4, 2).unwrap();
        assert_eq!(context.ring_dimension(), 256);
        assert_eq!(context.slot_order(), 16);
        assert_eq!(context.slot_count(), 16);
        assert_eq!(MockEngine.chain_length(&context), 4);
    }

    #[test]
    fn test_context_rejections() {
        let engine = MockEngine;
        assert!(engine.build_context(&base(257), 4, 2).is_err());
        assert!(engine.build_context(&base(2), 0, 2).is_err());

        let mut huge = base(2);
        huge.cyclotomic_index = MAX_MOCK_INDEX + 1;
        assert!(engine.build_context(&huge, 4, 2).is_err());

        let mut bad_orders = base(2);
        bad_orders.generators = vec![3];
        bad_orders.orders = vec![4];
        assert!(engine.build_context(&bad_orders, 4, 2).is_err());
        bad_orders.orders = vec![16];
        assert!(engine.build_context(&bad_orders, 4, 2).is_ok());
    }

    #[test]
    fn test_encrypt_reduces_and_pads() {
        let engine = MockEngine;
        let (_, sk, encoder) = setup(4);
        let pk = engine.public_key(&sk);

        let ct = engine.encrypt(&encoder, &pk, &[-1, 65538, 7]).unwrap();
        let values = engine.decrypt(&encoder, &sk, &ct).unwrap();
        assert_eq!(values.len(), 16);
        assert_eq!(&values[..4], &[65536, 1, 7, 0]);

        let err = engine.encrypt(&encoder, &pk, &[0; 17]).unwrap_err();
        assert!(matches!(err, EngineError::TooManyValues { len: 17, slots: 16 }));
    }

    #[test]
    fn test_levels_are_consumed() {
        let engine = MockEngine;
        let (_, sk, encoder) = setup(2);
        let pk = engine.public_key(&sk);
        let other = engine.encrypt(&encoder, &pk, &[2]).unwrap();
        let mut ct = engine.encrypt(&encoder, &pk, &[3]).unwrap();

        engine.multiply(&pk, &mut ct, &other).unwrap();
        assert_eq!(ct.levels(), 1);
        assert!(matches!(
            engine.cube(&pk, &mut ct),
            Err(EngineError::LevelExhausted { needed: 2, available: 1, .. })
        ));
        engine.square(&pk, &mut ct).unwrap();
        assert_eq!(ct.levels(), 0);
        assert!(matches!(
            engine.multiply(&pk, &mut ct, &other),
            Err(EngineError::LevelExhausted { .. })
        ));
        assert_eq!(engine.decrypt(&encoder, &sk, &ct).unwrap()[0], 36);
    }

    #[test]
    fn test_key_switching_required() {
        let engine = MockEngine;
        let context = Arc::new(engine.build_context(&base(65537), 4, 2).unwrap());
        let sk = engine.generate_secret_key(&context, 64).unwrap();
        let encoder = engine.build_encoder(&context, SlotPolynomial::Intrinsic).unwrap();
        let pk = engine.public_key(&sk);
        let mut ct = engine.encrypt(&encoder, &pk, &[1, 2]).unwrap();

        assert!(matches!(
            engine.square(&pk, &mut ct),
            Err(EngineError::MissingKeySwitching("relinearization"))
        ));
        assert!(matches!(
            engine.rotate(&encoder, &pk, &mut ct, 1),
            Err(EngineError::MissingKeySwitching("rotation"))
        ));
    }

    #[test]
    fn test_rotate_and_shift_directions() {
        let engine = MockEngine;
        let (_, sk, encoder) = setup(4);
        let pk = engine.public_key(&sk);
        let values: Vec<i64> = (1..=16).collect();

        let mut ct = engine.encrypt(&encoder, &pk, &values).unwrap();
        engine.rotate(&encoder, &pk, &mut ct, 1).unwrap();
        let rotated = engine.decrypt(&encoder, &sk, &ct).unwrap();
        assert_eq!(rotated[0], 16);
        assert_eq!(rotated[1], 1);

        let mut ct = engine.encrypt(&encoder, &pk, &values).unwrap();
        engine.shift(&encoder, &pk, &mut ct, -3).unwrap();
        let shifted = engine.decrypt(&encoder, &sk, &ct).unwrap();
        assert_eq!(&shifted[..2], &[4, 5]);
        assert_eq!(&shifted[13..], &[0, 0, 0]);

        engine.shift(&encoder, &pk, &mut ct, 16).unwrap();
        assert!(engine.decrypt(&encoder, &sk, &ct).unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_polynomial_must_divide_order() {
        let engine = MockEngine;
        let context = Arc::new(engine.build_context(&base(2), 4, 2).unwrap());
        assert!(engine
            .build_encoder(&context, SlotPolynomial::Irreducible { degree: 4 })
            .is_ok());
        assert!(matches!(
            engine.build_encoder(&context, SlotPolynomial::Irreducible { degree: 3 }),
            Err(EngineError::UnsupportedPolynomial { degree: 3, .. })
        ));
    }

    #[test]
    fn test_hamming_weight_bounds() {
        let engine = MockEngine;
        let context = Arc::new(engine.build_context(&base(2), 4, 2).unwrap());
        assert!(engine.generate_secret_key(&context, 0).is_err());
        assert!(engine.generate_secret_key(&context, 257).is_err());
        assert_eq!(engine.generate_secret_key(&context, 256).unwrap().hamming_weight(), 256);
    }

    #[test]
    fn test_records_round_trip() {
        let engine = MockEngine;
        let (context, sk, encoder) = setup(4);
        let pk = engine.public_key(&sk);
        let ct = engine.encrypt(&encoder, &pk, &[5, 6]).unwrap();

        let bytes = engine.write_context(&context).unwrap();
        let restored = Arc::new(engine.read_context(&context.base, &bytes).unwrap());
        assert_eq!(*restored, *context);

        let key_bytes = engine.write_secret_key(&sk).unwrap();
        let restored_sk = engine.read_secret_key(&restored, &key_bytes).unwrap();
        assert_eq!(engine.public_key(&restored_sk), pk);
        assert_eq!(&engine.decrypt(&encoder, &restored_sk, &ct).unwrap()[..2], &[5, 6]);

        let mut other_base = context.base.clone();
        other_base.plaintext_modulus = 3;
        assert!(engine.read_context(&other_base, &bytes).is_err());
    }

    #[test]
    fn test_foreign_key_cannot_decrypt() {
        let engine = MockEngine;
        let (context, sk, encoder) = setup(4);
        let other = engine.generate_secret_key(&context, 64).unwrap();
        let ct = engine.encrypt(&encoder, &engine.public_key(&sk), &[1]).unwrap();
        assert!(matches!(
            engine.decrypt(&encoder, &other, &ct),
            Err(EngineError::KeyMismatch)
        ));
    }
}
