//! BFV engine backed by fhe.rs
//!
//! Contexts live on power-of-two cyclotomics `m = 2N` with a plaintext prime
//! `p ≡ 1 (mod m)`, so the plaintext splits into `N` SIMD slots arranged as
//! two rows of `N / 2`. The façade exposes a single row: values are mirrored
//! into both rows on encryption and row 0 is returned on decryption, which
//! keeps column rotations full-length cyclic rotations of the exposed vector.
//!
//! All key material is derived from a 32-byte seed, so persisting the seed
//! reproduces the secret key, its public view and the key-switching keys.

use crate::error::{EngineError, EngineResult};
use crate::traits::{EngineId, HeEngine, SlotPolynomial, left_rotation};
use fhe::bfv::{
    BfvParameters, BfvParametersBuilder, Ciphertext, Encoding, EvaluationKey,
    EvaluationKeyBuilder, Plaintext, PublicKey, RelinearizationKey, SecretKey,
};
use fhe_traits::{
    Deserialize as _, DeserializeParametrized as _, FheDecoder, FheDecrypter, FheEncoder,
    FheEncrypter, Serialize as _,
};
use hefacade_params::constants::LEVEL_BITS;
use hefacade_params::ring::is_prime;
use hefacade_params::search::find_power_of_two_cyclotomic_index;
use hefacade_params::{ContextBase, CyclotomicSearch, ParamsResult, RingQuery};
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng, thread_rng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Longest modulus chain the engine builds
pub const MAX_CHAIN_LENGTH: u64 = 32;

/// ChaCha stream reserved for key-switching material
const KEY_SWITCHING_STREAM: u64 = 1;

#[derive(Debug, Clone, Copy)]
pub struct BfvEngine {
    level_bits: u32,
}

impl Default for BfvEngine {
    fn default() -> Self {
        Self {
            level_bits: LEVEL_BITS,
        }
    }
}

impl BfvEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use RNS moduli of `level_bits` bits instead of the default 30
    pub fn with_level_bits(level_bits: u32) -> Self {
        Self { level_bits }
    }
}

#[derive(Debug)]
pub struct BfvContext {
    base: ContextBase,
    chain_length: u64,
    columns: u64,
    parameters: Arc<BfvParameters>,
}

impl BfvContext {
    pub fn parameters(&self) -> &Arc<BfvParameters> {
        &self.parameters
    }

    /// Ring degree `N = m / 2`
    pub fn degree(&self) -> usize {
        self.parameters.degree()
    }

    /// Slots exposed to callers
    pub fn row_size(&self) -> usize {
        self.parameters.degree() / 2
    }

    /// Bit length of the ciphertext modulus `q`
    pub fn modulus_bits(&self) -> u64 {
        self.parameters
            .moduli()
            .iter()
            .map(|&q| BigUint::from(q))
            .fold(BigUint::one(), |acc, q| acc * q)
            .bits()
    }
}

pub struct BfvSecretKey {
    context: Arc<BfvContext>,
    seed: Zeroizing<[u8; 32]>,
    hamming_weight: u64,
    key: SecretKey,
    public: Arc<BfvPublicKey>,
}

impl BfvSecretKey {
    /// Requested Hamming weight. fhe.rs samples secrets from a centered
    /// binomial distribution, so this is recorded rather than enforced.
    pub fn hamming_weight(&self) -> u64 {
        self.hamming_weight
    }
}

impl fmt::Debug for BfvSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BfvSecretKey")
            .field("key_id", &self.public.key_id)
            .field("hamming_weight", &self.hamming_weight)
            .finish_non_exhaustive()
    }
}

/// Public key plus the key-switching keys evaluation needs
pub struct BfvPublicKey {
    key: PublicKey,
    key_id: u64,
    relinearization: Option<RelinearizationKey>,
    rotations: Option<EvaluationKey>,
    parameters: Arc<BfvParameters>,
}

impl BfvPublicKey {
    pub fn key_id(&self) -> u64 {
        self.key_id
    }

    pub fn has_key_switching(&self) -> bool {
        self.relinearization.is_some() && self.rotations.is_some()
    }

    fn relinearization(&self) -> EngineResult<&RelinearizationKey> {
        self.relinearization
            .as_ref()
            .ok_or(EngineError::MissingKeySwitching("relinearization"))
    }

    fn rotations(&self) -> EngineResult<&EvaluationKey> {
        self.rotations
            .as_ref()
            .ok_or(EngineError::MissingKeySwitching("rotation"))
    }
}

impl fmt::Debug for BfvPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BfvPublicKey")
            .field("key_id", &self.key_id)
            .field("key_switching", &self.has_key_switching())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct BfvEncoder {
    context: Arc<BfvContext>,
    polynomial: SlotPolynomial,
}

impl BfvEncoder {
    pub fn polynomial(&self) -> SlotPolynomial {
        self.polynomial
    }
}

#[derive(Debug, Clone)]
pub struct BfvCiphertext {
    inner: Ciphertext,
    parameters: Arc<BfvParameters>,
    key_id: u64,
}

impl BfvCiphertext {
    pub fn inner(&self) -> &Ciphertext {
        &self.inner
    }

    /// Move onto `parameters` if they only match by value.
    ///
    /// fhe.rs requires operands to share one `Arc`; ciphertexts made before a
    /// restore hold an equal but distinct one.
    fn rehome(&mut self, parameters: &Arc<BfvParameters>) -> EngineResult<()> {
        let inner = match self.on(parameters)? {
            Cow::Borrowed(_) => return Ok(()),
            Cow::Owned(inner) => inner,
        };
        self.inner = inner;
        self.parameters = Arc::clone(parameters);
        Ok(())
    }

    /// The ciphertext as seen under `parameters`, copied only when re-homed
    fn on(&self, parameters: &Arc<BfvParameters>) -> EngineResult<Cow<'_, Ciphertext>> {
        if Arc::ptr_eq(&self.parameters, parameters) {
            return Ok(Cow::Borrowed(&self.inner));
        }
        if *self.parameters != **parameters {
            return Err(EngineError::ContextMismatch);
        }
        debug!(key_id = self.key_id, "re-homing ciphertext onto active parameters");
        let inner = Ciphertext::from_bytes(&self.inner.to_bytes(), parameters)?;
        Ok(Cow::Owned(inner))
    }
}

#[derive(Serialize, Deserialize)]
struct BfvContextRecord {
    parameters: Vec<u8>,
    chain_length: u64,
    columns: u64,
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct BfvSecretKeyRecord {
    seed: [u8; 32],
    hamming_weight: u64,
    key_switching: bool,
}

fn check_parameters(a: &Arc<BfvParameters>, b: &Arc<BfvParameters>) -> EngineResult<()> {
    if Arc::ptr_eq(a, b) || **a == **b {
        Ok(())
    } else {
        Err(EngineError::ContextMismatch)
    }
}

impl BfvEngine {
    fn secret_key_from_seed(
        context: &Arc<BfvContext>,
        seed: Zeroizing<[u8; 32]>,
        hamming_weight: u64,
        key_switching: bool,
    ) -> EngineResult<BfvSecretKey> {
        let degree = context.degree() as u64;
        if hamming_weight == 0 || hamming_weight > degree {
            return Err(EngineError::InvalidHammingWeight {
                weight: hamming_weight,
                reason: format!("must be in [1, {degree}]"),
            });
        }

        let parameters = context.parameters();
        let mut rng = ChaCha8Rng::from_seed(*seed);
        let key = SecretKey::random(parameters, &mut rng);
        let public_key = PublicKey::new(&key, &mut rng);
        let key_id = rng.next_u64();

        let (relinearization, rotations) = if key_switching {
            let mut rng = ChaCha8Rng::from_seed(*seed);
            rng.set_stream(KEY_SWITCHING_STREAM);
            let relinearization = RelinearizationKey::new(&key, &mut rng)?;

            let mut builder = EvaluationKeyBuilder::new(&key)?;
            let mut step = 1;
            while step < context.row_size() {
                builder.enable_column_rotation(step)?;
                step <<= 1;
            }
            let rotations = builder.build(&mut rng)?;
            debug!(key_id, rotations = step.trailing_zeros(), "generated key-switching keys");
            (Some(relinearization), Some(rotations))
        } else {
            (None, None)
        };

        Ok(BfvSecretKey {
            context: Arc::clone(context),
            seed,
            hamming_weight,
            key,
            public: Arc::new(BfvPublicKey {
                key: public_key,
                key_id,
                relinearization,
                rotations,
                parameters: Arc::clone(parameters),
            }),
        })
    }

    /// Mirror a row of slot values into both SIMD rows
    fn encode_rows(context: &BfvContext, row: &[u64]) -> EngineResult<Plaintext> {
        let mut slots = Vec::with_capacity(context.degree());
        slots.extend_from_slice(row);
        slots.resize(context.row_size(), 0);
        slots.extend_from_within(..context.row_size());
        Ok(Plaintext::try_encode(&slots, Encoding::simd(), &context.parameters)?)
    }

    fn adopt(encoder: &BfvEncoder, ct: &mut BfvCiphertext) -> EngineResult<()> {
        ct.rehome(&encoder.context.parameters)
    }

    fn rotate_left(
        public_key: &BfvPublicKey,
        ct: &mut BfvCiphertext,
        amount: usize,
    ) -> EngineResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let keys = public_key.rotations()?;
        let mut step = 1;
        while step <= amount {
            if amount & step != 0 {
                ct.inner = keys.rotates_columns_by(&ct.inner, step)?;
            }
            step <<= 1;
        }
        Ok(())
    }
}

impl CyclotomicSearch for BfvEngine {
    fn find_cyclotomic_index(&self, query: &RingQuery) -> ParamsResult<u64> {
        find_power_of_two_cyclotomic_index(query, self.level_bits)
    }
}

impl HeEngine for BfvEngine {
    type Context = BfvContext;
    type SecretKey = BfvSecretKey;
    type PublicKey = Arc<BfvPublicKey>;
    type Encoder = BfvEncoder;
    type Ciphertext = BfvCiphertext;

    fn id(&self) -> EngineId {
        EngineId::Bfv
    }

    fn name(&self) -> &'static str {
        "BFV (fhe.rs)"
    }

    fn build_context(
        &self,
        base: &ContextBase,
        chain_length: u64,
        columns: u64,
    ) -> EngineResult<BfvContext> {
        let m = base.cyclotomic_index;
        let p = base.plaintext_modulus;
        if m < 16 || !m.is_power_of_two() {
            return Err(EngineError::InvalidContext(format!(
                "cyclotomic index must be a power of two >= 16, got {m}"
            )));
        }
        if base.hensel_lift != 1 {
            return Err(EngineError::UnsupportedPlaintext(format!(
                "Hensel lifting is not supported (r = {})",
                base.hensel_lift
            )));
        }
        if !is_prime(p) || p % m != 1 {
            return Err(EngineError::UnsupportedPlaintext(format!(
                "batching needs a prime p = 1 mod {m}, got {p}"
            )));
        }
        if !(2..=MAX_CHAIN_LENGTH).contains(&chain_length) {
            return Err(EngineError::InvalidContext(format!(
                "chain length must be in [2, {MAX_CHAIN_LENGTH}] for key switching, got {chain_length}"
            )));
        }
        if !base.generators.is_empty() {
            debug!(
                generators = ?base.generators,
                "power-of-two rings use fixed generators; supplied ones are recorded only"
            );
        }

        let parameters = BfvParametersBuilder::new()
            .set_degree((m / 2) as usize)
            .set_plaintext_modulus(p)
            .set_moduli_sizes(&vec![self.level_bits as usize; chain_length as usize])
            .build_arc()?;

        let context = BfvContext {
            base: base.clone(),
            chain_length,
            columns,
            parameters,
        };
        info!(
            degree = context.degree(),
            plaintext_modulus = p,
            modulus_bits = context.modulus_bits(),
            chain_length,
            "built BFV context"
        );
        Ok(context)
    }

    fn context_base(&self, context: &BfvContext) -> ContextBase {
        context.base.clone()
    }

    fn chain_length(&self, context: &BfvContext) -> u64 {
        context.chain_length
    }

    fn generate_secret_key(
        &self,
        context: &Arc<BfvContext>,
        hamming_weight: u64,
    ) -> EngineResult<BfvSecretKey> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *seed);
        Self::secret_key_from_seed(context, seed, hamming_weight, false)
    }

    fn add_key_switching(&self, secret_key: &mut BfvSecretKey) -> EngineResult<()> {
        if secret_key.public.has_key_switching() {
            return Ok(());
        }
        *secret_key = Self::secret_key_from_seed(
            &secret_key.context,
            secret_key.seed.clone(),
            secret_key.hamming_weight,
            true,
        )?;
        Ok(())
    }

    fn public_key(&self, secret_key: &BfvSecretKey) -> Arc<BfvPublicKey> {
        Arc::clone(&secret_key.public)
    }

    fn build_encoder(
        &self,
        context: &Arc<BfvContext>,
        polynomial: SlotPolynomial,
    ) -> EngineResult<BfvEncoder> {
        match polynomial {
            SlotPolynomial::Intrinsic | SlotPolynomial::Irreducible { degree: 1 } => {
                Ok(BfvEncoder {
                    context: Arc::clone(context),
                    polynomial,
                })
            }
            SlotPolynomial::Irreducible { degree } => Err(EngineError::UnsupportedPolynomial {
                degree,
                reason: "p splits completely, slots have degree 1".into(),
            }),
        }
    }

    fn slot_count(&self, encoder: &BfvEncoder) -> usize {
        encoder.context.row_size()
    }

    fn encrypt(
        &self,
        encoder: &BfvEncoder,
        public_key: &Arc<BfvPublicKey>,
        values: &[i64],
    ) -> EngineResult<BfvCiphertext> {
        let context = &encoder.context;
        check_parameters(&public_key.parameters, &context.parameters)?;
        let slots = context.row_size();
        if values.len() > slots {
            return Err(EngineError::TooManyValues {
                len: values.len(),
                slots,
            });
        }
        let t = context.parameters.plaintext();
        let row: Vec<u64> = values
            .iter()
            .map(|v| v.rem_euclid(t as i64) as u64)
            .collect();
        let plaintext = Self::encode_rows(context, &row)?;
        let inner = public_key.key.try_encrypt(&plaintext, &mut thread_rng())?;

        Ok(BfvCiphertext {
            inner,
            parameters: Arc::clone(&context.parameters),
            key_id: public_key.key_id,
        })
    }

    fn decrypt(
        &self,
        encoder: &BfvEncoder,
        secret_key: &BfvSecretKey,
        ciphertext: &BfvCiphertext,
    ) -> EngineResult<Vec<i64>> {
        check_parameters(&encoder.context.parameters, &secret_key.context.parameters)?;
        if ciphertext.key_id != secret_key.public.key_id {
            return Err(EngineError::KeyMismatch);
        }
        let inner = ciphertext.on(&secret_key.context.parameters)?;
        let plaintext = secret_key.key.try_decrypt(&inner)?;
        let slots = Vec::<u64>::try_decode(&plaintext, Encoding::simd())?;
        Ok(slots
            .iter()
            .take(encoder.context.row_size())
            .map(|&v| v as i64)
            .collect())
    }

    fn add(&self, ct: &mut BfvCiphertext, other: &BfvCiphertext, negate: bool) -> EngineResult<()> {
        let other = other.on(&ct.parameters)?;
        if negate {
            ct.inner -= &*other;
        } else {
            ct.inner += &*other;
        }
        Ok(())
    }

    fn multiply(
        &self,
        public_key: &Arc<BfvPublicKey>,
        ct: &mut BfvCiphertext,
        other: &BfvCiphertext,
    ) -> EngineResult<()> {
        let relinearization = public_key.relinearization()?;
        ct.rehome(&public_key.parameters)?;
        let other = other.on(&public_key.parameters)?;
        let mut product = &ct.inner * &*other;
        relinearization.relinearizes(&mut product)?;
        ct.inner = product;
        Ok(())
    }

    fn square(&self, public_key: &Arc<BfvPublicKey>, ct: &mut BfvCiphertext) -> EngineResult<()> {
        let relinearization = public_key.relinearization()?;
        ct.rehome(&public_key.parameters)?;
        let mut product = &ct.inner * &ct.inner;
        relinearization.relinearizes(&mut product)?;
        ct.inner = product;
        Ok(())
    }

    fn cube(&self, public_key: &Arc<BfvPublicKey>, ct: &mut BfvCiphertext) -> EngineResult<()> {
        let original = ct.clone();
        self.square(public_key, ct)?;
        self.multiply(public_key, ct, &original)
    }

    fn negate(&self, ct: &mut BfvCiphertext) -> EngineResult<()> {
        ct.inner = -&ct.inner;
        Ok(())
    }

    fn equals(&self, ct: &BfvCiphertext, other: &BfvCiphertext, compare_keys: bool) -> bool {
        ct.inner == other.inner && (!compare_keys || ct.key_id == other.key_id)
    }

    fn total_sums(
        &self,
        encoder: &BfvEncoder,
        public_key: &Arc<BfvPublicKey>,
        ct: &mut BfvCiphertext,
    ) -> EngineResult<()> {
        Self::adopt(encoder, ct)?;
        let keys = public_key.rotations()?;
        let mut step = 1;
        while step < encoder.context.row_size() {
            let rotated = keys.rotates_columns_by(&ct.inner, step)?;
            ct.inner += &rotated;
            step <<= 1;
        }
        Ok(())
    }

    fn rotate(
        &self,
        encoder: &BfvEncoder,
        public_key: &Arc<BfvPublicKey>,
        ct: &mut BfvCiphertext,
        amount: i64,
    ) -> EngineResult<()> {
        Self::adopt(encoder, ct)?;
        let left = left_rotation(amount, encoder.context.row_size());
        Self::rotate_left(public_key, ct, left)
    }

    fn shift(
        &self,
        encoder: &BfvEncoder,
        public_key: &Arc<BfvPublicKey>,
        ct: &mut BfvCiphertext,
        amount: i64,
    ) -> EngineResult<()> {
        Self::adopt(encoder, ct)?;
        if amount == 0 {
            return Ok(());
        }
        let len = encoder.context.row_size();
        let distance = amount.unsigned_abs() as usize;
        let mask: Vec<u64> = if distance >= len {
            vec![0; len]
        } else {
            Self::rotate_left(public_key, ct, left_rotation(amount, len))?;
            (0..len)
                .map(|i| {
                    let keep = if amount > 0 { i >= distance } else { i < len - distance };
                    keep as u64
                })
                .collect()
        };
        let mask = Self::encode_rows(&encoder.context, &mask)?;
        ct.inner = &ct.inner * &mask;
        Ok(())
    }

    fn write_context(&self, context: &BfvContext) -> EngineResult<Vec<u8>> {
        let record = BfvContextRecord {
            parameters: context.parameters.to_bytes(),
            chain_length: context.chain_length,
            columns: context.columns,
        };
        Ok(serde_json::to_vec(&record)?)
    }

    fn read_context(&self, base: &ContextBase, bytes: &[u8]) -> EngineResult<BfvContext> {
        let record: BfvContextRecord = serde_json::from_slice(bytes)?;
        let parameters = Arc::new(BfvParameters::try_deserialize(&record.parameters)?);

        if (parameters.degree() as u64) * 2 != base.cyclotomic_index
            || parameters.plaintext() != base.plaintext_modulus
            || parameters.moduli().len() as u64 != record.chain_length
        {
            return Err(EngineError::MalformedRecord {
                record: "context",
                reason: "BFV parameters do not match the context base".into(),
            });
        }

        Ok(BfvContext {
            base: base.clone(),
            chain_length: record.chain_length,
            columns: record.columns,
            parameters,
        })
    }

    fn write_secret_key(&self, secret_key: &BfvSecretKey) -> EngineResult<Zeroizing<Vec<u8>>> {
        let record = BfvSecretKeyRecord {
            seed: *secret_key.seed,
            hamming_weight: secret_key.hamming_weight,
            key_switching: secret_key.public.has_key_switching(),
        };
        Ok(Zeroizing::new(serde_json::to_vec(&record)?))
    }

    fn read_secret_key(
        &self,
        context: &Arc<BfvContext>,
        bytes: &[u8],
    ) -> EngineResult<BfvSecretKey> {
        let record: BfvSecretKeyRecord = serde_json::from_slice(bytes)?;
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

    // m = 4096 (N = 2048), 65537 = 16 * 4096 + 1
    fn base() -> ContextBase {
        ContextBase {
            cyclotomic_index: 4096,
            plaintext_modulus: 65537,
            hensel_lift: 1,
            generators: Vec::new(),
            orders: Vec::new(),
        }
    }

    fn setup() -> (BfvEngine, Arc<BfvContext>, BfvSecretKey, BfvEncoder) {
        let engine = BfvEngine::new();
        let context = Arc::new(engine.build_context(&base(), 4, 2).unwrap());
        let mut sk = engine.generate_secret_key(&context, 64).unwrap();
        engine.add_key_switching(&mut sk).unwrap();
        let encoder = engine.build_encoder(&context, SlotPolynomial::Intrinsic).unwrap();
        (engine, context, sk, encoder)
    }

    #[test]
    fn test_context_shape() {
        let engine = BfvEngine::new();
        let context = engine.build_context(&base(), 4, 2).unwrap();
        assert_eq!(context.degree(), 2048);
        assert_eq!(context.row_size(), 1024);
        assert_eq!(engine.chain_length(&context), 4);
        let bits = context.modulus_bits();
        assert!((4 * 29..=4 * 30).contains(&bits), "modulus has {bits} bits");
    }

    #[test]
    fn test_context_rejections() {
        let engine = BfvEngine::new();
        let mut odd = base();
        odd.cyclotomic_index = 4097;
        assert!(matches!(
            engine.build_context(&odd, 4, 2),
            Err(EngineError::InvalidContext(_))
        ));

        let mut binary = base();
        binary.plaintext_modulus = 2;
        assert!(matches!(
            engine.build_context(&binary, 4, 2),
            Err(EngineError::UnsupportedPlaintext(_))
        ));

        let mut lifted = base();
        lifted.hensel_lift = 2;
        assert!(matches!(
            engine.build_context(&lifted, 4, 2),
            Err(EngineError::UnsupportedPlaintext(_))
        ));

        assert!(matches!(
            engine.build_context(&base(), 1, 2),
            Err(EngineError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_search_uses_power_of_two_rings() {
        let query = RingQuery {
            security_bits: 128,
            chain_length: 4,
            columns: 2,
            plaintext_modulus: 65537,
            field_degree: 0,
            min_slots: 0,
        };
        assert_eq!(BfvEngine::new().find_cyclotomic_index(&query).unwrap(), 16384);
    }

    #[test]
    fn test_encrypt_decrypt() {
        let (engine, _, sk, encoder) = setup();
        let pk = engine.public_key(&sk);
        let ct = engine.encrypt(&encoder, &pk, &[1, -1, 70000]).unwrap();
        let values = engine.decrypt(&encoder, &sk, &ct).unwrap();
        assert_eq!(values.len(), 1024);
        assert_eq!(&values[..4], &[1, 65536, 4463, 0]);
    }

    #[test]
    fn test_rotation_matches_direction() {
        let (engine, _, sk, encoder) = setup();
        let pk = engine.public_key(&sk);
        let values: Vec<i64> = (1..=1024).collect();
        let mut ct = engine.encrypt(&encoder, &pk, &values).unwrap();

        engine.rotate(&encoder, &pk, &mut ct, 3).unwrap();
        let rotated = engine.decrypt(&encoder, &sk, &ct).unwrap();
        let mut expected = values.clone();
        expected.rotate_right(3);
        assert_eq!(rotated, expected);
    }

    #[test]
    fn test_total_sums() {
        let (engine, _, sk, encoder) = setup();
        let pk = engine.public_key(&sk);
        let mut ct = engine.encrypt(&encoder, &pk, &[1, 2, 3, 4]).unwrap();
        engine.total_sums(&encoder, &pk, &mut ct).unwrap();
        let values = engine.decrypt(&encoder, &sk, &ct).unwrap();
        assert!(values.iter().all(|&v| v == 10));
    }

    #[test]
    fn test_seed_reproduces_keys() {
        let (engine, context, sk, encoder) = setup();
        let pk = engine.public_key(&sk);
        let ct = engine.encrypt(&encoder, &pk, &[42]).unwrap();

        let record = engine.write_secret_key(&sk).unwrap();
        let restored = engine.read_secret_key(&context, &record).unwrap();
        assert_eq!(engine.public_key(&restored).key_id(), pk.key_id());
        assert!(engine.public_key(&restored).has_key_switching());
        assert_eq!(engine.decrypt(&encoder, &restored, &ct).unwrap()[0], 42);
    }

    #[test]
    fn test_context_record_round_trip() {
        let (engine, context, sk, encoder) = setup();
        let bytes = engine.write_context(&context).unwrap();
        let restored = Arc::new(engine.read_context(&base(), &bytes).unwrap());
        assert_eq!(**restored.parameters(), **context.parameters());

        let restored_encoder = engine
            .build_encoder(&restored, SlotPolynomial::Intrinsic)
            .unwrap();
        let ct = engine.encrypt(&encoder, &engine.public_key(&sk), &[7]).unwrap();
        assert_eq!(engine.decrypt(&restored_encoder, &sk, &ct).unwrap()[0], 7);

        let mut other = base();
        other.plaintext_modulus = 40961;
        assert!(engine.read_context(&other, &bytes).is_err());
    }

    #[test]
    fn test_ciphertexts_follow_rebuilt_context() {
        let (engine, context, sk, encoder) = setup();
        let pk = engine.public_key(&sk);
        let old = engine.encrypt(&encoder, &pk, &[3, 4]).unwrap();

        let bytes = engine.write_context(&context).unwrap();
        let rebuilt = Arc::new(engine.read_context(&base(), &bytes).unwrap());
        assert!(!Arc::ptr_eq(rebuilt.parameters(), context.parameters()));
        let record = engine.write_secret_key(&sk).unwrap();
        let sk2 = engine.read_secret_key(&rebuilt, &record).unwrap();
        let pk2 = engine.public_key(&sk2);
        let encoder2 = engine
            .build_encoder(&rebuilt, SlotPolynomial::Intrinsic)
            .unwrap();

        assert_eq!(&engine.decrypt(&encoder2, &sk2, &old).unwrap()[..2], &[3, 4]);

        let mut fresh = engine.encrypt(&encoder2, &pk2, &[10, 20]).unwrap();
        engine.add(&mut fresh, &old, false).unwrap();
        assert_eq!(&engine.decrypt(&encoder2, &sk2, &fresh).unwrap()[..2], &[13, 24]);

        let mut stale = old.clone();
        engine.multiply(&pk2, &mut stale, &fresh).unwrap();
        assert_eq!(&engine.decrypt(&encoder2, &sk2, &stale).unwrap()[..2], &[39, 96]);
        engine.rotate(&encoder2, &pk2, &mut stale, 1).unwrap();
        assert_eq!(&engine.decrypt(&encoder2, &sk2, &stale).unwrap()[1..3], &[39, 96]);
    }

    #[test]
    fn test_foreign_parameters_rejected() {
        let (engine, _, sk, encoder) = setup();
        let pk = engine.public_key(&sk);
        let mut ct = engine.encrypt(&encoder, &pk, &[1]).unwrap();

        let mut other = base();
        other.cyclotomic_index = 2048;
        other.plaintext_modulus = 40961;
        let context = Arc::new(engine.build_context(&other, 4, 2).unwrap());
        let sk2 = engine.generate_secret_key(&context, 64).unwrap();
        let ct2 = engine
            .encrypt(
                &engine.build_encoder(&context, SlotPolynomial::Intrinsic).unwrap(),
                &engine.public_key(&sk2),
                &[1],
            )
            .unwrap();
        assert!(matches!(
            engine.add(&mut ct, &ct2, false),
            Err(EngineError::ContextMismatch)
        ));
    }

    #[test]
    fn test_extension_degree_rejected() {
        let engine = BfvEngine::new();
        let context = Arc::new(engine.build_context(&base(), 4, 2).unwrap());
        assert!(engine
            .build_encoder(&context, SlotPolynomial::Irreducible { degree: 1 })
            .is_ok());
        assert!(matches!(
            engine.build_encoder(&context, SlotPolynomial::Irreducible { degree: 2 }),
            Err(EngineError::UnsupportedPolynomial { degree: 2, .. })
        ));
    }
}
