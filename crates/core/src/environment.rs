//! Context, keys and encoder of one generated or restored configuration

use crate::error::ConfigError;
use crate::keys::{Decryptor, Encryptor, KeyPair};
use hefacade_engine::{EngineResult, HeEngine, SlotPolynomial};
use hefacade_params::{
    ChainLengthEstimator, ResolvedParameters, SecurityParameters, derive_parameters,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Everything needed to encrypt, evaluate and decrypt under one context.
///
/// Built all at once and replaced all at once; there is no partially
/// initialized environment.
pub struct Environment<E: HeEngine> {
    parameters: ResolvedParameters,
    context: Arc<E::Context>,
    keys: KeyPair<E>,
    encoder: E::Encoder,
}

impl<E: HeEngine> Environment<E> {
    /// Derive missing parameters, then build the context, keys and encoder
    #[instrument(skip_all, fields(engine = engine.name()))]
    pub fn generate(
        engine: &E,
        params: &SecurityParameters,
        estimator: &dyn ChainLengthEstimator,
    ) -> Result<Self, ConfigError> {
        let parameters = derive_parameters(params, estimator, engine)?;

        let context = Arc::new(engine.build_context(
            &parameters.context_base(),
            parameters.chain_length,
            parameters.params.columns,
        )?);
        let built_chain = engine.chain_length(&context);
        if built_chain != parameters.chain_length {
            warn!(
                requested = parameters.chain_length,
                built = built_chain,
                "engine built a different chain length"
            );
        }

        let polynomial = SlotPolynomial::from_field_degree(params.field_degree);
        let mut secret = engine.generate_secret_key(&context, params.hamming_weight)?;
        engine.add_key_switching(&mut secret)?;
        debug!(
            hamming_weight = params.hamming_weight,
            "generated secret key and key-switching material"
        );
        let keys = KeyPair::from_secret(engine, secret);
        let encoder = engine.build_encoder(&context, polynomial)?;

        info!(
            m = parameters.cyclotomic_index,
            L = built_chain,
            slots = engine.slot_count(&encoder),
            ?polynomial,
            "generated environment"
        );
        Ok(Self::from_parts(parameters, context, keys, encoder))
    }

    pub(crate) fn from_parts(
        parameters: ResolvedParameters,
        context: Arc<E::Context>,
        keys: KeyPair<E>,
        encoder: E::Encoder,
    ) -> Self {
        Self {
            parameters,
            context,
            keys,
            encoder,
        }
    }

    pub fn parameters(&self) -> &ResolvedParameters {
        &self.parameters
    }

    pub fn context(&self) -> &Arc<E::Context> {
        &self.context
    }

    pub fn encryptor(&self) -> &dyn Encryptor<E> {
        &self.keys
    }

    pub fn decryptor(&self) -> &dyn Decryptor<E> {
        &self.keys
    }

    pub fn encoder(&self) -> &E::Encoder {
        &self.encoder
    }

    pub fn slot_count(&self, engine: &E) -> usize {
        engine.slot_count(&self.encoder)
    }

    pub fn chain_length(&self, engine: &E) -> u64 {
        engine.chain_length(&self.context)
    }

    pub fn encrypt(&self, engine: &E, values: &[i64]) -> EngineResult<E::Ciphertext> {
        engine.encrypt(&self.encoder, self.keys.public_key(), values)
    }

    pub fn decrypt(&self, engine: &E, ciphertext: &E::Ciphertext) -> EngineResult<Vec<i64>> {
        engine.decrypt(&self.encoder, self.keys.secret_key(), ciphertext)
    }
}
