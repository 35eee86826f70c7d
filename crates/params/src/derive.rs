//! Parameter derivation
//!
//! Fills in the chain length and cyclotomic index a caller left unset. The
//! chain length comes first because the ring search depends on it.

use crate::errors::ParamsResult;
use crate::estimate::ChainLengthEstimator;
use crate::parameters::SecurityParameters;
use crate::ring::{ContextBase, RingQuery};
use crate::search::CyclotomicSearch;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Parameters with `L` and `m` fixed, recording which of them were derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedParameters {
    /// The caller's parameters with `chain_length` and `cyclotomic_index` set
    pub params: SecurityParameters,
    pub chain_length: u64,
    pub cyclotomic_index: u64,
    pub derived_chain_length: bool,
    pub derived_cyclotomic_index: bool,
}

impl ResolvedParameters {
    /// Ring descriptor for context construction
    pub fn context_base(&self) -> ContextBase {
        ContextBase {
            cyclotomic_index: self.cyclotomic_index,
            plaintext_modulus: self.params.plaintext_modulus,
            hensel_lift: self.params.hensel_lift,
            generators: self.params.generators.clone(),
            orders: self.params.orders.clone(),
        }
    }
}

/// Build the ring query for a set of parameters and a chain length
pub fn ring_query(params: &SecurityParameters, chain_length: u64) -> RingQuery {
    RingQuery {
        security_bits: params.security_bits,
        chain_length,
        columns: params.columns,
        plaintext_modulus: params.plaintext_modulus,
        field_degree: params.field_degree,
        min_slots: params.min_slots,
    }
}

/// Validate `params` and derive whatever is missing.
///
/// Caller-supplied values are never overridden. A failed search is returned
/// as is; nothing is retried.
pub fn derive_parameters<S>(
    params: &SecurityParameters,
    estimator: &dyn ChainLengthEstimator,
    search: &S,
) -> ParamsResult<ResolvedParameters>
where
    S: CyclotomicSearch + ?Sized,
{
    params.validate()?;

    let (chain_length, derived_chain_length) = match params.chain_length {
        Some(l) => (l, false),
        None => {
            let l = estimator.estimate(params);
            debug!(chain_length = l, "derived chain length");
            (l, true)
        }
    };

    let (cyclotomic_index, derived_cyclotomic_index) = match params.cyclotomic_index {
        Some(m) => (m, false),
        None => {
            let m = search.find_cyclotomic_index(&ring_query(params, chain_length))?;
            debug!(cyclotomic_index = m, "derived cyclotomic index");
            (m, true)
        }
    };

    info!(
        m = cyclotomic_index,
        p = params.plaintext_modulus,
        r = params.hensel_lift,
        L = chain_length,
        derived_chain_length,
        derived_cyclotomic_index,
        "resolved parameters"
    );

    Ok(ResolvedParameters {
        params: SecurityParameters {
            chain_length: Some(chain_length),
            cyclotomic_index: Some(cyclotomic_index),
            ..params.clone()
        },
        chain_length,
        cyclotomic_index,
        derived_chain_length,
        derived_cyclotomic_index,
    })
}
