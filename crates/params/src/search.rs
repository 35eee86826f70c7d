//! Cyclotomic-index searches
//!
//! Two strategies are provided. [`find_odd_cyclotomic_index`] scans odd
//! indices for a ring whose slot structure suits small plaintext primes.
//! [`find_power_of_two_cyclotomic_index`] picks the smallest power-of-two ring
//! whose modulus budget fits the homomorphic encryption standard and whose
//! plaintext prime splits completely, as RLWE batching requires.

use crate::constants::{
    HE_STANDARD_LOG_Q, MAX_POW2_DEGREE, MAX_SLOT_ORDER, MIN_POW2_DEGREE, P_BITS,
};
use crate::errors::{ParamsError, ParamsResult};
use crate::ring::{RingQuery, euler_phi, multiplicative_order};
use tracing::debug;

/// Chooses a cyclotomic index `m` for a query. Implemented by every engine.
pub trait CyclotomicSearch {
    fn find_cyclotomic_index(&self, query: &RingQuery) -> ParamsResult<u64>;
}

/// Lower bound on `φ(m)` for the requested security and chain length:
/// `ceil((L + 1) * P_BITS * (1 + 1/c) * (sec + 110) / 7.2)`.
pub fn min_ring_dimension(query: &RingQuery) -> u64 {
    let levels = (query.chain_length + 1) as f64;
    let columns = query.columns.max(1) as f64;
    let bits = levels * P_BITS as f64 * (1.0 + 1.0 / columns);
    (bits * (query.security_bits as f64 + 110.0) / 7.2).ceil() as u64
}

/// Scan odd `m` in `[N|1, 10N]` for the first index with `gcd(p, m) = 1`,
/// `ord_m(p) <= 100`, `ord_m(p)` divisible by `d` when `d > 1`,
/// `φ(m) >= N` and at least `s` slots.
pub fn find_odd_cyclotomic_index(query: &RingQuery) -> ParamsResult<u64> {
    if query.columns == 0 {
        return Err(ParamsError::no_index(query, "columns must be >= 1"));
    }
    let bound = min_ring_dimension(query);
    let upper = bound.saturating_mul(10);
    debug!(bound, upper, "searching odd cyclotomic index");

    for m in ((bound | 1)..=upper).step_by(2) {
        let Some(order) = multiplicative_order(query.plaintext_modulus, m, MAX_SLOT_ORDER) else {
            continue;
        };
        if query.field_degree > 1 && order % query.field_degree != 0 {
            continue;
        }
        let phi = euler_phi(m);
        if phi < bound || phi / order < query.min_slots {
            continue;
        }
        debug!(m, phi, order, slots = phi / order, "odd cyclotomic index found");
        return Ok(m);
    }

    Err(ParamsError::no_index(
        query,
        format!("no odd m in [{}, {upper}] qualifies", bound | 1),
    ))
}

/// Largest `log2(q)` the standard allows for ring degree `n`, at the first
/// tabulated security level that meets `security_bits`.
pub fn max_modulus_bits(n: u64, security_bits: u32) -> Option<u32> {
    HE_STANDARD_LOG_Q
        .iter()
        .find(|(level, _)| *level >= security_bits)
        .and_then(|(_, row)| row.iter().find(|(degree, _)| *degree == n))
        .map(|(_, bits)| *bits)
}

/// Sweep `m = 2n` for `n` from 1024 to 32768 and return the first index whose
/// `L * level_bits` modulus fits the standard, with `p ≡ 1 (mod m)` and
/// `n / 2 >= s`.
pub fn find_power_of_two_cyclotomic_index(query: &RingQuery, level_bits: u32) -> ParamsResult<u64> {
    if query.field_degree > 1 {
        return Err(ParamsError::no_index(
            query,
            "power-of-two rings with a fully split plaintext prime only have degree-1 slots",
        ));
    }
    let modulus_bits = query.chain_length.saturating_mul(level_bits as u64);

    let mut n = MIN_POW2_DEGREE;
    while n <= MAX_POW2_DEGREE {
        let m = 2 * n;
        let Some(limit) = max_modulus_bits(n, query.security_bits) else {
            return Err(ParamsError::no_index(
                query,
                format!("no tabulated bound for {} bits of security", query.security_bits),
            ));
        };
        if modulus_bits <= limit as u64
            && query.plaintext_modulus % m == 1
            && n / 2 >= query.min_slots
        {
            debug!(m, modulus_bits, limit, "power-of-two cyclotomic index found");
            return Ok(m);
        }
        n *= 2;
    }

    Err(ParamsError::no_index(
        query,
        format!(
            "no ring up to degree {MAX_POW2_DEGREE} holds {modulus_bits} modulus bits with p = 1 mod m"
        ),
    ))
}
