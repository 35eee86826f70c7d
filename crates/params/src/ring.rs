//! Ring descriptors and number-theoretic helpers
//!
//! [`ContextBase`] is the small descriptor that lets an engine rebuild the
//! ring before it deserializes a full context. [`RingQuery`] is what the
//! cyclotomic searches receive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Descriptor of the cyclotomic ring and plaintext space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBase {
    /// Cyclotomic index `m`
    pub cyclotomic_index: u64,
    /// Plaintext base prime `p`
    pub plaintext_modulus: u64,
    /// Hensel lifting exponent `r`
    pub hensel_lift: u32,
    pub generators: Vec<i64>,
    pub orders: Vec<i64>,
}

impl ContextBase {
    /// Plaintext space `p^r`, or `None` on overflow
    pub fn plaintext_space(&self) -> Option<u64> {
        self.plaintext_modulus.checked_pow(self.hensel_lift)
    }
}

/// Constraints handed to a cyclotomic-index search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingQuery {
    pub security_bits: u32,
    pub chain_length: u64,
    pub columns: u64,
    pub plaintext_modulus: u64,
    pub field_degree: u64,
    pub min_slots: u64,
}

impl fmt::Display for RingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sec={} L={} c={} p={} d={} s={}",
            self.security_bits,
            self.chain_length,
            self.columns,
            self.plaintext_modulus,
            self.field_degree,
            self.min_slots
        )
    }
}

/// Greatest common divisor
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// `base^exp mod m`
pub fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut acc = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// Deterministic Miller-Rabin for the whole `u64` range
pub fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &w in &WITNESSES {
        if n % w == 0 {
            return n == w;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Prime factorization by trial division, as `(prime, exponent)` pairs
pub fn factorize(mut n: u64) -> Vec<(u64, u32)> {
    let mut factors = Vec::new();
    let mut q = 2u64;
    while q.saturating_mul(q) <= n {
        if n % q == 0 {
            let mut e = 0;
            while n % q == 0 {
                n /= q;
                e += 1;
            }
            factors.push((q, e));
        }
        q += if q == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push((n, 1));
    }
    factors
}

/// Euler's totient
pub fn euler_phi(n: u64) -> u64 {
    factorize(n)
        .into_iter()
        .fold(n, |acc, (q, _)| acc / q * (q - 1))
}

/// Multiplicative order of `p` modulo `m`, searched up to `bound`.
///
/// Returns `None` when `p` is not invertible mod `m` or the order exceeds `bound`.
pub fn multiplicative_order(p: u64, m: u64, bound: u64) -> Option<u64> {
    if m < 2 || gcd(p % m, m) != 1 {
        return None;
    }
    let base = p % m;
    let mut acc = base;
    for k in 1..=bound {
        if acc == 1 {
            return Some(k);
        }
        acc = mul_mod(acc, base, m);
    }
    None
}
