//! Modulus-chain length estimation

use crate::constants::P2_BITS;
use crate::parameters::SecurityParameters;

/// Estimates the modulus-chain length `L` when the caller leaves it unset.
pub trait ChainLengthEstimator: Send + Sync {
    fn estimate(&self, params: &SecurityParameters) -> u64;
}

/// Default estimator: three levels per multiplication plus headroom for
/// non-binary plaintext spaces.
///
/// `L = 3R + 3`, and when `p > 2` or `r > 1`
/// `L = trunc(L + R * 2 * ceil(ln(p) * r * 3) / (ln 2 * modulus_bits) + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicChainLength {
    pub modulus_bits: u32,
}

impl Default for HeuristicChainLength {
    fn default() -> Self {
        Self {
            modulus_bits: P2_BITS,
        }
    }
}

impl ChainLengthEstimator for HeuristicChainLength {
    fn estimate(&self, params: &SecurityParameters) -> u64 {
        let depth = params.levels as f64;
        let mut chain = 3.0 * depth + 3.0;
        if params.plaintext_modulus > 2 || params.hensel_lift > 1 {
            let plaintext_bits =
                ((params.plaintext_modulus as f64).ln() * params.hensel_lift as f64 * 3.0).ceil();
            chain += depth * 2.0 * plaintext_bits
                / (std::f64::consts::LN_2 * self.modulus_bits as f64)
                + 1.0;
        }
        chain.trunc() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: u64, r: u32, levels: u64) -> SecurityParameters {
        SecurityParameters {
            plaintext_modulus: p,
            hensel_lift: r,
            levels,
            ..SecurityParameters::default()
        }
    }

    #[test]
    fn test_binary_plaintext() {
        let estimator = HeuristicChainLength::default();
        assert_eq!(estimator.estimate(&params(2, 1, 3)), 12);
        assert_eq!(estimator.estimate(&params(2, 1, 1)), 6);
    }

    #[test]
    fn test_large_plaintext_adds_headroom() {
        let estimator = HeuristicChainLength::default();
        // ceil(ln 257 * 3) = 17, 3 * 2 * 17 / (ln 2 * 60) = 2.45
        assert_eq!(estimator.estimate(&params(257, 1, 3)), 15);
        // ceil(ln 2 * 2 * 3) = 5, 2 * 5 / (ln 2 * 60) = 0.24
        assert_eq!(estimator.estimate(&params(2, 2, 1)), 7);
    }

    #[test]
    fn test_custom_modulus_bits() {
        let estimator = HeuristicChainLength { modulus_bits: 30 };
        // 3 * 2 * 17 / (ln 2 * 30) = 4.9
        assert_eq!(estimator.estimate(&params(257, 1, 3)), 17);
    }
}
