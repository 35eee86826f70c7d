//! Constants shared by the estimators and the ring searches.

/// Bit size of a single-precision modulus in the double-CRT representation.
pub const P2_BITS: u32 = 60;

/// Bits contributed by one level of the modulus chain in the odd-m search.
pub const P_BITS: u32 = P2_BITS / 2;

/// Bits of each RNS modulus used by power-of-two (RLWE batching) contexts.
pub const LEVEL_BITS: u32 = 30;

/// Largest multiplicative order of `p` mod `m` the odd-m search accepts.
pub const MAX_SLOT_ORDER: u64 = 100;

/// Smallest ring dimension tried by the power-of-two search.
pub const MIN_POW2_DEGREE: u64 = 1024;

/// Largest ring dimension tried by the power-of-two search.
pub const MAX_POW2_DEGREE: u64 = 32768;

/// Maximum `log2(q)` per ring dimension and security level, from the
/// homomorphic encryption standard (classical attacks, ternary secrets).
///
/// Rows are `(security_bits, [(degree, max_log_q); 6])`.
pub const HE_STANDARD_LOG_Q: [(u32, [(u64, u32); 6]); 3] = [
    (
        128,
        [(1024, 27), (2048, 54), (4096, 109), (8192, 218), (16384, 438), (32768, 881)],
    ),
    (
        192,
        [(1024, 19), (2048, 37), (4096, 75), (8192, 152), (16384, 305), (32768, 611)],
    ),
    (
        256,
        [(1024, 14), (2048, 29), (4096, 58), (8192, 118), (16384, 237), (32768, 476)],
    ),
];
