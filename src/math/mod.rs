pub mod modular;
pub mod primes;
pub mod sampling;
pub mod xof;

pub use modular::{
    add_mod, bit_reverse, bit_reverse_permute, center_to_mod, find_generator,
    find_primitive_root, mod_inverse, mod_pow, mul_mod, prime_factors, sub_mod,
};
pub use primes::{first_ntt_prime_up, is_ntt_friendly_prime, is_prime};
pub use sampling::{
    CenteredBinomial, DiscreteGaussian, SamplingError, SamplingResult, Ternary,
    UniformModQ, sample_poly,
};
pub use xof::XofRng;

/// Default ring degree.
pub const DEFAULT_DEGREE: usize = 256;

/// 48-bit NTT-friendly prime `2^48 + 18945`; `Q - 1 = 2^9 * 3^2 * 5^2 * 14621 * 167113`,
/// so it supports degrees up to 256.
pub const DEFAULT_Q: u64 = 0x1000000004A01;

/// Signature-ring modulus `2^23 - 2^13 + 1`; supports degrees up to 4096.
pub const SIGNATURE_Q: u64 = 8_380_417;

/// Moduli must stay below this so that `a + b` never overflows for reduced `a, b`.
pub const MAX_MODULUS: u64 = 1 << 62;
