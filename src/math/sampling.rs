//! Coefficient distributions over `Z_q`.
//!
//! Each distribution implements [`Distribution<u64>`] and yields residues in
//! `[0, q)`, with negative values represented as `q - |x|`. They only touch the
//! generator through `next_u64` and `fill_bytes`, so the same byte stream
//! always produces the same coefficients; the seeded samplers rely on this.

use super::modular::center_to_mod;
use rand::Rng;
use rand_distr::Distribution;
use thiserror::Error;

/// Largest standard deviation accepted by [`DiscreteGaussian`].
pub const MAX_STD_DEV: f64 = 1.0e12;

/// Largest centered-binomial parameter; both halves come from one `u64` draw.
pub const MAX_ETA: u32 = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SamplingError {
    #[error("modulus must be at least 2, got {modulus}")]
    InvalidModulus { modulus: u64 },
    #[error("standard deviation must be finite, positive and at most 1e12")]
    InvalidStdDev,
    #[error("binomial parameter must be in 1..=64, got {eta}")]
    InvalidEta { eta: u32 },
    #[error("ternary density must be in (0, 1]")]
    InvalidDensity,
}

pub type SamplingResult<T> = Result<T, SamplingError>;

fn check_modulus(modulus: u64) -> SamplingResult<()> {
    if modulus < 2 {
        Err(SamplingError::InvalidModulus { modulus })
    } else {
        Ok(())
    }
}

/// Uniform double in `[0, 1)` from the top 53 bits of one word.
#[inline]
fn unit_interval<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Unbiased draw from `[0, span)` by rejecting the top partial block of `u64`.
#[derive(Debug, Clone, Copy)]
struct RejectionRange {
    span: u64,
    limit: u64,
}

impl RejectionRange {
    fn new(span: u64) -> Self {
        debug_assert!(span > 0);
        Self {
            span,
            limit: u64::MAX / span * span,
        }
    }

    #[inline]
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        loop {
            let v = rng.next_u64();
            if v < self.limit {
                return v % self.span;
            }
        }
    }
}

/// Uniform residues in `[0, q)` without modulo bias.
#[derive(Debug, Clone, Copy)]
pub struct UniformModQ {
    range: RejectionRange,
}

impl UniformModQ {
    pub fn new(modulus: u64) -> SamplingResult<Self> {
        check_modulus(modulus)?;
        Ok(Self {
            range: RejectionRange::new(modulus),
        })
    }
}

impl Distribution<u64> for UniformModQ {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        self.range.draw(rng)
    }
}

/// Discrete Gaussian centred at zero, truncated at `⌈6σ⌉`.
///
/// Candidates are uniform on `[-B, B]` and accepted with probability
/// `exp(-x² / 2σ²)`.
#[derive(Debug, Clone, Copy)]
pub struct DiscreteGaussian {
    modulus: u64,
    tail_bound: u64,
    two_sigma_sq: f64,
    offsets: RejectionRange,
}

impl DiscreteGaussian {
    pub fn new(std_dev: f64, modulus: u64) -> SamplingResult<Self> {
        check_modulus(modulus)?;
        if !(std_dev.is_finite() && std_dev > 0.0 && std_dev <= MAX_STD_DEV) {
            return Err(SamplingError::InvalidStdDev);
        }
        let tail_bound = (6.0 * std_dev).ceil() as u64;
        Ok(Self {
            modulus,
            tail_bound,
            two_sigma_sq: 2.0 * std_dev * std_dev,
            offsets: RejectionRange::new(2 * tail_bound + 1),
        })
    }

    pub fn tail_bound(&self) -> u64 {
        self.tail_bound
    }

    /// Draws the signed offset before it is mapped into `Z_q`.
    pub fn sample_signed<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        loop {
            let x = self.offsets.draw(rng) as i64 - self.tail_bound as i64;
            let xf = x as f64;
            let accept = (-(xf * xf) / self.two_sigma_sq).exp();
            if unit_interval(rng) < accept {
                return x;
            }
        }
    }
}

impl Distribution<u64> for DiscreteGaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        center_to_mod(self.sample_signed(rng), self.modulus)
    }
}

/// Ternary coefficients in `{q-1, 0, 1}`.
///
/// The balanced form gives each value probability 1/3 by rejecting one of the
/// four residues of a byte's low two bits. The sparse form makes a coefficient
/// non-zero with probability `density`, with a fair sign.
#[derive(Debug, Clone, Copy)]
pub struct Ternary {
    modulus: u64,
    density: Option<f64>,
}

impl Ternary {
    pub fn balanced(modulus: u64) -> SamplingResult<Self> {
        check_modulus(modulus)?;
        Ok(Self {
            modulus,
            density: None,
        })
    }

    pub fn with_density(modulus: u64, density: f64) -> SamplingResult<Self> {
        check_modulus(modulus)?;
        if !(density > 0.0 && density <= 1.0) {
            return Err(SamplingError::InvalidDensity);
        }
        Ok(Self {
            modulus,
            density: Some(density),
        })
    }
}

impl Distribution<u64> for Ternary {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let mut byte = [0u8; 1];
        match self.density {
            None => loop {
                rng.fill_bytes(&mut byte);
                match byte[0] & 0b11 {
                    0 => return self.modulus - 1,
                    1 => return 0,
                    2 => return 1,
                    _ => continue,
                }
            },
            Some(density) => {
                if unit_interval(rng) >= density {
                    return 0;
                }
                rng.fill_bytes(&mut byte);
                if byte[0] & 1 == 1 { 1 } else { self.modulus - 1 }
            }
        }
    }
}

/// Centered binomial with parameter `η`: `popcount(a) - popcount(b)` over two
/// independent `η`-bit words.
#[derive(Debug, Clone, Copy)]
pub struct CenteredBinomial {
    modulus: u64,
    eta: u32,
    mask: u64,
}

impl CenteredBinomial {
    pub fn new(eta: u32, modulus: u64) -> SamplingResult<Self> {
        check_modulus(modulus)?;
        if eta == 0 || eta > MAX_ETA {
            return Err(SamplingError::InvalidEta { eta });
        }
        let mask = if eta == 64 { u64::MAX } else { (1u64 << eta) - 1 };
        Ok(Self { modulus, eta, mask })
    }

    pub fn eta(&self) -> u32 {
        self.eta
    }

    pub fn sample_signed<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let a = rng.next_u64() & self.mask;
        let b = rng.next_u64() & self.mask;
        a.count_ones() as i64 - b.count_ones() as i64
    }
}

impl Distribution<u64> for CenteredBinomial {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        center_to_mod(self.sample_signed(rng), self.modulus)
    }
}

/// Draws `degree` coefficients from `dist`.
pub fn sample_poly<D, R>(dist: &D, degree: usize, rng: &mut R) -> Vec<u64>
where
    D: Distribution<u64>,
    R: Rng + ?Sized,
{
    (0..degree).map(|_| dist.sample(rng)).collect()
}
