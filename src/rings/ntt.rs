//! Number-theoretic transform over `Z_q[X]` for a fixed `(N, Q)`.
//!
//! An [`NttContext`] owns the ring parameters and two twiddle tables of length
//! `N`, filled at bit-reversed positions: `forward_roots[bitrev(i)] = ω^i` and
//! `inverse_roots[bitrev(i)] = ω^-i`, where `ω` is a primitive `2N`-th root of
//! unity. The tables are never written after construction, so one context can
//! be shared behind an `Arc` by any number of threads.
//!
//! The forward transform permutes first and then runs decimation-in-time
//! Cooley-Tukey stages with growing blocks. The inverse runs Gentleman-Sande
//! stages with shrinking blocks, permutes, and scales by `N^-1`. Both reduce
//! their input modulo `Q` on entry, and `inverse(forward(p)) == p` exactly for
//! every reduced `p`.
//!
//! The slot-wise product of two transformed polynomials is not the negacyclic
//! product in `Z_q[X]/(X^N + 1)` in general. It agrees with ring multiplication
//! only when one operand is a constant polynomial, so [`NttContext::pointwise_mul`]
//! and the matrix products built on it act as scaling by constants. For
//! `N = 8, Q = 17`, squaring `x` slot-wise gives `3x^2 + 7x^4 + 8x^6`, not `x^2`.

use crate::math::{
    DEFAULT_DEGREE, DEFAULT_Q, MAX_MODULUS, add_mod, bit_reverse, bit_reverse_permute,
    find_primitive_root, is_ntt_friendly_prime, mod_inverse, mod_pow, mul_mod, sub_mod,
};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument, warn};

use super::errors::{RingError, RingResult};

#[derive(Debug)]
pub struct NttContext {
    degree: usize,
    modulus: u64,
    n_inv: u64,
    log_degree: u32,
    forward_roots: Vec<u64>,
    inverse_roots: Vec<u64>,
    ready: AtomicBool,
}

// ─── Construction & lifecycle ────────────────────────────────────────────────

impl NttContext {
    /// Builds the context for degree `degree` and prime modulus `modulus`.
    ///
    /// A zero argument selects the default (`N = 256`, `Q = 2^48 + 18945`).
    /// `N` must be a power of two, `Q` must not exceed `2^62`, and `Q` must be
    /// a prime with `2N | Q - 1`.
    #[instrument(level = "debug")]
    pub fn new(degree: usize, modulus: u64) -> RingResult<Self> {
        let degree = if degree == 0 { DEFAULT_DEGREE } else { degree };
        let modulus = if modulus == 0 { DEFAULT_Q } else { modulus };

        if !degree.is_power_of_two() {
            return Err(RingError::InvalidDegree { degree });
        }
        if modulus > MAX_MODULUS {
            return Err(RingError::ModulusTooLarge {
                modulus,
                max: MAX_MODULUS,
            });
        }
        if !is_ntt_friendly_prime(modulus, degree as u64) {
            return Err(RingError::IncompatibleModulus { modulus, degree });
        }

        let omega = find_primitive_root(modulus, 2 * degree as u64)
            .ok_or(RingError::NoGenerator { modulus })?;
        let omega_inv = mod_inverse(omega, modulus);
        let log_degree = degree.trailing_zeros();

        let mut forward_roots = vec![1u64; degree];
        let mut inverse_roots = vec![1u64; degree];
        for i in 1..degree {
            let slot = bit_reverse(i, log_degree);
            forward_roots[slot] = mod_pow(omega, i as u64, modulus);
            inverse_roots[slot] = mod_pow(omega_inv, i as u64, modulus);
        }

        let n_inv = mod_inverse(degree as u64, modulus);
        debug!(degree, modulus, omega, n_inv, "twiddle tables ready");

        Ok(Self {
            degree,
            modulus,
            n_inv,
            log_degree,
            forward_roots,
            inverse_roots,
            ready: AtomicBool::new(true),
        })
    }

    /// Marks the context unusable. Calling it again is a no-op.
    pub fn close(&self) {
        if self.ready.swap(false, Ordering::AcqRel) {
            debug!(degree = self.degree, modulus = self.modulus, "context closed");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// `N^-1 mod Q`.
    pub fn n_inv(&self) -> u64 {
        self.n_inv
    }

    pub fn log_degree(&self) -> u32 {
        self.log_degree
    }

    pub fn forward_roots(&self) -> &[u64] {
        &self.forward_roots
    }

    pub fn inverse_roots(&self) -> &[u64] {
        &self.inverse_roots
    }

    pub(crate) fn ensure_ready(&self) -> RingResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            warn!(degree = self.degree, "closed context used");
            Err(RingError::NotInitialized)
        }
    }

    pub(crate) fn check_len(&self, poly: &[u64]) -> RingResult<()> {
        if poly.len() == self.degree {
            Ok(())
        } else {
            Err(RingError::LengthMismatch {
                expected: self.degree,
                actual: poly.len(),
            })
        }
    }
}

// ─── Transforms ──────────────────────────────────────────────────────────────

impl NttContext {
    /// Coefficient domain to NTT domain.
    pub fn forward_single(&self, poly: &[u64]) -> RingResult<Vec<u64>> {
        self.ensure_ready()?;
        self.check_len(poly)?;
        let mut values = self.reduced(poly);
        bit_reverse_permute(&mut values);
        cooley_tukey_ntt(&mut values, &self.forward_roots, self.modulus);
        Ok(values)
    }

    /// NTT domain to coefficient domain, including the `N^-1` scaling.
    pub fn inverse_single(&self, poly: &[u64]) -> RingResult<Vec<u64>> {
        self.ensure_ready()?;
        self.check_len(poly)?;
        let mut values = self.reduced(poly);
        gentleman_sande_intt(&mut values, &self.inverse_roots, self.modulus);
        bit_reverse_permute(&mut values);
        for v in values.iter_mut() {
            *v = mul_mod(*v, self.n_inv, self.modulus);
        }
        Ok(values)
    }

    /// Forward transform of every polynomial, one rayon task each.
    ///
    /// Output slot `i` holds the transform of input slot `i`. The whole batch
    /// fails if any polynomial has the wrong length.
    pub fn forward<P>(&self, polys: &[P]) -> RingResult<Vec<Vec<u64>>>
    where
        P: AsRef<[u64]> + Sync,
    {
        self.ensure_ready()?;
        polys
            .par_iter()
            .map(|p| self.forward_single(p.as_ref()))
            .collect()
    }

    pub fn inverse<P>(&self, polys: &[P]) -> RingResult<Vec<Vec<u64>>>
    where
        P: AsRef<[u64]> + Sync,
    {
        self.ensure_ready()?;
        polys
            .par_iter()
            .map(|p| self.inverse_single(p.as_ref()))
            .collect()
    }

    fn reduced(&self, poly: &[u64]) -> Vec<u64> {
        poly.iter().map(|&c| c % self.modulus).collect()
    }
}

// ─── Coefficient-wise helpers ────────────────────────────────────────────────

impl NttContext {
    /// Slot-wise product of NTT-domain operands.
    ///
    /// Matches ring multiplication only when one side is the transform of a
    /// constant polynomial.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64]) -> RingResult<Vec<u64>> {
        self.check_len(a)?;
        self.check_len(b)?;
        let q = self.modulus;
        Ok(a.iter().zip(b).map(|(&x, &y)| mul_mod(x, y, q)).collect())
    }

    pub fn poly_add(&self, a: &[u64], b: &[u64]) -> RingResult<Vec<u64>> {
        self.check_len(a)?;
        self.check_len(b)?;
        let q = self.modulus;
        Ok(a.iter()
            .zip(b)
            .map(|(&x, &y)| add_mod(x % q, y % q, q))
            .collect())
    }

    pub fn poly_sub(&self, a: &[u64], b: &[u64]) -> RingResult<Vec<u64>> {
        self.check_len(a)?;
        self.check_len(b)?;
        let q = self.modulus;
        Ok(a.iter()
            .zip(b)
            .map(|(&x, &y)| sub_mod(x % q, y % q, q))
            .collect())
    }

    pub fn poly_scalar_mul(&self, a: &[u64], scalar: u64) -> RingResult<Vec<u64>> {
        self.check_len(a)?;
        let q = self.modulus;
        Ok(a.iter().map(|&x| mul_mod(x, scalar, q)).collect())
    }

    /// Accumulates `acc[i] += a[i] * b[i] mod Q` in place. Lengths are the
    /// caller's responsibility.
    pub(crate) fn mul_acc(&self, acc: &mut [u64], a: &[u64], b: &[u64]) {
        let q = self.modulus;
        for ((slot, &x), &y) in acc.iter_mut().zip(a).zip(b) {
            *slot = add_mod(*slot, mul_mod(x, y, q), q);
        }
    }
}

// ─── Butterfly kernels ───────────────────────────────────────────────────────

fn cooley_tukey_ntt(values: &mut [u64], roots: &[u64], modulus: u64) {
    let degree = values.len();
    let mut len = 2;
    while len <= degree {
        let half = len / 2;
        let step = degree / len;
        for start in (0..degree).step_by(len) {
            for offset in 0..half {
                let left = start + offset;
                let right = left + half;
                let t = mul_mod(roots[offset * step], values[right], modulus);
                let u = values[left];
                values[left] = add_mod(u, t, modulus);
                values[right] = sub_mod(u, t, modulus);
            }
        }
        len *= 2;
    }
}

fn gentleman_sande_intt(values: &mut [u64], roots: &[u64], modulus: u64) {
    let degree = values.len();
    let mut len = degree;
    while len >= 2 {
        let half = len / 2;
        let step = degree / len;
        for start in (0..degree).step_by(len) {
            for offset in 0..half {
                let left = start + offset;
                let right = left + half;
                let u = values[left];
                let v = values[right];
                values[left] = add_mod(u, v, modulus);
                values[right] = mul_mod(roots[offset * step], sub_mod(u, v, modulus), modulus);
            }
        }
        len /= 2;
    }
}
