//! Batch and seed-driven polynomial sampling over a context's ring.
//!
//! Unseeded batches draw one polynomial per rayon task from the thread-local
//! CSPRNG. Seeded calls read a single [`XofRng`] stream sequentially, so the
//! same `(seed, count)` always yields the same polynomials in the same order.

use super::{
    errors::{RingError, RingResult},
    matrix::{PolyMatrix, cell_count},
    ntt::NttContext,
};
use crate::math::{
    CenteredBinomial, DiscreteGaussian, Ternary, UniformModQ, XofRng, sample_poly,
};
use rand_distr::Distribution;
use rayon::prelude::*;
use std::sync::Arc;

impl NttContext {
    fn sample_batch<D>(&self, dist: &D, count: usize) -> RingResult<Vec<Vec<u64>>>
    where
        D: Distribution<u64> + Sync,
    {
        self.ensure_ready()?;
        let degree = self.degree();
        Ok((0..count)
            .into_par_iter()
            .map(|_| sample_poly(dist, degree, &mut rand::rng()))
            .collect())
    }

    fn sample_stream<D>(&self, dist: &D, count: usize, seed: &[u8]) -> RingResult<Vec<Vec<u64>>>
    where
        D: Distribution<u64>,
    {
        self.ensure_ready()?;
        let degree = self.degree();
        let mut xof = XofRng::from_seed_bytes(seed);
        Ok((0..count)
            .map(|_| sample_poly(dist, degree, &mut xof))
            .collect())
    }

    fn single(mut batch: Vec<Vec<u64>>) -> Vec<u64> {
        batch.pop().unwrap_or_default()
    }
}

// ─── Unseeded ────────────────────────────────────────────────────────────────

impl NttContext {
    /// `count` polynomials with coefficients uniform in `[0, Q)`.
    pub fn sample_uniform(&self, count: usize) -> RingResult<Vec<Vec<u64>>> {
        self.sample_batch(&UniformModQ::new(self.modulus())?, count)
    }

    pub fn sample_gaussian(&self, count: usize, sigma: f64) -> RingResult<Vec<Vec<u64>>> {
        self.sample_batch(&DiscreteGaussian::new(sigma, self.modulus())?, count)
    }

    /// Coefficients uniform over `{Q-1, 0, 1}`.
    pub fn sample_ternary(&self, count: usize) -> RingResult<Vec<Vec<u64>>> {
        self.sample_batch(&Ternary::balanced(self.modulus())?, count)
    }

    /// Coefficients non-zero with probability `density`, sign uniform.
    pub fn sample_ternary_sparse(
        &self,
        count: usize,
        density: f64,
    ) -> RingResult<Vec<Vec<u64>>> {
        self.sample_batch(&Ternary::with_density(self.modulus(), density)?, count)
    }

    /// Centered-binomial secret polynomial with parameter `eta`.
    pub fn sample_secret_key(&self, eta: u32) -> RingResult<Vec<u64>> {
        let dist = CenteredBinomial::new(eta, self.modulus())?;
        self.sample_batch(&dist, 1).map(Self::single)
    }

    pub fn sample_error(&self, sigma: f64) -> RingResult<Vec<u64>> {
        self.sample_gaussian(1, sigma).map(Self::single)
    }

    pub fn sample_mask(&self) -> RingResult<Vec<u64>> {
        self.sample_uniform(1).map(Self::single)
    }
}

// ─── Seeded ──────────────────────────────────────────────────────────────────

impl NttContext {
    pub fn sample_uniform_seeded(&self, count: usize, seed: &[u8]) -> RingResult<Vec<Vec<u64>>> {
        self.sample_stream(&UniformModQ::new(self.modulus())?, count, seed)
    }

    pub fn sample_gaussian_seeded(
        &self,
        count: usize,
        sigma: f64,
        seed: &[u8],
    ) -> RingResult<Vec<Vec<u64>>> {
        self.sample_stream(&DiscreteGaussian::new(sigma, self.modulus())?, count, seed)
    }

    pub fn sample_ternary_seeded(&self, count: usize, seed: &[u8]) -> RingResult<Vec<Vec<u64>>> {
        self.sample_stream(&Ternary::balanced(self.modulus())?, count, seed)
    }

    pub fn sample_ternary_sparse_seeded(
        &self,
        count: usize,
        density: f64,
        seed: &[u8],
    ) -> RingResult<Vec<Vec<u64>>> {
        self.sample_stream(&Ternary::with_density(self.modulus(), density)?, count, seed)
    }

    pub fn sample_secret_key_seeded(&self, eta: u32, seed: &[u8]) -> RingResult<Vec<u64>> {
        let dist = CenteredBinomial::new(eta, self.modulus())?;
        self.sample_stream(&dist, 1, seed).map(Self::single)
    }

    /// Expands a compact seed into `count` uniform polynomials.
    pub fn expand_seed(&self, seed: &[u8], count: usize) -> RingResult<Vec<Vec<u64>>> {
        self.sample_uniform_seeded(count, seed)
    }

    /// Uniform `rows x cols` matrix expanded from `seed`, tagged as
    /// coefficient domain. Cells are filled row-major from one stream.
    pub fn sample_matrix(
        self: &Arc<Self>,
        rows: usize,
        cols: usize,
        seed: &[u8],
    ) -> RingResult<PolyMatrix> {
        if rows == 0 || cols == 0 {
            return Err(RingError::InvalidParameter {
                message: format!("matrix dimensions must be non-zero, got {rows}x{cols}"),
            });
        }
        let cells = self.sample_uniform_seeded(cell_count(rows, cols)?, seed)?;
        Ok(PolyMatrix::new_unchecked(cells, Arc::clone(self), rows, cols, false))
    }

    pub fn sample_vector(&self, len: usize, seed: &[u8]) -> RingResult<Vec<Vec<u64>>> {
        self.sample_uniform_seeded(len, seed)
    }

    pub fn sample_gaussian_vector(
        &self,
        len: usize,
        sigma: f64,
        seed: &[u8],
    ) -> RingResult<Vec<Vec<u64>>> {
        self.sample_gaussian_seeded(len, sigma, seed)
    }
}
