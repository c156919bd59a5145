use super::builder::{RingConfig, RingEngineBuilder, SamplingParams};
use crate::rings::{NttContext, PolyMatrix, RingError, RingResult};
use rayon::prelude::*;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};

/// Name of the arithmetic backend in use.
pub const BACKEND: &str = "cpu";

pub fn backend() -> &'static str {
    BACKEND
}

/// Signing-ring surface over one shared [`NttContext`].
///
/// Polynomials passed in and out are plain coefficient vectors; the caller
/// tracks which domain each one is in.
#[derive(Debug)]
pub struct RingEngine {
    context: Arc<NttContext>,
    config: RingConfig,
    sampling: SamplingParams,
}

impl RingEngine {
    pub fn builder() -> RingEngineBuilder {
        RingEngineBuilder::new()
    }

    pub fn new(config: RingConfig) -> RingResult<Self> {
        Self::with_params(config, SamplingParams::default())
    }

    #[instrument(level = "debug")]
    pub fn with_params(config: RingConfig, sampling: SamplingParams) -> RingResult<Self> {
        sampling.validate()?;
        let config = config.resolved();
        let context = Arc::new(NttContext::new(config.degree, config.modulus)?);
        info!(
            degree = config.degree,
            modulus = config.modulus,
            backend = BACKEND,
            "ring engine ready"
        );
        Ok(Self {
            context,
            config,
            sampling,
        })
    }

    pub fn context(&self) -> &Arc<NttContext> {
        &self.context
    }

    pub fn config(&self) -> RingConfig {
        self.config
    }

    pub fn sampling_params(&self) -> &SamplingParams {
        &self.sampling
    }

    pub fn backend(&self) -> &'static str {
        BACKEND
    }

    pub fn is_ready(&self) -> bool {
        self.context.is_ready()
    }

    /// Closes the underlying context; every later operation fails with
    /// [`RingError::NotInitialized`].
    pub fn close(&self) {
        self.context.close();
    }
}

// ─── Transforms & polynomial arithmetic ──────────────────────────────────────

impl RingEngine {
    pub fn ntt_forward(&self, polys: &[Vec<u64>]) -> RingResult<Vec<Vec<u64>>> {
        self.context.forward(polys)
    }

    pub fn ntt_inverse(&self, polys: &[Vec<u64>]) -> RingResult<Vec<Vec<u64>>> {
        self.context.inverse(polys)
    }

    /// Forward transform of every entry of a polynomial vector.
    pub fn vector_ntt_forward(&self, vector: &[Vec<u64>]) -> RingResult<Vec<Vec<u64>>> {
        self.context.forward(vector)
    }

    pub fn vector_ntt_inverse(&self, vector: &[Vec<u64>]) -> RingResult<Vec<Vec<u64>>> {
        self.context.inverse(vector)
    }

    /// Slot-wise product of two NTT-domain polynomials.
    pub fn poly_mul_ntt(&self, a: &[u64], b: &[u64]) -> RingResult<Vec<u64>> {
        self.context.ensure_ready()?;
        self.context.pointwise_mul(a, b)
    }

    /// Pairwise products of coefficient-domain polynomials, computed as
    /// forward transform, slot-wise product, inverse transform.
    pub fn poly_mul(&self, a: &[Vec<u64>], b: &[Vec<u64>]) -> RingResult<Vec<Vec<u64>>> {
        if a.len() != b.len() {
            return Err(RingError::LengthMismatch {
                expected: a.len(),
                actual: b.len(),
            });
        }
        let a_ntt = self.context.forward(a)?;
        let b_ntt = self.context.forward(b)?;
        let products = a_ntt
            .par_iter()
            .zip(b_ntt.par_iter())
            .map(|(x, y)| self.context.pointwise_mul(x, y))
            .collect::<RingResult<Vec<_>>>()?;
        self.context.inverse(&products)
    }

    pub fn poly_add(&self, a: &[u64], b: &[u64]) -> RingResult<Vec<u64>> {
        self.context.ensure_ready()?;
        self.context.poly_add(a, b)
    }

    pub fn poly_sub(&self, a: &[u64], b: &[u64]) -> RingResult<Vec<u64>> {
        self.context.ensure_ready()?;
        self.context.poly_sub(a, b)
    }

    pub fn poly_scalar_mul(&self, a: &[u64], scalar: u64) -> RingResult<Vec<u64>> {
        self.context.ensure_ready()?;
        self.context.poly_scalar_mul(a, scalar)
    }

    /// `M · v` for an NTT-domain matrix given as rows of polynomials.
    pub fn matrix_vector_mul(
        &self,
        matrix: &[Vec<Vec<u64>>],
        vector: &[Vec<u64>],
    ) -> RingResult<Vec<Vec<u64>>> {
        self.context.ensure_ready()?;
        let m = PolyMatrix::from_rows(Arc::clone(&self.context), matrix.to_vec(), true)?;
        m.mul_vec(vector)
    }
}

// ─── Seeded sampling ─────────────────────────────────────────────────────────

impl RingEngine {
    pub fn sample_uniform(&self, seed: &[u8]) -> RingResult<Vec<u64>> {
        Ok(first(self.context.sample_uniform_seeded(1, seed)?))
    }

    pub fn sample_gaussian(&self, sigma: f64, seed: &[u8]) -> RingResult<Vec<u64>> {
        Ok(first(self.context.sample_gaussian_seeded(1, sigma, seed)?))
    }

    pub fn sample_ternary(&self, density: f64, seed: &[u8]) -> RingResult<Vec<u64>> {
        Ok(first(
            self.context.sample_ternary_sparse_seeded(1, density, seed)?,
        ))
    }

    /// Gaussian error polynomial with the configured `sigma`.
    pub fn sample_error(&self, seed: &[u8]) -> RingResult<Vec<u64>> {
        self.sample_gaussian(self.sampling.sigma, seed)
    }

    /// Centered-binomial secret with the configured `eta`.
    pub fn sample_secret_key(&self, seed: &[u8]) -> RingResult<Vec<u64>> {
        self.context.sample_secret_key_seeded(self.sampling.eta, seed)
    }

    /// Sparse ternary polynomial with the configured density.
    pub fn sample_sparse_ternary(&self, seed: &[u8]) -> RingResult<Vec<u64>> {
        self.sample_ternary(self.sampling.ternary_density, seed)
    }
}

fn first(mut polys: Vec<Vec<u64>>) -> Vec<u64> {
    polys.pop().unwrap_or_default()
}

// ─── Process-wide instance ───────────────────────────────────────────────────

static GLOBAL_ENGINE: OnceLock<RingResult<RingEngine>> = OnceLock::new();

/// Shared engine over the default signature ring, built on first use.
///
/// Construction runs at most once; every caller sees the same engine or the
/// same construction error. Closing it closes it for the whole process.
pub fn global_engine() -> RingResult<&'static RingEngine> {
    GLOBAL_ENGINE
        .get_or_init(|| {
            debug!("initialising global ring engine");
            RingEngine::new(RingConfig::default())
        })
        .as_ref()
        .map_err(Clone::clone)
}
