use super::RingEngine;
use crate::{
    math::{DEFAULT_DEGREE, SIGNATURE_Q, sampling::MAX_ETA},
    rings::{RingError, RingResult},
};

/// Ring parameters consumed by [`RingEngine`]. Zero fields select the
/// signature-ring defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    pub degree: usize,
    pub modulus: u64,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            modulus: SIGNATURE_Q,
        }
    }
}

impl RingConfig {
    pub(crate) fn resolved(self) -> Self {
        let defaults = Self::default();
        Self {
            degree: if self.degree == 0 { defaults.degree } else { self.degree },
            modulus: if self.modulus == 0 { defaults.modulus } else { self.modulus },
        }
    }
}

/// Noise parameters chosen by the signing protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Gaussian standard deviation for error polynomials.
    pub sigma: f64,
    /// Centered-binomial parameter for secret keys.
    pub eta: u32,
    /// Probability that a sparse ternary coefficient is non-zero.
    pub ternary_density: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            sigma: 3.2,
            eta: 2,
            ternary_density: 2.0 / 3.0,
        }
    }
}

impl SamplingParams {
    pub fn validate(&self) -> RingResult<()> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(RingError::InvalidParameter {
                message: format!("sigma must be finite and positive, got {}", self.sigma),
            });
        }
        if self.eta == 0 || self.eta > MAX_ETA {
            return Err(RingError::InvalidParameter {
                message: format!("eta must be in 1..={MAX_ETA}, got {}", self.eta),
            });
        }
        if !(self.ternary_density > 0.0 && self.ternary_density <= 1.0) {
            return Err(RingError::InvalidParameter {
                message: format!(
                    "ternary density must be in (0, 1], got {}",
                    self.ternary_density
                ),
            });
        }
        Ok(())
    }
}

pub struct RingEngineBuilder {
    degree: Option<usize>,
    modulus: Option<u64>,
    sampling: Option<SamplingParams>,
}

impl Default for RingEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RingEngineBuilder {
    pub fn new() -> Self {
        Self {
            degree: None,
            modulus: None,
            sampling: None,
        }
    }

    pub fn degree(mut self, degree: usize) -> Self {
        self.degree = Some(degree);
        self
    }

    pub fn modulus(mut self, modulus: u64) -> Self {
        self.modulus = Some(modulus);
        self
    }

    pub fn config(mut self, config: RingConfig) -> Self {
        self.degree = Some(config.degree);
        self.modulus = Some(config.modulus);
        self
    }

    pub fn sampling(mut self, params: SamplingParams) -> Self {
        self.sampling = Some(params);
        self
    }

    pub fn build(self) -> RingResult<RingEngine> {
        let defaults = RingConfig::default();
        let config = RingConfig {
            degree: self.degree.unwrap_or(defaults.degree),
            modulus: self.modulus.unwrap_or(defaults.modulus),
        };
        RingEngine::with_params(config, self.sampling.unwrap_or_default())
    }
}
