//! NTT, polynomial-matrix and sampling primitives for Ring-LWE threshold
//! signatures over `Z_Q[X]`.
//!
//! - [`math`]: modular kernel, primality, coefficient distributions and the
//!   seeded BLAKE3 stream.
//! - [`rings`]: the transform context, polynomial matrices and batch sampling.
//! - [`engine`]: configuration and the signing-ring facade.

pub mod engine;
pub mod math;
pub mod rings;

pub use engine::{RingConfig, RingEngine, RingEngineBuilder, SamplingParams, global_engine};
pub use math::{DEFAULT_DEGREE, DEFAULT_Q, SIGNATURE_Q, XofRng};
pub use rings::{NttContext, PolyMatrix, RingError, RingResult};
