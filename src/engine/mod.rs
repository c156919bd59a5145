//! Signing-ring facade: configuration, the [`RingEngine`] surface and the
//! process-wide default instance.

pub mod builder;
pub mod ring_engine;

pub use builder::{RingConfig, RingEngineBuilder, SamplingParams};
pub use ring_engine::{BACKEND, RingEngine, backend, global_engine};
