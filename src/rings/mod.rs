pub mod errors;
pub mod matrix;
pub mod ntt;
pub mod sampler;

pub use errors::{RingError, RingResult};
pub use matrix::PolyMatrix;
pub use ntt::NttContext;
