use crate::math::SamplingError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("ring degree must be a power of two, got {degree}")]
    InvalidDegree { degree: usize },
    #[error("modulus {modulus} is not an NTT-friendly prime for degree {degree}")]
    IncompatibleModulus { modulus: u64, degree: usize },
    #[error("modulus {modulus} exceeds the supported maximum {max}")]
    ModulusTooLarge { modulus: u64, max: u64 },
    #[error("no generator of the multiplicative group modulo {modulus}")]
    NoGenerator { modulus: u64 },
    #[error("transform context is closed")]
    NotInitialized,
    #[error("polynomial length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("{operation}: incompatible dimensions {left:?} and {right:?}")]
    DimensionMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("operands belong to different transform contexts")]
    ContextMismatch,
    #[error("{operation}: operands must be in the {} domain", if *expected_ntt { "NTT" } else { "coefficient" })]
    DomainMismatch {
        operation: &'static str,
        expected_ntt: bool,
    },
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },
    #[error("sampling: {0}")]
    Sampling(#[from] SamplingError),
}

pub type RingResult<T> = Result<T, RingError>;
