//! Typed error surface for the projection engine and its ambient loaders

use thiserror::Error;

/// Errors raised by the projection engine, its providers, and its CSV loaders
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("dimension mismatch: expected {expected}, got {actual} ({context})")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("index {index} out of range for axis {axis} (shape {shape}, offset {offset})")]
    IndexOutOfRange {
        axis: usize,
        index: i64,
        shape: usize,
        offset: i64,
    },

    #[error("slice requires capacity {required} but target only has {available}")]
    CapacityExceeded { required: usize, available: usize },

    #[error("invalid initial state {state} for a {dimension}-state model")]
    InvalidState { state: usize, dimension: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("payment type index {0} was injected more than once for the same category")]
    PaymentReinjection(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
