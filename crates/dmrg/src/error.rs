use std::fmt;

use thiserror::Error;
use tn::TnError;

/// Which environment sequence an index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DmrgError {
    #[error("MPS has {mps} sites but MPO has {mpo} sites")]
    LengthMismatch { mps: usize, mpo: usize },

    #[error("a chain of {0} site(s) has no bond to optimise")]
    TooShort(usize),

    #[error("incompatible dimensions: {message}")]
    IncompatibleBonds { message: String },

    #[error("bond {bond} out of range for a chain of {sites} sites")]
    BondOutOfRange { bond: usize, sites: usize },

    #[error("{side} environment {index} has not been computed")]
    MissingEnvironment { side: Side, index: usize },

    #[error("unknown eigensolver mode {0:?} (expected SA, LA, SM or LM)")]
    UnknownMode(String),

    #[error("eigensolver did not converge after {restarts} restarts (residual {residual:e})")]
    NotConverged { restarts: usize, residual: f64 },

    #[error("singular value {value:e} on bond {bond} is too small to un-absorb")]
    SingularGauge { bond: usize, value: f64 },

    #[error("tensor error: {0}")]
    Tensor(#[from] TnError),
}

impl DmrgError {
    pub(crate) fn incompatible(message: impl Into<String>) -> Self {
        DmrgError::IncompatibleBonds {
            message: message.into(),
        }
    }

    /// Raised before any numerical work: bad shapes, lengths or indices.
    pub fn is_configuration(&self) -> bool {
        !self.is_numerical()
    }

    /// Solver breakdown or an undefined gauge during a sweep.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            DmrgError::NotConverged { .. }
                | DmrgError::SingularGauge { .. }
                | DmrgError::Tensor(TnError::ZeroNorm)
        )
    }
}

pub type Result<T> = std::result::Result<T, DmrgError>;
