use thiserror::Error;

/// Errors raised while building or reshaping tensor-network containers.
#[derive(Debug, Error)]
pub enum TnError {
    #[error("empty chain: at least one site is required")]
    EmptyChain,

    #[error("bond {bond}: left tensor ends in {left}, right tensor starts with {right}")]
    BondMismatch {
        bond: usize,
        left: usize,
        right: usize,
    },

    #[error("tensor data has length {actual}, expected {expected}")]
    DataLength { expected: usize, actual: usize },

    #[error("index {index} out of range for a chain with {len} entries")]
    SiteOutOfRange { index: usize, len: usize },

    #[error("physical index {index} out of range for local dimension {dim}")]
    PhysicalIndex { index: usize, dim: usize },

    #[error("site {site}: physical dimensions {up} and {down} differ")]
    PhysicalMismatch { site: usize, up: usize, down: usize },

    #[error("boundary bond on the {side} has dimension {dim}, expected 1")]
    OpenBoundary { side: &'static str, dim: usize },

    #[error("maximum bond dimension must be at least 1")]
    ZeroMaxBond,

    #[error("tensor has vanishing norm")]
    ZeroNorm,

    #[error("dense representation of {dim} states is too large")]
    TooLargeForDense { dim: usize },
}

pub type Result<T> = std::result::Result<T, TnError>;
