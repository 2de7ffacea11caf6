//! Two-site finite-system DMRG.
//!
//! [`Dmrg`] owns (or exclusively borrows) an [`ExplicitMps`](tn::ExplicitMps)
//! and sweeps it towards the extremal eigenstate of an [`Mpo`](tn::Mpo).
//! Each bond update builds an [`EffectiveHamiltonian`] from the cached
//! [`Environment`]s, solves it with [`lanczos`], and splits the result back
//! into the chain with a truncated SVD.

pub mod effective;
pub mod eigensolver;
pub mod energy;
pub mod environment;
pub mod error;
pub mod optimizer;

pub use effective::{EffectiveHamiltonian, LinearOperator};
pub use eigensolver::{lanczos, EigenMode, EigenPair, LanczosConfig};
pub use energy::expectation;
pub use environment::{fold_left, fold_right, Environment};
pub use error::{DmrgError, Result, Side};
pub use optimizer::{Dmrg, DmrgOptions};
