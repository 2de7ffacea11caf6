//! Dense tensor-network containers: site tensors, the explicit (Vidal) MPS,
//! matrix product operators and the truncated two-site SVD split.

pub mod error;
pub mod mpo;
pub mod mps;
pub mod tensor;
pub mod truncation;

pub use error::{Result, TnError};
pub use mpo::{Mpo, MpoTensor};
pub use mps::ExplicitMps;
pub use tensor::{Tensor3, TwoSite, C64};
pub use truncation::{split_two_site_tensor, Truncation};
