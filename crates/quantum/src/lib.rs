//! Spin-chain models expressed as matrix product operators, plus dense
//! exact diagonalisation for small reference chains.

pub mod exact;
pub mod hamiltonian;
pub mod operators;

pub use hamiltonian::{Heisenberg, Ising};
