use crate::environment::{fold_left, Environment};
use crate::error::{DmrgError, Result};
use tn::{ExplicitMps, Mpo, C64};

/// `⟨ψ|H|ψ⟩` for a normalised MPS, by folding every left isometry into the
/// left boundary environment.
pub fn expectation(mps: &ExplicitMps, mpo: &Mpo) -> Result<f64> {
    if mps.len() != mpo.len() {
        return Err(DmrgError::LengthMismatch {
            mps: mps.len(),
            mpo: mpo.len(),
        });
    }

    let chi = mps.site(0)?.dl;
    let mut env = Environment::boundary(chi, mpo.left_bond_dim(), 0)?;
    for i in 0..mps.len() {
        env = fold_left(&env, &mps.single_site_left_iso(i)?, mpo.tensor(i)?)?;
    }

    let end = mpo.right_bond_dim() - 1;
    let last = mps.singular_values(mps.len())?;
    let mut acc = C64::new(0.0, 0.0);
    for (a, &s) in last.iter().enumerate() {
        acc += env.get(a, end, a) * (s * s);
    }
    Ok(acc.re)
}
