use crate::error::{Result, TnError};
use crate::tensor::{Tensor3, TwoSite, C64};
use faer::Mat;

/// Singular values below this fraction of the largest one are treated as
/// exact zeros, whatever the cutoff.
const NUMERICAL_ZERO: f64 = 1e-13;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Truncation {
    pub max_bond: usize,
    pub cutoff: f64,
}

impl Default for Truncation {
    fn default() -> Self {
        Self {
            max_bond: 64,
            cutoff: 1e-12,
        }
    }
}

/// `m ≈ u · diag(s) · v^H` keeping `s.len()` columns of `u` and `v`.
pub(crate) struct TruncatedSvd {
    pub u: Mat<C64>,
    pub s: Vec<f64>,
    pub v: Mat<C64>,
}

pub(crate) fn truncated_svd(m: &Mat<C64>, trunc: Truncation) -> Result<TruncatedSvd> {
    if trunc.max_bond == 0 {
        return Err(TnError::ZeroMaxBond);
    }

    let svd = m.thin_svd();
    let s = svd.s_diagonal();
    let largest = if s.nrows() > 0 { s.read(0).re } else { 0.0 };
    if !(largest > 0.0) || !largest.is_finite() {
        return Err(TnError::ZeroNorm);
    }
    let floor = largest * NUMERICAL_ZERO;

    let mut kept = 0;
    for i in 0..s.nrows() {
        let sv = s.read(i).re;
        if sv > trunc.cutoff && sv > floor && kept < trunc.max_bond {
            kept += 1;
        } else {
            break;
        }
    }
    // An empty bond would disconnect the chain; keep the dominant value.
    if kept == 0 {
        kept = 1;
    }

    let u_full = svd.u();
    let v_full = svd.v();
    let mut u = Mat::<C64>::zeros(u_full.nrows(), kept);
    let mut v = Mat::<C64>::zeros(v_full.nrows(), kept);
    let mut s_vals = Vec::with_capacity(kept);
    for m in 0..kept {
        s_vals.push(s.read(m).re);
        for row in 0..u_full.nrows() {
            u.write(row, m, u_full.read(row, m));
        }
        for row in 0..v_full.nrows() {
            v.write(row, m, v_full.read(row, m));
        }
    }

    Ok(TruncatedSvd { u, s: s_vals, v })
}

pub(crate) fn normalise(values: &mut [f64]) -> Result<()> {
    let norm = values.iter().map(|s| s * s).sum::<f64>().sqrt();
    if !(norm > 0.0) {
        return Err(TnError::ZeroNorm);
    }
    for s in values.iter_mut() {
        *s /= norm;
    }
    Ok(())
}

/// Splits `theta` into a left isometry, singular values and a right isometry.
///
/// At most `trunc.max_bond` values are kept, values at or below
/// `trunc.cutoff` are discarded, and at least one value always survives.
/// With `renormalise` the kept values are rescaled to unit Euclidean norm.
pub fn split_two_site_tensor(
    theta: &TwoSite,
    trunc: Truncation,
    renormalise: bool,
) -> Result<(Tensor3, Vec<f64>, Tensor3)> {
    let TruncatedSvd { u, mut s, v } = truncated_svd(&theta.to_matrix(), trunc)?;
    if renormalise {
        normalise(&mut s)?;
    }
    let kept = s.len();
    let (dl, d1, d2, dr) = (theta.dl, theta.d1, theta.d2, theta.dr);

    let mut left = Tensor3::zeros(dl, d1, kept);
    for l in 0..dl {
        for p in 0..d1 {
            for m in 0..kept {
                left.set(l, p, m, u.read(l * d1 + p, m));
            }
        }
    }

    let mut right = Tensor3::zeros(kept, d2, dr);
    for m in 0..kept {
        for p in 0..d2 {
            for r in 0..dr {
                right.set(m, p, r, v.read(p * dr + r, m).conj());
            }
        }
    }

    Ok((left, s, right))
}
