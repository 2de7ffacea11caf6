use faer::{Mat, Side};
use tn::{Mpo, TnError, C64};

/// All eigenvalues of the dense MPO matrix, ascending.
pub fn spectrum(mpo: &Mpo) -> Result<Vec<f64>, TnError> {
    let (dim, dense) = mpo.to_dense()?;
    let mut h = Mat::<C64>::zeros(dim, dim);
    for r in 0..dim {
        for c in 0..dim {
            h.write(r, c, dense[r * dim + c]);
        }
    }

    let eig = h.selfadjoint_eigendecomposition(Side::Lower);
    let s = eig.s().column_vector();
    let mut values: Vec<f64> = (0..dim).map(|i| s.read(i).re).collect();
    values.sort_by(f64::total_cmp);
    Ok(values)
}

pub fn ground_state_energy(mpo: &Mpo) -> Result<f64, TnError> {
    spectrum(mpo)?
        .first()
        .copied()
        .ok_or(TnError::EmptyChain)
}
