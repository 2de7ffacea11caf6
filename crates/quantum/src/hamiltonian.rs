use crate::operators::{add, identity, pauli_x, pauli_y, pauli_z, scaled};
use tn::{Mpo, MpoTensor, TnError};

/// `H = Σ J_i Z_i Z_{i+1} + Σ hx_i X_i + Σ hz_i Z_i`
#[derive(Clone, Debug)]
pub struct Ising {
    /// transverse fields hx_i * X_i
    pub x_fields: Vec<f64>,
    /// longitudinal fields hz_i * Z_i
    pub z_fields: Vec<f64>,
    /// nearest-neighbor couplings J_i * Z_i Z_{i+1}
    pub zz_couplings: Vec<f64>,
}

impl Ising {
    pub fn transverse(n: usize, j: f64, g: f64) -> Self {
        Self {
            x_fields: vec![g; n],
            z_fields: vec![0.0; n],
            zz_couplings: vec![j; n.saturating_sub(1)],
        }
    }

    pub fn len(&self) -> usize {
        self.x_fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_fields.is_empty()
    }

    /// Bond dimension 3: `[I, J Z, h] / [0, 0, Z] / [0, 0, I]`.
    pub fn to_mpo(&self) -> Result<Mpo, TnError> {
        let n = self.len();
        check_lengths(n, self.z_fields.len(), self.zz_couplings.len())?;

        let mut tensors = Vec::with_capacity(n);
        for i in 0..n {
            let mut w = MpoTensor::zeros(3, 3, 2, 2);
            let onsite = add(
                scaled(pauli_x(), self.x_fields[i]),
                scaled(pauli_z(), self.z_fields[i]),
            );
            w.set_block(0, 0, identity());
            if i + 1 < n {
                w.set_block(0, 1, scaled(pauli_z(), self.zz_couplings[i]));
            }
            w.set_block(0, 2, onsite);
            w.set_block(1, 2, pauli_z());
            w.set_block(2, 2, identity());
            tensors.push(boundary_slice(&w, i, n));
        }
        Mpo::new(tensors)
    }
}

/// `H = Σ (jx X X + jy Y Y + jz Z Z) + Σ h_i Z_i`
#[derive(Clone, Debug)]
pub struct Heisenberg {
    pub jx: Vec<f64>,
    pub jy: Vec<f64>,
    pub jz: Vec<f64>,
    pub z_fields: Vec<f64>,
}

impl Heisenberg {
    pub fn uniform(n: usize, j: f64) -> Self {
        Self::xxz(n, j, 1.0)
    }

    pub fn xxz(n: usize, j: f64, delta: f64) -> Self {
        Self {
            jx: vec![j; n.saturating_sub(1)],
            jy: vec![j; n.saturating_sub(1)],
            jz: vec![j * delta; n.saturating_sub(1)],
            z_fields: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.z_fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z_fields.is_empty()
    }

    /// Bond dimension 5; the `Y Y` channel makes the tensors complex.
    pub fn to_mpo(&self) -> Result<Mpo, TnError> {
        let n = self.len();
        for couplings in [&self.jx, &self.jy, &self.jz] {
            check_lengths(n, n, couplings.len())?;
        }

        let mut tensors = Vec::with_capacity(n);
        for i in 0..n {
            let mut w = MpoTensor::zeros(5, 5, 2, 2);
            w.set_block(0, 0, identity());
            if i + 1 < n {
                w.set_block(0, 1, scaled(pauli_x(), self.jx[i]));
                w.set_block(0, 2, scaled(pauli_y(), self.jy[i]));
                w.set_block(0, 3, scaled(pauli_z(), self.jz[i]));
            }
            w.set_block(0, 4, scaled(pauli_z(), self.z_fields[i]));
            w.set_block(1, 4, pauli_x());
            w.set_block(2, 4, pauli_y());
            w.set_block(3, 4, pauli_z());
            w.set_block(4, 4, identity());
            tensors.push(boundary_slice(&w, i, n));
        }
        Mpo::new(tensors)
    }
}

fn check_lengths(n: usize, fields: usize, couplings: usize) -> Result<(), TnError> {
    if n == 0 {
        return Err(TnError::EmptyChain);
    }
    if fields != n {
        return Err(TnError::DataLength {
            expected: n,
            actual: fields,
        });
    }
    if couplings != n - 1 {
        return Err(TnError::DataLength {
            expected: n - 1,
            actual: couplings,
        });
    }
    Ok(())
}

/// Keeps only the start row on the first site and the end column on the last.
fn boundary_slice(bulk: &MpoTensor, i: usize, n: usize) -> MpoTensor {
    let end = bulk.dr - 1;
    let rows: Vec<usize> = if i == 0 { vec![0] } else { (0..bulk.dl).collect() };
    let cols: Vec<usize> = if i + 1 == n { vec![end] } else { (0..bulk.dr).collect() };

    let mut out = MpoTensor::zeros(rows.len(), cols.len(), bulk.du, bulk.dd);
    for (l, &row) in rows.iter().enumerate() {
        for (r, &col) in cols.iter().enumerate() {
            for u in 0..bulk.du {
                for d in 0..bulk.dd {
                    out.set(l, r, u, d, bulk.get(row, col, u, d));
                }
            }
        }
    }
    out
}
