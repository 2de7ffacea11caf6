use crate::error::{Result, TnError};
use crate::tensor::C64;

/// Largest operator dimension `to_dense` will build.
const MAX_DENSE_DIM: usize = 1 << 12;

/// Rank-4 MPO tensor, legs `(left virtual, right virtual, physical up,
/// physical down)`. The down leg acts on kets, the up leg on bras.
#[derive(Clone, Debug)]
pub struct MpoTensor {
    pub data: Vec<C64>,
    pub dl: usize,
    pub dr: usize,
    pub du: usize,
    pub dd: usize,
}

impl MpoTensor {
    pub fn zeros(dl: usize, dr: usize, du: usize, dd: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); dl * dr * du * dd],
            dl,
            dr,
            du,
            dd,
        }
    }

    #[inline]
    fn idx(&self, l: usize, r: usize, u: usize, d: usize) -> usize {
        ((l * self.dr + r) * self.du + u) * self.dd + d
    }

    pub fn get(&self, l: usize, r: usize, u: usize, d: usize) -> C64 {
        self.data[self.idx(l, r, u, d)]
    }

    pub fn set(&mut self, l: usize, r: usize, u: usize, d: usize, v: C64) {
        let i = self.idx(l, r, u, d);
        self.data[i] = v;
    }

    /// Writes a local `d × d` operator into the virtual block `(l, r)`.
    pub fn set_block<const D: usize>(&mut self, l: usize, r: usize, op: [[C64; D]; D]) {
        for (u, row) in op.iter().enumerate() {
            for (d, &v) in row.iter().enumerate() {
                self.set(l, r, u, d, v);
            }
        }
    }

    /// Whether the virtual block `(l, r)` is identically zero.
    pub fn block_is_zero(&self, l: usize, r: usize) -> bool {
        let start = self.idx(l, r, 0, 0);
        self.data[start..start + self.du * self.dd]
            .iter()
            .all(|v| v.re == 0.0 && v.im == 0.0)
    }
}

/// Hamiltonian as a chain of [`MpoTensor`]s. The left boundary index is
/// pinned to `0` and the right boundary index to `right_bond_dim() - 1`.
#[derive(Clone, Debug)]
pub struct Mpo {
    tensors: Vec<MpoTensor>,
}

impl Mpo {
    pub fn new(tensors: Vec<MpoTensor>) -> Result<Self> {
        if tensors.is_empty() {
            return Err(TnError::EmptyChain);
        }
        for (site, w) in tensors.iter().enumerate() {
            if w.du != w.dd {
                return Err(TnError::PhysicalMismatch {
                    site,
                    up: w.du,
                    down: w.dd,
                });
            }
        }
        for (bond, pair) in tensors.windows(2).enumerate() {
            if pair[0].dr != pair[1].dl {
                return Err(TnError::BondMismatch {
                    bond: bond + 1,
                    left: pair[0].dr,
                    right: pair[1].dl,
                });
            }
        }
        Ok(Self { tensors })
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn tensors(&self) -> &[MpoTensor] {
        &self.tensors
    }

    pub fn tensor(&self, i: usize) -> Result<&MpoTensor> {
        self.tensors.get(i).ok_or(TnError::SiteOutOfRange {
            index: i,
            len: self.tensors.len(),
        })
    }

    pub fn left_bond_dim(&self) -> usize {
        self.tensors[0].dl
    }

    pub fn right_bond_dim(&self) -> usize {
        self.tensors[self.tensors.len() - 1].dr
    }

    pub fn physical_dim(&self, i: usize) -> Result<usize> {
        Ok(self.tensor(i)?.dd)
    }

    /// Dense matrix `(dim, data)` in row-major order; rows are bra
    /// configurations, site 0 most significant.
    pub fn to_dense(&self) -> Result<(usize, Vec<C64>)> {
        let mut dim = 1usize;
        for w in &self.tensors {
            dim = dim.saturating_mul(w.dd);
        }
        if dim > MAX_DENSE_DIM {
            return Err(TnError::TooLargeForDense { dim });
        }

        // acc[(out, in, bond)] over the sites contracted so far
        let mut rows = 1usize;
        let mut bond = self.left_bond_dim();
        let mut acc = vec![C64::new(0.0, 0.0); bond];
        acc[0] = C64::new(1.0, 0.0);

        for w in &self.tensors {
            let next_rows = rows * w.dd;
            let mut next = vec![C64::new(0.0, 0.0); next_rows * next_rows * w.dr];
            for o in 0..rows {
                for i in 0..rows {
                    for l in 0..bond {
                        let x = acc[(o * rows + i) * bond + l];
                        if x.re == 0.0 && x.im == 0.0 {
                            continue;
                        }
                        for r in 0..w.dr {
                            for u in 0..w.du {
                                for d in 0..w.dd {
                                    let y = w.get(l, r, u, d);
                                    let oo = o * w.du + u;
                                    let ii = i * w.dd + d;
                                    next[(oo * next_rows + ii) * w.dr + r] += x * y;
                                }
                            }
                        }
                    }
                }
            }
            acc = next;
            rows = next_rows;
            bond = w.dr;
        }

        let end = bond - 1;
        let dense = (0..rows * rows).map(|k| acc[k * bond + end]).collect();
        Ok((rows, dense))
    }
}
