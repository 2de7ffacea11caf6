//! Environment tensors and the one-site folds that grow them.
//!
//! Legs are `(bra, op, ket)`: the bra leg meets the conjugated state, the op
//! leg the MPO virtual bond and the ket leg the state itself.

use crate::error::{DmrgError, Result};
use tn::{MpoTensor, Tensor3, C64};

#[derive(Clone, Debug)]
pub struct Environment {
    pub data: Vec<C64>,
    pub bra: usize,
    pub op: usize,
    pub ket: usize,
}

impl Environment {
    pub fn zeros(bra: usize, op: usize, ket: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); bra * op * ket],
            bra,
            op,
            ket,
        }
    }

    /// Identity on (bra, ket) with the operator leg pinned to `pinned`.
    pub fn boundary(chi: usize, op: usize, pinned: usize) -> Result<Self> {
        if pinned >= op {
            return Err(DmrgError::incompatible(format!(
                "boundary index {} outside operator bond of dimension {}",
                pinned, op
            )));
        }
        let mut env = Self::zeros(chi, op, chi);
        for a in 0..chi {
            env.set(a, pinned, a, C64::new(1.0, 0.0));
        }
        Ok(env)
    }

    #[inline]
    fn idx(&self, b: usize, w: usize, k: usize) -> usize {
        (b * self.op + w) * self.ket + k
    }

    pub fn get(&self, b: usize, w: usize, k: usize) -> C64 {
        self.data[self.idx(b, w, k)]
    }

    pub fn set(&mut self, b: usize, w: usize, k: usize, v: C64) {
        let i = self.idx(b, w, k);
        self.data[i] = v;
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.bra, self.op, self.ket]
    }

    /// Largest elementwise deviation; infinite when the shapes differ.
    pub fn max_abs_diff(&self, other: &Environment) -> f64 {
        if self.shape() != other.shape() {
            return f64::INFINITY;
        }
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }
}

fn check_site(a: &Tensor3, w: &MpoTensor) -> Result<()> {
    if a.dp != w.du || a.dp != w.dd {
        return Err(DmrgError::incompatible(format!(
            "state physical dimension {} against operator {}x{}",
            a.dp, w.du, w.dd
        )));
    }
    Ok(())
}

/// Absorbs one site from the left:
/// `L'[b',w',k'] = Σ L[b,w,k] conj(A[b,p,b']) W[w,w',p,p'] A[k,p',k']`.
pub fn fold_left(env: &Environment, a: &Tensor3, w: &MpoTensor) -> Result<Environment> {
    check_site(a, w)?;
    if env.bra != a.dl || env.ket != a.dl || env.op != w.dl {
        return Err(DmrgError::incompatible(format!(
            "left environment {:?} against site ({}, {}, {}) and operator bond {}",
            env.shape(),
            a.dl,
            a.dp,
            a.dr,
            w.dl
        )));
    }
    let (nb, nw, np, nk, nw2) = (a.dl, w.dl, a.dp, a.dr, w.dr);
    let zero = C64::new(0.0, 0.0);

    // t1[b, w, p', k'] = Σ_k L[b,w,k] A[k,p',k']
    let mut t1 = vec![zero; nb * nw * np * nk];
    for b in 0..nb {
        for wl in 0..nw {
            for k in 0..a.dl {
                let x = env.get(b, wl, k);
                if x == zero {
                    continue;
                }
                for p in 0..np {
                    for kk in 0..nk {
                        t1[((b * nw + wl) * np + p) * nk + kk] += x * a.get(k, p, kk);
                    }
                }
            }
        }
    }

    // t2[b, p, w', k'] = Σ_{w,p'} t1[b,w,p',k'] W[w,w',p,p']
    let mut t2 = vec![zero; nb * np * nw2 * nk];
    for wl in 0..nw {
        for wr in 0..nw2 {
            if w.block_is_zero(wl, wr) {
                continue;
            }
            for p in 0..np {
                for pp in 0..np {
                    let y = w.get(wl, wr, p, pp);
                    if y == zero {
                        continue;
                    }
                    for b in 0..nb {
                        for kk in 0..nk {
                            t2[((b * np + p) * nw2 + wr) * nk + kk] +=
                                t1[((b * nw + wl) * np + pp) * nk + kk] * y;
                        }
                    }
                }
            }
        }
    }

    // L'[b', w', k'] = Σ_{b,p} conj(A[b,p,b']) t2[b,p,w',k']
    let mut out = Environment::zeros(nk, nw2, nk);
    for b in 0..nb {
        for p in 0..np {
            for bb in 0..nk {
                let x = a.get(b, p, bb).conj();
                if x == zero {
                    continue;
                }
                for wr in 0..nw2 {
                    for kk in 0..nk {
                        let cur = out.get(bb, wr, kk);
                        out.set(bb, wr, kk, cur + x * t2[((b * np + p) * nw2 + wr) * nk + kk]);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Absorbs one site from the right:
/// `R'[b,w,k] = Σ conj(B[b,p,b']) W[w,w',p,p'] B[k,p',k'] R[b',w',k']`.
pub fn fold_right(env: &Environment, bt: &Tensor3, w: &MpoTensor) -> Result<Environment> {
    check_site(bt, w)?;
    if env.bra != bt.dr || env.ket != bt.dr || env.op != w.dr {
        return Err(DmrgError::incompatible(format!(
            "right environment {:?} against site ({}, {}, {}) and operator bond {}",
            env.shape(),
            bt.dl,
            bt.dp,
            bt.dr,
            w.dr
        )));
    }
    let (nk, np, nb, nw2, nw) = (bt.dl, bt.dp, bt.dr, w.dr, w.dl);
    let zero = C64::new(0.0, 0.0);

    // t1[k, p', b', w'] = Σ_{k'} B[k,p',k'] R[b',w',k']
    let mut t1 = vec![zero; nk * np * nb * nw2];
    for k in 0..nk {
        for pp in 0..np {
            for kk in 0..nb {
                let x = bt.get(k, pp, kk);
                if x == zero {
                    continue;
                }
                for bb in 0..nb {
                    for wr in 0..nw2 {
                        t1[((k * np + pp) * nb + bb) * nw2 + wr] += x * env.get(bb, wr, kk);
                    }
                }
            }
        }
    }

    // t2[k, w, p, b'] = Σ_{p',w'} W[w,w',p,p'] t1[k,p',b',w']
    let mut t2 = vec![zero; nk * nw * np * nb];
    for wl in 0..nw {
        for wr in 0..nw2 {
            if w.block_is_zero(wl, wr) {
                continue;
            }
            for p in 0..np {
                for pp in 0..np {
                    let y = w.get(wl, wr, p, pp);
                    if y == zero {
                        continue;
                    }
                    for k in 0..nk {
                        for bb in 0..nb {
                            t2[((k * nw + wl) * np + p) * nb + bb] +=
                                y * t1[((k * np + pp) * nb + bb) * nw2 + wr];
                        }
                    }
                }
            }
        }
    }

    // R'[b, w, k] = Σ_{p,b'} conj(B[b,p,b']) t2[k,w,p,b']
    let mut out = Environment::zeros(nk, nw, nk);
    for b in 0..nk {
        for p in 0..np {
            for bb in 0..nb {
                let x = bt.get(b, p, bb).conj();
                if x == zero {
                    continue;
                }
                for wl in 0..nw {
                    for k in 0..nk {
                        let cur = out.get(b, wl, k);
                        out.set(b, wl, k, cur + x * t2[((k * nw + wl) * np + p) * nb + bb]);
                    }
                }
            }
        }
    }
    Ok(out)
}
