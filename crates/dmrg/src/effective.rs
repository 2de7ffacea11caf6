use crate::environment::Environment;
use crate::error::{DmrgError, Result};
use tn::{MpoTensor, C64};

/// Anything an iterative eigensolver can drive: a square operator known only
/// through its action on vectors.
pub trait LinearOperator {
    fn dim(&self) -> usize;

    fn apply(&self, x: &[C64]) -> Vec<C64>;
}

/// Two-site effective Hamiltonian
///
/// ```text
///  +--m                     s--+
///  |       p            r      |
///  L --n-- W1 ----o---- W2 --q-- R
///  |       j            k      |
///  +--i                     l--+
/// ```
///
/// acting on `x[i, j, k, l]`. Only the four factors are stored.
pub struct EffectiveHamiltonian<'a> {
    left: &'a Environment,
    w1: &'a MpoTensor,
    w2: &'a MpoTensor,
    right: &'a Environment,
    x_shape: [usize; 4],
}

impl<'a> EffectiveHamiltonian<'a> {
    pub fn new(
        left: &'a Environment,
        w1: &'a MpoTensor,
        w2: &'a MpoTensor,
        right: &'a Environment,
    ) -> Result<Self> {
        if left.bra != left.ket {
            return Err(DmrgError::incompatible(format!(
                "left environment is not square: bra {} ket {}",
                left.bra, left.ket
            )));
        }
        if right.bra != right.ket {
            return Err(DmrgError::incompatible(format!(
                "right environment is not square: bra {} ket {}",
                right.bra, right.ket
            )));
        }
        if left.op != w1.dl {
            return Err(DmrgError::incompatible(format!(
                "left environment operator leg {} against left MPO bond {}",
                left.op, w1.dl
            )));
        }
        if w1.dr != w2.dl {
            return Err(DmrgError::incompatible(format!(
                "MPO bond mismatch between active sites: {} vs {}",
                w1.dr, w2.dl
            )));
        }
        if w2.dr != right.op {
            return Err(DmrgError::incompatible(format!(
                "right MPO bond {} against right environment operator leg {}",
                w2.dr, right.op
            )));
        }
        for w in [w1, w2] {
            if w.du != w.dd {
                return Err(DmrgError::incompatible(format!(
                    "non-square local operator {}x{}",
                    w.du, w.dd
                )));
            }
        }

        Ok(Self {
            left,
            w1,
            w2,
            right,
            x_shape: [left.ket, w1.dd, w2.dd, right.ket],
        })
    }

    /// `(chi_left, d_left, d_right, chi_right)`
    pub fn x_shape(&self) -> [usize; 4] {
        self.x_shape
    }
}

impl LinearOperator for EffectiveHamiltonian<'_> {
    fn dim(&self) -> usize {
        self.x_shape.iter().product()
    }

    fn apply(&self, x: &[C64]) -> Vec<C64> {
        assert_eq!(x.len(), self.dim(), "vector length does not match operator");

        let [cl, d1, d2, cr] = self.x_shape;
        let (wl, wm, wr) = (self.left.op, self.w1.dr, self.w2.dr);
        let zero = C64::new(0.0, 0.0);
        let (l_env, r_env, w1, w2) = (self.left, self.right, self.w1, self.w2);

        // t1[m, n, j, k, l] = Σ_i L[m,n,i] x[i,j,k,l]
        let blk = d1 * d2 * cr;
        let mut t1 = vec![zero; cl * wl * blk];
        for m in 0..cl {
            for n in 0..wl {
                let dst = (m * wl + n) * blk;
                for i in 0..cl {
                    let lv = l_env.get(m, n, i);
                    if lv == zero {
                        continue;
                    }
                    let src = &x[i * blk..(i + 1) * blk];
                    for (t, xv) in t1[dst..dst + blk].iter_mut().zip(src) {
                        *t += lv * xv;
                    }
                }
            }
        }

        // t2[m, o, p, k, l] = Σ_{n,j} t1[m,n,j,k,l] W1[n,o,p,j]
        let kl = d2 * cr;
        let mut t2 = vec![zero; cl * wm * d1 * kl];
        for n in 0..wl {
            for o in 0..wm {
                if w1.block_is_zero(n, o) {
                    continue;
                }
                for p in 0..d1 {
                    for j in 0..d1 {
                        let y = w1.get(n, o, p, j);
                        if y == zero {
                            continue;
                        }
                        for m in 0..cl {
                            let dst = ((m * wm + o) * d1 + p) * kl;
                            let src = ((m * wl + n) * d1 + j) * kl;
                            for q in 0..kl {
                                t2[dst + q] += y * t1[src + q];
                            }
                        }
                    }
                }
            }
        }

        // t3[m, p, q, r, l] = Σ_{o,k} t2[m,o,p,k,l] W2[o,q,r,k]
        let mut t3 = vec![zero; cl * d1 * wr * d2 * cr];
        for o in 0..wm {
            for q in 0..wr {
                if w2.block_is_zero(o, q) {
                    continue;
                }
                for r in 0..d2 {
                    for k in 0..d2 {
                        let y = w2.get(o, q, r, k);
                        if y == zero {
                            continue;
                        }
                        for m in 0..cl {
                            for p in 0..d1 {
                                let dst = (((m * d1 + p) * wr + q) * d2 + r) * cr;
                                let src = (((m * wm + o) * d1 + p) * d2 + k) * cr;
                                for l in 0..cr {
                                    t3[dst + l] += y * t2[src + l];
                                }
                            }
                        }
                    }
                }
            }
        }

        // y[m, p, r, s] = Σ_{q,l} t3[m,p,q,r,l] R[s,q,l]
        let mut out = vec![zero; cl * d1 * d2 * cr];
        for m in 0..cl {
            for p in 0..d1 {
                for q in 0..wr {
                    for r in 0..d2 {
                        let src = (((m * d1 + p) * wr + q) * d2 + r) * cr;
                        let row = &t3[src..src + cr];
                        let dst = ((m * d1 + p) * d2 + r) * cr;
                        for s in 0..cr {
                            let mut acc = zero;
                            for (l, tv) in row.iter().enumerate() {
                                acc += tv * r_env.get(s, q, l);
                            }
                            out[dst + s] += acc;
                        }
                    }
                }
            }
        }
        out
    }
}
