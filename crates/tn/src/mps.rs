use crate::error::{Result, TnError};
use crate::tensor::{Tensor3, TwoSite, C64};
use crate::truncation::{normalise, truncated_svd, TruncatedSvd, Truncation};
use rng::ShakeRng;

/// Largest state vector `to_dense` will build.
const MAX_DENSE_DIM: usize = 1 << 20;

/// MPS in Vidal form: site tensors `Γ_i` and singular values `Λ_0 … Λ_N`.
///
/// `Λ_i Γ_i` is a left isometry and `Γ_i Λ_{i+1}` a right isometry while the
/// chain is canonical. The boundary vectors `Λ_0` and `Λ_N` are `[1.0]`.
#[derive(Clone, Debug)]
pub struct ExplicitMps {
    sites: Vec<Tensor3>,
    singular_values: Vec<Vec<f64>>,
}

impl ExplicitMps {
    /// Product state `|s_0 s_1 …⟩` with local dimension `d`.
    pub fn product_state(d: usize, states: &[usize]) -> Result<Self> {
        if states.is_empty() {
            return Err(TnError::EmptyChain);
        }
        let mut sites = Vec::with_capacity(states.len());
        for &s in states {
            if s >= d {
                return Err(TnError::PhysicalIndex { index: s, dim: d });
            }
            let mut t = Tensor3::zeros(1, d, 1);
            t.set(0, s, 0, C64::new(1.0, 0.0));
            sites.push(t);
        }
        Ok(Self {
            sites,
            singular_values: vec![vec![1.0]; states.len() + 1],
        })
    }

    /// All qubits in `|0⟩`.
    pub fn new_zero(n: usize) -> Result<Self> {
        Self::product_state(2, &vec![0; n])
    }

    /// Random complex MPS with bond dimension at most `chi`, normalised and
    /// brought into Vidal form.
    pub fn random(n: usize, d: usize, chi: usize, rng: &mut ShakeRng) -> Result<Self> {
        if n == 0 {
            return Err(TnError::EmptyChain);
        }
        if d == 0 {
            return Err(TnError::PhysicalIndex { index: 0, dim: 0 });
        }
        if chi == 0 {
            return Err(TnError::ZeroMaxBond);
        }

        let bonds: Vec<usize> = (0..=n)
            .map(|b| capped_pow(d, b, chi).min(capped_pow(d, n - b, chi)))
            .collect();

        let scale = std::f64::consts::FRAC_1_SQRT_2;
        let mut sites = Vec::with_capacity(n);
        for i in 0..n {
            let len = bonds[i] * d * bonds[i + 1];
            let data = (0..len)
                .map(|_| {
                    C64::new(
                        rng.next_gaussian(b"MPS_RE") * scale,
                        rng.next_gaussian(b"MPS_IM") * scale,
                    )
                })
                .collect();
            sites.push(Tensor3::from_vec(bonds[i], d, bonds[i + 1], data)?);
        }

        Self::from_site_tensors(sites)
    }

    /// Brings an arbitrary open-boundary MPS into normalised Vidal form.
    ///
    /// A left-to-right SVD sweep makes the chain left-canonical, then a
    /// right-to-left sweep reads off the Schmidt values at every bond.
    pub fn from_site_tensors(mut sites: Vec<Tensor3>) -> Result<Self> {
        let n = sites.len();
        if n == 0 {
            return Err(TnError::EmptyChain);
        }
        if sites[0].dl != 1 {
            return Err(TnError::OpenBoundary {
                side: "left",
                dim: sites[0].dl,
            });
        }
        if sites[n - 1].dr != 1 {
            return Err(TnError::OpenBoundary {
                side: "right",
                dim: sites[n - 1].dr,
            });
        }
        for i in 0..n - 1 {
            if sites[i].dr != sites[i + 1].dl {
                return Err(TnError::BondMismatch {
                    bond: i + 1,
                    left: sites[i].dr,
                    right: sites[i + 1].dl,
                });
            }
        }

        let exact = Truncation {
            max_bond: usize::MAX,
            cutoff: 0.0,
        };

        for i in 0..n - 1 {
            let TruncatedSvd { u, s, v } = truncated_svd(&sites[i].to_left_matrix(), exact)?;
            let k = s.len();

            let t = &sites[i];
            let mut a = Tensor3::zeros(t.dl, t.dp, k);
            for l in 0..t.dl {
                for p in 0..t.dp {
                    for m in 0..k {
                        a.set(l, p, m, u.read(l * t.dp + p, m));
                    }
                }
            }

            let next = &sites[i + 1];
            let mut carried = Tensor3::zeros(k, next.dp, next.dr);
            for m in 0..k {
                for c in 0..next.dl {
                    let w = v.read(c, m).conj() * s[m];
                    for p in 0..next.dp {
                        for r in 0..next.dr {
                            let cur = carried.get(m, p, r);
                            carried.set(m, p, r, cur + w * next.get(c, p, r));
                        }
                    }
                }
            }

            sites[i] = a;
            sites[i + 1] = carried;
        }

        let norm = sites[n - 1].norm_sqr().sqrt();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(TnError::ZeroNorm);
        }
        for v in &mut sites[n - 1].data {
            *v /= norm;
        }

        let mut singular_values = vec![vec![1.0]; n + 1];
        let mut gammas = sites.clone();
        for i in (1..n).rev() {
            let TruncatedSvd { u, mut s, v } = truncated_svd(&sites[i].to_right_matrix(), exact)?;
            normalise(&mut s)?;
            let k = s.len();

            let t = &sites[i];
            let mut b = Tensor3::zeros(k, t.dp, t.dr);
            for m in 0..k {
                for p in 0..t.dp {
                    for r in 0..t.dr {
                        b.set(m, p, r, v.read(p * t.dr + r, m).conj());
                    }
                }
            }
            gammas[i] = b.scale_right(&reciprocal(&singular_values[i + 1]))?;

            let prev = &sites[i - 1];
            let mut absorbed = Tensor3::zeros(prev.dl, prev.dp, k);
            for l in 0..prev.dl {
                for p in 0..prev.dp {
                    for c in 0..prev.dr {
                        let x = prev.get(l, p, c);
                        for m in 0..k {
                            let cur = absorbed.get(l, p, m);
                            absorbed.set(l, p, m, cur + x * u.read(c, m) * s[m]);
                        }
                    }
                }
            }

            singular_values[i] = s;
            sites[i - 1] = absorbed;
        }
        gammas[0] = sites[0].scale_right(&reciprocal(&singular_values[1]))?;

        Ok(Self {
            sites: gammas,
            singular_values,
        })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[Tensor3] {
        &self.sites
    }

    pub fn site(&self, i: usize) -> Result<&Tensor3> {
        self.sites.get(i).ok_or(TnError::SiteOutOfRange {
            index: i,
            len: self.sites.len(),
        })
    }

    pub fn set_site(&mut self, i: usize, tensor: Tensor3) -> Result<()> {
        let len = self.sites.len();
        let slot = self
            .sites
            .get_mut(i)
            .ok_or(TnError::SiteOutOfRange { index: i, len })?;
        *slot = tensor;
        Ok(())
    }

    /// Singular values on bond `b`, between sites `b - 1` and `b`.
    pub fn singular_values(&self, b: usize) -> Result<&[f64]> {
        self.singular_values
            .get(b)
            .map(Vec::as_slice)
            .ok_or(TnError::SiteOutOfRange {
                index: b,
                len: self.singular_values.len(),
            })
    }

    pub fn set_singular_values(&mut self, b: usize, values: Vec<f64>) -> Result<()> {
        let len = self.singular_values.len();
        let slot = self
            .singular_values
            .get_mut(b)
            .ok_or(TnError::SiteOutOfRange { index: b, len })?;
        *slot = values;
        Ok(())
    }

    pub fn physical_dim(&self, i: usize) -> Result<usize> {
        Ok(self.site(i)?.dp)
    }

    /// Lengths of `Λ_0 … Λ_N`.
    pub fn bond_dims(&self) -> Vec<usize> {
        self.singular_values.iter().map(Vec::len).collect()
    }

    pub fn max_bond_dim(&self) -> usize {
        self.bond_dims().into_iter().max().unwrap_or(1)
    }

    /// Checks that every `Γ` agrees with the neighbouring `Λ` lengths.
    pub fn validate(&self) -> Result<()> {
        for (i, t) in self.sites.iter().enumerate() {
            if t.dl != self.singular_values[i].len() {
                return Err(TnError::BondMismatch {
                    bond: i,
                    left: self.singular_values[i].len(),
                    right: t.dl,
                });
            }
            if t.dr != self.singular_values[i + 1].len() {
                return Err(TnError::BondMismatch {
                    bond: i + 1,
                    left: t.dr,
                    right: self.singular_values[i + 1].len(),
                });
            }
        }
        Ok(())
    }

    /// `Λ_i Γ_i Λ_{i+1} Γ_{i+1} Λ_{i+2}`.
    pub fn two_site_tensor(&self, i: usize) -> Result<TwoSite> {
        let j = i + 1;
        let a = self.site(i)?;
        let b = self.site(j)?;
        let la = &self.singular_values[i];
        let lm = &self.singular_values[j];
        let lr = &self.singular_values[j + 1];

        let mut theta = TwoSite::zeros(a.dl, a.dp, b.dp, b.dr);
        for l in 0..a.dl {
            for p1 in 0..a.dp {
                for m in 0..a.dr {
                    let av = a.get(l, p1, m) * la[l] * lm[m];
                    if av == C64::new(0.0, 0.0) {
                        continue;
                    }
                    for p2 in 0..b.dp {
                        for r in 0..b.dr {
                            let cur = theta.get(l, p1, p2, r);
                            theta.set(l, p1, p2, r, cur + av * b.get(m, p2, r) * lr[r]);
                        }
                    }
                }
            }
        }
        Ok(theta)
    }

    /// `Λ_i Γ_i`.
    pub fn single_site_left_iso(&self, i: usize) -> Result<Tensor3> {
        self.site(i)?.scale_left(&self.singular_values[i])
    }

    /// `Γ_i Λ_{i+1}`.
    pub fn single_site_right_iso(&self, i: usize) -> Result<Tensor3> {
        self.site(i)?.scale_right(&self.singular_values[i + 1])
    }

    /// Von Neumann entropy of the Schmidt spectrum on bond `b`.
    pub fn entanglement_entropy(&self, b: usize) -> Result<f64> {
        Ok(self
            .singular_values(b)?
            .iter()
            .filter(|&&s| s > 0.0)
            .map(|&s| {
                let p = s * s;
                -p * p.ln()
            })
            .sum())
    }

    /// Full state vector, site 0 most significant.
    pub fn to_dense(&self) -> Result<Vec<C64>> {
        let mut dim = 1usize;
        for t in &self.sites {
            dim = dim.saturating_mul(t.dp);
        }
        if dim > MAX_DENSE_DIM {
            return Err(TnError::TooLargeForDense { dim });
        }

        // rows: physical configuration so far, columns: open right bond
        let mut state = vec![C64::new(1.0, 0.0)];
        let mut rows = 1usize;
        let mut bond = 1usize;
        for i in 0..self.sites.len() {
            let a = self.single_site_left_iso(i)?;
            if a.dl != bond {
                return Err(TnError::BondMismatch {
                    bond: i,
                    left: bond,
                    right: a.dl,
                });
            }
            let mut next = vec![C64::new(0.0, 0.0); rows * a.dp * a.dr];
            for s in 0..rows {
                for l in 0..a.dl {
                    let x = state[s * bond + l];
                    for p in 0..a.dp {
                        for r in 0..a.dr {
                            next[(s * a.dp + p) * a.dr + r] += x * a.get(l, p, r);
                        }
                    }
                }
            }
            state = next;
            rows *= a.dp;
            bond = a.dr;
        }

        let last = &self.singular_values[self.sites.len()];
        Ok((0..rows)
            .map(|s| {
                (0..bond)
                    .map(|r| state[s * bond + r] * last[r])
                    .sum()
            })
            .collect())
    }
}

fn reciprocal(values: &[f64]) -> Vec<f64> {
    values.iter().map(|s| 1.0 / s).collect()
}

fn capped_pow(base: usize, exp: usize, cap: usize) -> usize {
    let mut acc = 1usize;
    for _ in 0..exp {
        acc = acc.saturating_mul(base);
        if acc >= cap {
            return cap;
        }
    }
    acc.min(cap)
}
