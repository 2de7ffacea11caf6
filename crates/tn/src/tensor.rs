use crate::error::{Result, TnError};
use faer::Mat;
use num_complex::Complex64;

pub type C64 = Complex64;

/// Rank-3 site tensor, legs `(left virtual, physical, right virtual)`,
/// stored row-major.
#[derive(Clone, Debug)]
pub struct Tensor3 {
    pub data: Vec<C64>,
    pub dl: usize,
    pub dp: usize,
    pub dr: usize,
}

impl Tensor3 {
    pub fn zeros(dl: usize, dp: usize, dr: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); dl * dp * dr],
            dl,
            dp,
            dr,
        }
    }

    pub fn from_vec(dl: usize, dp: usize, dr: usize, data: Vec<C64>) -> Result<Self> {
        if data.len() != dl * dp * dr {
            return Err(TnError::DataLength {
                expected: dl * dp * dr,
                actual: data.len(),
            });
        }
        Ok(Self { data, dl, dp, dr })
    }

    #[inline]
    fn idx(&self, l: usize, p: usize, r: usize) -> usize {
        (l * self.dp + p) * self.dr + r
    }

    pub fn get(&self, l: usize, p: usize, r: usize) -> C64 {
        self.data[self.idx(l, p, r)]
    }

    pub fn set(&mut self, l: usize, p: usize, r: usize, v: C64) {
        let i = self.idx(l, p, r);
        self.data[i] = v;
    }

    /// Multiplies the left virtual leg by `diag(weights)`.
    pub fn scale_left(&self, weights: &[f64]) -> Result<Self> {
        if weights.len() != self.dl {
            return Err(TnError::DataLength {
                expected: self.dl,
                actual: weights.len(),
            });
        }
        let mut out = self.clone();
        let stride = self.dp * self.dr;
        for (l, &w) in weights.iter().enumerate() {
            for v in &mut out.data[l * stride..(l + 1) * stride] {
                *v *= w;
            }
        }
        Ok(out)
    }

    /// Multiplies the right virtual leg by `diag(weights)`.
    pub fn scale_right(&self, weights: &[f64]) -> Result<Self> {
        if weights.len() != self.dr {
            return Err(TnError::DataLength {
                expected: self.dr,
                actual: weights.len(),
            });
        }
        let mut out = self.clone();
        for chunk in out.data.chunks_mut(self.dr) {
            for (v, &w) in chunk.iter_mut().zip(weights) {
                *v *= w;
            }
        }
        Ok(out)
    }

    pub fn norm_sqr(&self) -> f64 {
        self.data.iter().map(|v| v.norm_sqr()).sum()
    }

    /// Matrix view with rows `(l, p)` and columns `r`.
    pub fn to_left_matrix(&self) -> Mat<C64> {
        let mut m = Mat::<C64>::zeros(self.dl * self.dp, self.dr);
        for l in 0..self.dl {
            for p in 0..self.dp {
                for r in 0..self.dr {
                    m.write(l * self.dp + p, r, self.get(l, p, r));
                }
            }
        }
        m
    }

    /// Matrix view with rows `l` and columns `(p, r)`.
    pub fn to_right_matrix(&self) -> Mat<C64> {
        let mut m = Mat::<C64>::zeros(self.dl, self.dp * self.dr);
        for l in 0..self.dl {
            for p in 0..self.dp {
                for r in 0..self.dr {
                    m.write(l, p * self.dr + r, self.get(l, p, r));
                }
            }
        }
        m
    }
}

/// Two-site wavefunction `(left virtual, left physical, right physical, right virtual)`.
#[derive(Clone, Debug)]
pub struct TwoSite {
    pub data: Vec<C64>,
    pub dl: usize,
    pub d1: usize,
    pub d2: usize,
    pub dr: usize,
}

impl TwoSite {
    pub fn zeros(dl: usize, d1: usize, d2: usize, dr: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); dl * d1 * d2 * dr],
            dl,
            d1,
            d2,
            dr,
        }
    }

    pub fn from_vec(dl: usize, d1: usize, d2: usize, dr: usize, data: Vec<C64>) -> Result<Self> {
        let expected = dl * d1 * d2 * dr;
        if data.len() != expected {
            return Err(TnError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, dl, d1, d2, dr })
    }

    #[inline]
    fn idx(&self, l: usize, p1: usize, p2: usize, r: usize) -> usize {
        ((l * self.d1 + p1) * self.d2 + p2) * self.dr + r
    }

    pub fn get(&self, l: usize, p1: usize, p2: usize, r: usize) -> C64 {
        self.data[self.idx(l, p1, p2, r)]
    }

    pub fn set(&mut self, l: usize, p1: usize, p2: usize, r: usize, v: C64) {
        let i = self.idx(l, p1, p2, r);
        self.data[i] = v;
    }

    pub fn shape(&self) -> [usize; 4] {
        [self.dl, self.d1, self.d2, self.dr]
    }

    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Matrix with rows `(l, p1)` and columns `(p2, r)`; row-major data
    /// already has this grouping.
    pub fn to_matrix(&self) -> Mat<C64> {
        let cols = self.d2 * self.dr;
        let mut m = Mat::<C64>::zeros(self.dl * self.d1, cols);
        for (k, v) in self.data.iter().enumerate() {
            m.write(k / cols, k % cols, *v);
        }
        m
    }
}
