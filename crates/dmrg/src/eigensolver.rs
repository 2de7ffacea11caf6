//! Hermitian Lanczos with full re-orthogonalisation and Ritz-vector restarts.

use std::fmt;
use std::str::FromStr;

use faer::{Mat, Side};
use tracing::trace;

use crate::effective::LinearOperator;
use crate::error::{DmrgError, Result};
use tn::C64;

/// Relative size of the next Krylov residual below which the subspace is
/// taken to be invariant.
const BREAKDOWN: f64 = 1e-12;

/// Which extremal eigenpair to target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EigenMode {
    #[default]
    SmallestAlgebraic,
    LargestAlgebraic,
    SmallestMagnitude,
    LargestMagnitude,
}

impl EigenMode {
    pub fn code(&self) -> &'static str {
        match self {
            EigenMode::SmallestAlgebraic => "SA",
            EigenMode::LargestAlgebraic => "LA",
            EigenMode::SmallestMagnitude => "SM",
            EigenMode::LargestMagnitude => "LM",
        }
    }

    /// Targets that sit inside the spectrum rather than at one of its ends.
    pub fn is_interior(&self) -> bool {
        matches!(self, EigenMode::SmallestMagnitude)
    }

    /// Whether `a` is a better target than `b`.
    fn prefers(&self, a: f64, b: f64) -> bool {
        match self {
            EigenMode::SmallestAlgebraic => a < b,
            EigenMode::LargestAlgebraic => a > b,
            EigenMode::SmallestMagnitude => a.abs() < b.abs(),
            EigenMode::LargestMagnitude => a.abs() > b.abs(),
        }
    }
}

impl fmt::Display for EigenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EigenMode {
    type Err = DmrgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "sa" | "smallestalgebraic" => Ok(EigenMode::SmallestAlgebraic),
            "la" | "largestalgebraic" => Ok(EigenMode::LargestAlgebraic),
            "sm" | "smallestmagnitude" => Ok(EigenMode::SmallestMagnitude),
            "lm" | "largestmagnitude" => Ok(EigenMode::LargestMagnitude),
            _ => Err(DmrgError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LanczosConfig {
    /// Residual bound, relative to `max(1, |θ|)`.
    pub tolerance: f64,
    pub max_krylov: usize,
    pub max_restarts: usize,
    /// Interior targets on operators up to this dimension grow the Krylov
    /// space to the full dimension instead of restarting.
    pub max_interior_krylov: usize,
}

impl Default for LanczosConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_krylov: 40,
            max_restarts: 64,
            max_interior_krylov: 1024,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EigenPair {
    pub value: f64,
    /// Unit norm.
    pub vector: Vec<C64>,
    pub matvecs: usize,
}

/// Finds the eigenpair of the Hermitian operator `op` selected by `mode`,
/// starting the Krylov space from `guess`.
///
/// The same operator and guess always produce the same pair, which keeps
/// degenerate ground spaces from flipping between sweeps.
///
/// Extremal targets (SA, LA, LM) restart from the current Ritz vector.
/// A single Ritz vector cannot steer an interior target (SM), so on
/// operators of dimension at most `config.max_interior_krylov` the space is
/// grown until it is invariant and the pair is read off exactly.
pub fn lanczos<Op>(
    op: &Op,
    mode: EigenMode,
    guess: &[C64],
    config: &LanczosConfig,
) -> Result<EigenPair>
where
    Op: LinearOperator + ?Sized,
{
    let n = op.dim();
    if n == 0 {
        return Err(DmrgError::incompatible("operator has dimension zero"));
    }
    if guess.len() != n {
        return Err(DmrgError::incompatible(format!(
            "initial guess has length {}, operator dimension is {}",
            guess.len(),
            n
        )));
    }

    let mut start = guess.to_vec();
    if normalize(&mut start) == 0.0 {
        start = vec![C64::new(1.0 / (n as f64).sqrt(), 0.0); n];
    }

    let exhaustive = mode.is_interior() && n <= config.max_interior_krylov;
    let m_max = if exhaustive {
        n
    } else {
        config.max_krylov.max(1).min(n)
    };
    let mut matvecs = 0;
    let mut residual = f64::INFINITY;

    for restart in 0..=config.max_restarts {
        let mut basis: Vec<Vec<C64>> = vec![start];
        let mut alpha: Vec<f64> = Vec::with_capacity(m_max);
        let mut beta: Vec<f64> = Vec::with_capacity(m_max);
        let mut ritz = (0.0, vec![1.0]);
        let mut converged = false;

        for j in 0..m_max {
            let mut w = op.apply(&basis[j]);
            matvecs += 1;

            let a = dot(&basis[j], &w).re;
            alpha.push(a);
            axpy(&mut w, C64::new(-a, 0.0), &basis[j]);
            if j > 0 {
                axpy(&mut w, C64::new(-beta[j - 1], 0.0), &basis[j - 1]);
            }
            // twice is enough
            for _ in 0..2 {
                for q in &basis {
                    let overlap = dot(q, &w);
                    axpy(&mut w, -overlap, q);
                }
            }
            let b = norm(&w);

            let (theta, y) = select_ritz(&alpha, &beta, mode);
            residual = b * y.last().map_or(0.0, |v| v.abs());
            let scale = theta.abs().max(1.0);
            ritz = (theta, y);

            // an interior Ritz value can look converged before a closer
            // eigenvalue has entered the space
            let accepted = !exhaustive && residual <= config.tolerance * scale;
            if accepted || b <= BREAKDOWN * scale || basis.len() == n {
                converged = true;
                break;
            }
            if j + 1 == m_max {
                break;
            }

            beta.push(b);
            let inv = C64::new(1.0 / b, 0.0);
            basis.push(w.into_iter().map(|v| v * inv).collect());
        }

        let (theta, y) = ritz;
        let mut x = vec![C64::new(0.0, 0.0); n];
        for (q, &c) in basis.iter().zip(&y) {
            axpy(&mut x, C64::new(c, 0.0), q);
        }
        normalize(&mut x);

        if converged {
            trace!(restart, matvecs, residual, value = theta, "lanczos converged");
            return Ok(EigenPair {
                value: theta,
                vector: x,
                matvecs,
            });
        }
        trace!(restart, residual, value = theta, "lanczos restart");
        start = x;
    }

    Err(DmrgError::NotConverged {
        restarts: config.max_restarts,
        residual,
    })
}

/// Diagonalises the Lanczos tridiagonal and returns the targeted Ritz value
/// with its coordinates in the Krylov basis.
fn select_ritz(alpha: &[f64], beta: &[f64], mode: EigenMode) -> (f64, Vec<f64>) {
    let m = alpha.len();
    let mut t = Mat::<f64>::zeros(m, m);
    for i in 0..m {
        t.write(i, i, alpha[i]);
        if i > 0 {
            t.write(i, i - 1, beta[i - 1]);
            t.write(i - 1, i, beta[i - 1]);
        }
    }

    let eig = t.selfadjoint_eigendecomposition(Side::Lower);
    let s = eig.s().column_vector();
    let u = eig.u();

    let mut best = 0;
    for k in 1..m {
        if mode.prefers(s.read(k), s.read(best)) {
            best = k;
        }
    }
    (s.read(best), (0..m).map(|i| u.read(i, best)).collect())
}

fn dot(a: &[C64], b: &[C64]) -> C64 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

fn norm(a: &[C64]) -> f64 {
    a.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
}

fn axpy(y: &mut [C64], a: C64, x: &[C64]) {
    for (yv, xv) in y.iter_mut().zip(x) {
        *yv += a * xv;
    }
}

fn normalize(v: &mut [C64]) -> f64 {
    let nrm = norm(v);
    if nrm > 0.0 {
        for x in v.iter_mut() {
            *x /= nrm;
        }
    }
    nrm
}
