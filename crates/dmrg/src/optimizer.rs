use std::ops::{Deref, DerefMut};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, trace};

use crate::effective::EffectiveHamiltonian;
use crate::eigensolver::{lanczos, EigenMode, LanczosConfig};
use crate::energy::expectation;
use crate::environment::{fold_left, fold_right, Environment};
use crate::error::{DmrgError, Result, Side};
use tn::{split_two_site_tensor, ExplicitMps, Mpo, TnError, Truncation, TwoSite};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DmrgOptions {
    /// Largest bond dimension kept by the two-site split.
    pub chi_max: usize,
    /// Singular values at or below this are discarded.
    pub cut: f64,
    pub mode: EigenMode,
    pub lanczos: LanczosConfig,
    /// Hide the progress bar in [`Dmrg::run`].
    pub silent: bool,
}

impl Default for DmrgOptions {
    fn default() -> Self {
        Self {
            chi_max: 32,
            cut: 1e-12,
            mode: EigenMode::SmallestAlgebraic,
            lanczos: LanczosConfig::default(),
            silent: true,
        }
    }
}

impl DmrgOptions {
    pub fn truncation(&self) -> Truncation {
        Truncation {
            max_bond: self.chi_max,
            cutoff: self.cut,
        }
    }
}

/// Working state: a private copy or an exclusive borrow of the caller's MPS.
enum MpsSlot<'a> {
    Owned(ExplicitMps),
    Borrowed(&'a mut ExplicitMps),
}

impl Deref for MpsSlot<'_> {
    type Target = ExplicitMps;

    fn deref(&self) -> &ExplicitMps {
        match self {
            MpsSlot::Owned(m) => m,
            MpsSlot::Borrowed(m) => m,
        }
    }
}

impl DerefMut for MpsSlot<'_> {
    fn deref_mut(&mut self) -> &mut ExplicitMps {
        match self {
            MpsSlot::Owned(m) => m,
            MpsSlot::Borrowed(m) => m,
        }
    }
}

/// Two-site DMRG sweep engine.
///
/// `left_environments[i]` holds everything strictly left of site `i`,
/// `right_environments[i]` everything strictly right of it. Slots are
/// refreshed explicitly by the bond updates; a slot that was never produced
/// stays `None`.
pub struct Dmrg<'a> {
    mps: MpsSlot<'a>,
    mpo: &'a Mpo,
    options: DmrgOptions,
    left_environments: Vec<Option<Environment>>,
    right_environments: Vec<Option<Environment>>,
    energies: Vec<f64>,
}

impl<'a> Dmrg<'a> {
    /// Works on a private copy; `mps` is left untouched.
    pub fn new(mps: &ExplicitMps, mpo: &'a Mpo, options: DmrgOptions) -> Result<Self> {
        Self::with_slot(MpsSlot::Owned(mps.clone()), mpo, options)
    }

    pub fn from_owned(mps: ExplicitMps, mpo: &'a Mpo, options: DmrgOptions) -> Result<Self> {
        Self::with_slot(MpsSlot::Owned(mps), mpo, options)
    }

    /// Optimises `mps` in place for as long as the optimiser lives.
    pub fn in_place(mps: &'a mut ExplicitMps, mpo: &'a Mpo, options: DmrgOptions) -> Result<Self> {
        Self::with_slot(MpsSlot::Borrowed(mps), mpo, options)
    }

    fn with_slot(mps: MpsSlot<'a>, mpo: &'a Mpo, options: DmrgOptions) -> Result<Self> {
        let n = mps.len();
        if n != mpo.len() {
            return Err(DmrgError::LengthMismatch {
                mps: n,
                mpo: mpo.len(),
            });
        }
        if n < 2 {
            return Err(DmrgError::TooShort(n));
        }
        if options.chi_max == 0 {
            return Err(TnError::ZeroMaxBond.into());
        }
        mps.validate()?;
        for i in 0..n {
            let (d_state, d_op) = (mps.physical_dim(i)?, mpo.physical_dim(i)?);
            if d_state != d_op {
                return Err(DmrgError::incompatible(format!(
                    "site {}: MPS physical dimension {} but MPO acts on {}",
                    i, d_state, d_op
                )));
            }
        }

        let chi_left = mps.site(0)?.dl;
        let chi_right = mps.site(n - 1)?.dr;
        let right_end = mpo.right_bond_dim() - 1;

        let mut left_environments = vec![None; n];
        let mut right_environments = vec![None; n];
        left_environments[0] = Some(Environment::boundary(chi_left, mpo.left_bond_dim(), 0)?);
        right_environments[n - 1] = Some(Environment::boundary(
            chi_right,
            mpo.right_bond_dim(),
            right_end,
        )?);

        let mut dmrg = Self {
            mps,
            mpo,
            options,
            left_environments,
            right_environments,
            energies: Vec::new(),
        };
        for i in (1..n).rev() {
            dmrg.update_right_environment(i)?;
        }
        debug!(
            sites = n,
            chi_max = options.chi_max,
            mode = %options.mode,
            "environments initialised"
        );
        Ok(dmrg)
    }

    pub fn len(&self) -> usize {
        self.mps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mps.is_empty()
    }

    pub fn mps(&self) -> &ExplicitMps {
        &self.mps
    }

    pub fn mpo(&self) -> &Mpo {
        self.mpo
    }

    pub fn options(&self) -> &DmrgOptions {
        &self.options
    }

    /// Energy reached at the end of each completed sweep.
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn left_environment(&self, i: usize) -> Option<&Environment> {
        self.left_environments.get(i).and_then(Option::as_ref)
    }

    pub fn right_environment(&self, i: usize) -> Option<&Environment> {
        self.right_environments.get(i).and_then(Option::as_ref)
    }

    /// The optimised state; cloned when the optimiser only borrowed it.
    pub fn into_mps(self) -> ExplicitMps {
        match self.mps {
            MpsSlot::Owned(m) => m,
            MpsSlot::Borrowed(m) => m.clone(),
        }
    }

    /// `num_iterations` sweeps, with no convergence check of its own.
    pub fn run(&mut self, num_iterations: usize) -> Result<f64> {
        let progress = if self.options.silent {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(num_iterations as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        };

        let mut last = None;
        for _ in 0..num_iterations {
            let energy = match self.sweep() {
                Ok(e) => e,
                Err(err) => {
                    progress.abandon();
                    return Err(err);
                }
            };
            progress.set_message(format!("E = {:.12}", energy));
            progress.inc(1);
            last = Some(energy);
        }
        progress.finish_and_clear();

        let energy = match last {
            Some(e) => e,
            None => expectation(&self.mps, self.mpo)?,
        };
        info!(
            sweeps = num_iterations,
            energy,
            max_bond = self.mps.max_bond_dim(),
            "run finished"
        );
        Ok(energy)
    }

    /// Left-to-right then right-to-left over every bond.
    pub fn sweep(&mut self) -> Result<f64> {
        let n = self.len();
        let mut energy = f64::NAN;
        for i in 0..n - 1 {
            energy = self.update_bond(i)?;
        }
        for i in (0..n - 1).rev() {
            energy = self.update_bond(i)?;
        }
        self.energies.push(energy);
        debug!(
            sweep = self.energies.len(),
            energy,
            max_bond = self.mps.max_bond_dim(),
            "sweep finished"
        );
        Ok(energy)
    }

    /// Optimises the bond between sites `i` and `i + 1` and returns the
    /// eigenvalue found there.
    pub fn update_bond(&mut self, i: usize) -> Result<f64> {
        let n = self.len();
        if i + 1 >= n {
            return Err(DmrgError::BondOutOfRange { bond: i, sites: n });
        }
        let j = i + 1;

        let (pair, [cl, d1, d2, cr]) = {
            let left = self.left_environments[i]
                .as_ref()
                .ok_or(DmrgError::MissingEnvironment {
                    side: Side::Left,
                    index: i,
                })?;
            let right = self.right_environments[j]
                .as_ref()
                .ok_or(DmrgError::MissingEnvironment {
                    side: Side::Right,
                    index: j,
                })?;
            let heff =
                EffectiveHamiltonian::new(left, self.mpo.tensor(i)?, self.mpo.tensor(j)?, right)?;

            let guess = self.mps.two_site_tensor(i)?;
            if guess.shape() != heff.x_shape() {
                return Err(DmrgError::incompatible(format!(
                    "two-site tensor {:?} against effective Hamiltonian {:?}",
                    guess.shape(),
                    heff.x_shape()
                )));
            }
            let pair = lanczos(&heff, self.options.mode, &guess.data, &self.options.lanczos)?;
            (pair, heff.x_shape())
        };

        let theta = TwoSite::from_vec(cl, d1, d2, cr, pair.vector)?;
        let (left_iso, values, right_iso) =
            split_two_site_tensor(&theta, self.options.truncation(), true)?;

        // the split already carries the new weight on bond j; strip the old
        // outer weights so the chain stays in Vidal form
        let inv_left = inverse_weights(self.mps.singular_values(i)?, i)?;
        let inv_right = inverse_weights(self.mps.singular_values(j + 1)?, j + 1)?;
        let gamma_i = left_iso.scale_left(&inv_left)?;
        let gamma_j = right_iso.scale_right(&inv_right)?;

        let kept = values.len();
        self.mps.set_site(i, gamma_i)?;
        self.mps.set_site(j, gamma_j)?;
        self.mps.set_singular_values(j, values)?;

        self.update_left_environment(i)?;
        self.update_right_environment(j)?;

        trace!(bond = i, energy = pair.value, kept, matvecs = pair.matvecs, "bond updated");
        Ok(pair.value)
    }

    /// Folds site `i` into `right_environments[i]`, writing
    /// `right_environments[i - 1]`.
    pub fn update_right_environment(&mut self, i: usize) -> Result<()> {
        let n = self.len();
        if i == 0 || i >= n {
            return Err(DmrgError::BondOutOfRange { bond: i, sites: n });
        }
        let env = self.right_environments[i]
            .as_ref()
            .ok_or(DmrgError::MissingEnvironment {
                side: Side::Right,
                index: i,
            })?;
        let next = fold_right(env, &self.mps.single_site_right_iso(i)?, self.mpo.tensor(i)?)?;
        self.right_environments[i - 1] = Some(next);
        Ok(())
    }

    /// Folds site `i` into `left_environments[i]`, writing
    /// `left_environments[i + 1]`.
    pub fn update_left_environment(&mut self, i: usize) -> Result<()> {
        let n = self.len();
        if i + 1 >= n {
            return Err(DmrgError::BondOutOfRange { bond: i, sites: n });
        }
        let env = self.left_environments[i]
            .as_ref()
            .ok_or(DmrgError::MissingEnvironment {
                side: Side::Left,
                index: i,
            })?;
        let next = fold_left(env, &self.mps.single_site_left_iso(i)?, self.mpo.tensor(i)?)?;
        self.left_environments[i + 1] = Some(next);
        Ok(())
    }
}

fn inverse_weights(values: &[f64], bond: usize) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|&s| {
            if s > f64::EPSILON {
                Ok(1.0 / s)
            } else {
                Err(DmrgError::SingularGauge { bond, value: s })
            }
        })
        .collect()
}
