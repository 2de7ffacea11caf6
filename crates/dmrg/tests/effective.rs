use dmrg::{
    fold_left, fold_right, DmrgError, EffectiveHamiltonian, Environment, LinearOperator, Result,
};
use proptest::prelude::*;
use quantum::{Heisenberg, Ising};
use rng::ShakeRng;
use tn::{ExplicitMps, Mpo, C64};

/// Random four-site state, the XXZ chain, and the environments around bond 1.
struct Bond {
    mps: ExplicitMps,
    mpo: Mpo,
    left: Environment,
    right: Environment,
}

fn bond_setup() -> Bond {
    let mut rng = ShakeRng::new(b"effective");
    let mps = ExplicitMps::random(4, 2, 4, &mut rng).unwrap();
    let mpo = Heisenberg::xxz(4, 1.0, 0.7).to_mpo().unwrap();

    let left = fold_left(
        &Environment::boundary(1, mpo.left_bond_dim(), 0).unwrap(),
        &mps.single_site_left_iso(0).unwrap(),
        mpo.tensor(0).unwrap(),
    )
    .unwrap();

    let d = mpo.right_bond_dim();
    let mut right = Environment::boundary(1, d, d - 1).unwrap();
    for i in [3, 2] {
        let site = mps.single_site_right_iso(i).unwrap();
        right = fold_right(&right, &site, mpo.tensor(i).unwrap()).unwrap();
    }
    Bond { mps, mpo, left, right }
}

impl Bond {
    /// Operator on sites `i`, `i + 1` between the stored environments.
    fn operator(&self, i: usize) -> Result<EffectiveHamiltonian<'_>> {
        EffectiveHamiltonian::new(
            &self.left,
            self.mpo.tensor(i).unwrap(),
            self.mpo.tensor(i + 1).unwrap(),
            &self.right,
        )
    }
}

fn inner(x: &[C64], y: &[C64]) -> C64 {
    x.iter().zip(y).map(|(a, b)| a.conj() * b).sum()
}

fn to_complex(parts: &[(f64, f64)]) -> Vec<C64> {
    parts.iter().map(|&(re, im)| C64::new(re, im)).collect()
}

fn arb_vector(dim: usize) -> impl Strategy<Value = Vec<C64>> {
    prop::collection::vec((-1.0_f64..1.0, -1.0_f64..1.0), dim).prop_map(|v| to_complex(&v))
}

#[test]
fn shape_follows_environments() {
    let b = bond_setup();
    let heff = b.operator(1).unwrap();
    assert_eq!(heff.x_shape(), [2, 2, 2, 2]);
    assert_eq!(heff.dim(), 16);
    assert_eq!(b.mps.two_site_tensor(1).unwrap().shape(), heff.x_shape());
}

#[test]
fn reproduces_energy_of_the_state() {
    let b = bond_setup();
    let heff = b.operator(1).unwrap();
    let theta = b.mps.two_site_tensor(1).unwrap();
    let local = inner(&theta.data, &heff.apply(&theta.data));

    let psi = b.mps.to_dense().unwrap();
    let (dim, h) = b.mpo.to_dense().unwrap();
    let mut global = C64::new(0.0, 0.0);
    for r in 0..dim {
        for c in 0..dim {
            global += psi[r].conj() * h[r * dim + c] * psi[c];
        }
    }
    assert!((local - global).norm() < 1e-10, "local {} global {}", local, global);
}

#[test]
fn two_site_chain_equals_dense_matrix() {
    let mpo = Ising::transverse(2, 1.0, 0.8).to_mpo().unwrap();
    let left = Environment::boundary(1, mpo.left_bond_dim(), 0).unwrap();
    let d = mpo.right_bond_dim();
    let right = Environment::boundary(1, d, d - 1).unwrap();
    let (w1, w2) = (mpo.tensor(0).unwrap(), mpo.tensor(1).unwrap());
    let heff = EffectiveHamiltonian::new(&left, w1, w2, &right).unwrap();
    let (dim, h) = mpo.to_dense().unwrap();
    assert_eq!(heff.dim(), dim);

    for c in 0..dim {
        let mut e = vec![C64::new(0.0, 0.0); dim];
        e[c] = C64::new(1.0, 0.0);
        let col = heff.apply(&e);
        for r in 0..dim {
            assert!((col[r] - h[r * dim + c]).norm() < 1e-12, "entry ({}, {})", r, c);
        }
    }
}

#[test]
fn rejects_mismatched_factors() {
    let b = bond_setup();
    let err = b.operator(2);
    assert!(matches!(err, Err(DmrgError::IncompatibleBonds { .. })));

    let wrong = Environment::zeros(2, 5, 3);
    let (w1, w2) = (b.mpo.tensor(1).unwrap(), b.mpo.tensor(2).unwrap());
    let err = EffectiveHamiltonian::new(&wrong, w1, w2, &b.right);
    assert!(matches!(err, Err(DmrgError::IncompatibleBonds { .. })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn apply_is_linear(
        x in arb_vector(16),
        y in arb_vector(16),
        a in -2.0_f64..2.0,
        c in -2.0_f64..2.0,
    ) {
        let b = bond_setup();
        let heff = b.operator(1).unwrap();
        let alpha = C64::new(a, c);
        let combo: Vec<C64> = x.iter().zip(&y).map(|(p, q)| alpha * p + q).collect();

        let lhs = heff.apply(&combo);
        let hx = heff.apply(&x);
        let hy = heff.apply(&y);
        for k in 0..lhs.len() {
            prop_assert!((lhs[k] - (alpha * hx[k] + hy[k])).norm() < 1e-10);
        }
    }

    #[test]
    fn apply_is_hermitian(x in arb_vector(16), y in arb_vector(16)) {
        let b = bond_setup();
        let heff = b.operator(1).unwrap();
        let lhs = inner(&y, &heff.apply(&x));
        let rhs = inner(&x, &heff.apply(&y)).conj();
        prop_assert!((lhs - rhs).norm() < 1e-10);
    }
}
