use dmrg::{expectation, Dmrg, DmrgError, DmrgOptions, EigenMode, Side};
use quantum::exact::{ground_state_energy, spectrum};
use quantum::{Heisenberg, Ising};
use rng::ShakeRng;
use tn::{ExplicitMps, Mpo, TnError};

fn random_state(n: usize, chi: usize, seed: &[u8]) -> ExplicitMps {
    let mut rng = ShakeRng::new(seed);
    ExplicitMps::random(n, 2, chi, &mut rng).unwrap()
}

fn options(chi_max: usize) -> DmrgOptions {
    DmrgOptions {
        chi_max,
        ..DmrgOptions::default()
    }
}

fn assert_converges(mpo: &Mpo, mps: &ExplicitMps, sweeps: usize) {
    let exact = ground_state_energy(mpo).unwrap();
    let mut dmrg = Dmrg::new(mps, mpo, options(16)).unwrap();
    let energy = dmrg.run(sweeps).unwrap();
    assert!(
        (energy - exact).abs() < 1e-8,
        "dmrg {} exact {}",
        energy,
        exact
    );
    assert_eq!(dmrg.energies().len(), sweeps);
}

#[test]
fn transverse_ising_reaches_exact_ground_state() {
    for (n, g) in [(4, 0.5), (6, 1.0), (6, 1.5)] {
        let mpo = Ising::transverse(n, 1.0, g).to_mpo().unwrap();
        let mps = random_state(n, 2, b"tfim-start");
        assert_converges(&mpo, &mps, 6);
    }
}

#[test]
fn heisenberg_reaches_exact_ground_state() {
    let mpo = Heisenberg::uniform(6, 1.0).to_mpo().unwrap();
    let mps = random_state(6, 4, b"heisenberg-start");
    assert_converges(&mpo, &mps, 8);

    let xxz = Heisenberg::xxz(6, 1.0, 0.5).to_mpo().unwrap();
    assert_converges(&xxz, &mps, 8);
}

#[test]
fn sweep_energies_never_increase() {
    let mpo = Heisenberg::uniform(8, 1.0).to_mpo().unwrap();
    let mps = random_state(8, 2, b"monotone");
    let mut dmrg = Dmrg::new(&mps, &mpo, options(32)).unwrap();
    dmrg.run(5).unwrap();

    let energies = dmrg.energies();
    for w in energies.windows(2) {
        assert!(w[1] <= w[0] + 1e-9, "energy rose from {} to {}", w[0], w[1]);
    }
}

#[test]
fn bond_update_leaves_a_valid_schmidt_spectrum() {
    let mpo = Ising::transverse(6, 1.0, 1.0).to_mpo().unwrap();
    let mps = random_state(6, 4, b"bond-update");
    let mut dmrg = Dmrg::new(&mps, &mpo, options(3)).unwrap();

    let before = dmrg.mps().singular_values(2).unwrap().to_vec();
    for i in 0..4 {
        dmrg.update_bond(i).unwrap();
        let s = dmrg.mps().singular_values(i + 1).unwrap();
        assert!(!s.is_empty() && s.len() <= 3, "bond {} kept {}", i + 1, s.len());
        assert!(s.iter().all(|&v| v > 1e-12));
        assert!(s.windows(2).all(|w| w[0] >= w[1]));
        let norm: f64 = s.iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-10);
        assert!(dmrg.left_environment(i + 1).is_some());
    }
    // untouched bonds keep their values
    assert_eq!(dmrg.mps().singular_values(0).unwrap(), &[1.0]);
    assert_ne!(dmrg.mps().singular_values(2).unwrap(), before.as_slice());
    dmrg.mps().validate().unwrap();
}

#[test]
fn converged_state_is_a_fixed_point() {
    let mpo = Ising::transverse(6, 1.0, 0.8).to_mpo().unwrap();
    let mps = random_state(6, 4, b"fixed-point");
    let mut dmrg = Dmrg::new(&mps, &mpo, options(16)).unwrap();
    let first = dmrg.run(8).unwrap();
    let again = dmrg.sweep().unwrap();
    assert!((first - again).abs() < 1e-9);
    assert_eq!(dmrg.energies().len(), 9);
}

#[test]
fn two_site_chain_is_solved_in_one_update() {
    let mpo = Ising::transverse(2, 1.0, 1.0).to_mpo().unwrap();
    let exact = ground_state_energy(&mpo).unwrap();
    assert!((exact + 5.0_f64.sqrt()).abs() < 1e-12);

    let mps = ExplicitMps::new_zero(2).unwrap();
    let mut dmrg = Dmrg::new(&mps, &mpo, options(4)).unwrap();
    let energy = dmrg.update_bond(0).unwrap();
    assert!((energy - exact).abs() < 1e-10);
    assert!((dmrg.sweep().unwrap() - exact).abs() < 1e-10);
}

#[test]
fn bond_dimension_one_stays_variational() {
    let mpo = Ising::transverse(6, 1.0, 1.0).to_mpo().unwrap();
    let exact = ground_state_energy(&mpo).unwrap();
    let mps = ExplicitMps::new_zero(6).unwrap();
    let mut dmrg = Dmrg::new(&mps, &mpo, options(1)).unwrap();
    let energy = dmrg.run(4).unwrap();

    assert!(energy >= exact - 1e-9);
    assert!(dmrg.mps().bond_dims().iter().all(|&d| d == 1));
}

#[test]
fn largest_algebraic_finds_top_of_spectrum() {
    let mpo = Heisenberg::uniform(4, 1.0).to_mpo().unwrap();
    let top = *spectrum(&mpo).unwrap().last().unwrap();
    let mps = random_state(4, 4, b"top");
    let opts = DmrgOptions {
        mode: EigenMode::LargestAlgebraic,
        ..options(8)
    };
    let mut dmrg = Dmrg::new(&mps, &mpo, opts).unwrap();
    let energy = dmrg.run(4).unwrap();
    assert!((energy - top).abs() < 1e-8, "dmrg {} exact {}", energy, top);
}

#[test]
fn final_energy_matches_expectation_value() {
    let mpo = Heisenberg::uniform(6, 1.0).to_mpo().unwrap();
    let mps = random_state(6, 4, b"expectation");
    let mut dmrg = Dmrg::new(&mps, &mpo, options(16)).unwrap();
    let energy = dmrg.run(6).unwrap();
    let measured = expectation(dmrg.mps(), &mpo).unwrap();
    assert!((energy - measured).abs() < 1e-8);

    let state = dmrg.into_mps();
    assert!((expectation(&state, &mpo).unwrap() - energy).abs() < 1e-8);
}

#[test]
fn zero_sweeps_report_the_initial_energy() {
    let mpo = Ising::transverse(4, 1.0, 0.5).to_mpo().unwrap();
    let mps = random_state(4, 4, b"zero-sweeps");
    let mut dmrg = Dmrg::new(&mps, &mpo, DmrgOptions::default()).unwrap();
    let energy = dmrg.run(0).unwrap();
    assert!((energy - expectation(&mps, &mpo).unwrap()).abs() < 1e-12);
    assert!(dmrg.energies().is_empty());
}

#[test]
fn copy_leaves_input_untouched_and_in_place_writes_back() {
    let mpo = Ising::transverse(4, 1.0, 1.0).to_mpo().unwrap();
    let original = random_state(4, 4, b"ownership");
    let before = original.to_dense().unwrap();

    let mut dmrg = Dmrg::new(&original, &mpo, options(8)).unwrap();
    let energy = dmrg.run(3).unwrap();
    drop(dmrg);
    assert_eq!(original.to_dense().unwrap(), before);

    let mut target = original.clone();
    {
        let mut dmrg = Dmrg::in_place(&mut target, &mpo, options(8)).unwrap();
        assert!((dmrg.run(3).unwrap() - energy).abs() < 1e-12);
    }
    assert!((expectation(&target, &mpo).unwrap() - energy).abs() < 1e-8);
    assert_ne!(target.to_dense().unwrap(), before);

    let mut owned = Dmrg::from_owned(original, &mpo, options(8)).unwrap();
    assert!((owned.run(3).unwrap() - energy).abs() < 1e-12);
}

#[test]
fn rejects_inconsistent_inputs() {
    let mpo = Ising::transverse(4, 1.0, 1.0).to_mpo().unwrap();
    let short = ExplicitMps::new_zero(3).unwrap();
    let err = Dmrg::new(&short, &mpo, DmrgOptions::default()).err().unwrap();
    assert!(matches!(err, DmrgError::LengthMismatch { mps: 3, mpo: 4 }));
    assert!(err.is_configuration());

    let single = Ising::transverse(1, 1.0, 1.0).to_mpo().unwrap();
    let one = ExplicitMps::new_zero(1).unwrap();
    let err = Dmrg::new(&one, &single, DmrgOptions::default()).err().unwrap();
    assert!(matches!(err, DmrgError::TooShort(1)));

    let mps = ExplicitMps::new_zero(4).unwrap();
    let err = Dmrg::new(&mps, &mpo, options(0)).err().unwrap();
    assert!(matches!(err, DmrgError::Tensor(TnError::ZeroMaxBond)));

    let qutrits = ExplicitMps::product_state(3, &[0, 1, 2, 0]).unwrap();
    let err = Dmrg::new(&qutrits, &mpo, DmrgOptions::default()).err().unwrap();
    assert!(matches!(err, DmrgError::IncompatibleBonds { .. }));
}

#[test]
fn bond_operations_check_their_index_and_cache() {
    let mpo = Ising::transverse(4, 1.0, 1.0).to_mpo().unwrap();
    let mps = random_state(4, 2, b"indices");
    let mut dmrg = Dmrg::new(&mps, &mpo, DmrgOptions::default()).unwrap();

    assert!(matches!(
        dmrg.update_bond(3),
        Err(DmrgError::BondOutOfRange { bond: 3, sites: 4 })
    ));
    assert!(matches!(
        dmrg.update_left_environment(3),
        Err(DmrgError::BondOutOfRange { .. })
    ));
    assert!(matches!(
        dmrg.update_right_environment(0),
        Err(DmrgError::BondOutOfRange { .. })
    ));
    assert!(matches!(
        dmrg.update_bond(2),
        Err(DmrgError::MissingEnvironment {
            side: Side::Left,
            index: 2
        })
    ));

    dmrg.update_left_environment(0).unwrap();
    dmrg.update_left_environment(1).unwrap();
    dmrg.update_bond(2).unwrap();
}

#[test]
fn vanishing_schmidt_value_is_reported() {
    let mpo = Ising::transverse(3, 1.0, 1.0).to_mpo().unwrap();
    let mut mps = ExplicitMps::new_zero(3).unwrap();
    mps.set_singular_values(2, vec![0.0]).unwrap();

    let mut dmrg = Dmrg::new(&mps, &mpo, DmrgOptions::default()).unwrap();
    let err = dmrg.update_bond(0).unwrap_err();
    assert!(matches!(err, DmrgError::SingularGauge { bond: 2, .. }));
    assert!(err.is_numerical());
}

#[test]
fn repeated_bond_update_is_idempotent() {
    let mpo = Heisenberg::xxz(6, 1.0, 0.5).to_mpo().unwrap();
    let mps = random_state(6, 4, b"idempotent");
    let mut dmrg = Dmrg::new(&mps, &mpo, options(16)).unwrap();

    let first = dmrg.update_bond(0).unwrap();
    let values = dmrg.mps().singular_values(1).unwrap().to_vec();
    let second = dmrg.update_bond(0).unwrap();

    assert!((first - second).abs() < 1e-10, "{} then {}", first, second);
    let again = dmrg.mps().singular_values(1).unwrap();
    assert_eq!(again.len(), values.len());
    for (a, b) in again.iter().zip(&values) {
        assert!((a - b).abs() < 1e-8);
    }
}

fn smallest_magnitude(mpo: &Mpo) -> f64 {
    spectrum(mpo)
        .unwrap()
        .into_iter()
        .min_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap()
}

#[test]
fn smallest_magnitude_on_a_full_centre_bond() {
    let mpo = Heisenberg::xxz(6, 1.0, 0.5).to_mpo().unwrap();
    let target = smallest_magnitude(&mpo);
    let mps = random_state(6, 8, b"interior-centre");
    let opts = DmrgOptions {
        mode: EigenMode::SmallestMagnitude,
        ..options(8)
    };
    let mut dmrg = Dmrg::new(&mps, &mpo, opts).unwrap();
    dmrg.update_left_environment(0).unwrap();
    dmrg.update_left_environment(1).unwrap();

    // both halves are complete at bond 2, so the local problem is all of H
    let energy = dmrg.update_bond(2).unwrap();
    assert!(
        (energy.abs() - target.abs()).abs() < 1e-8,
        "dmrg {} exact {}",
        energy,
        target
    );
}

#[test]
fn smallest_magnitude_sweeps_complete() {
    let mpo = Heisenberg::xxz(6, 1.0, 0.5).to_mpo().unwrap();
    let mps = random_state(6, 4, b"interior-run");
    let opts = DmrgOptions {
        mode: EigenMode::SmallestMagnitude,
        ..options(16)
    };
    let mut dmrg = Dmrg::new(&mps, &mpo, opts).unwrap();
    let energy = dmrg.run(3).unwrap();

    assert_eq!(dmrg.energies().len(), 3);
    assert!((expectation(dmrg.mps(), &mpo).unwrap() - energy).abs() < 1e-8);
}
