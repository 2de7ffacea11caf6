use tn::{Mpo, MpoTensor, TnError, C64};

fn pauli_z() -> [[C64; 2]; 2] {
    let z = C64::new(0.0, 0.0);
    [[C64::new(1.0, 0.0), z], [z, C64::new(-1.0, 0.0)]]
}

fn identity() -> [[C64; 2]; 2] {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    [[o, z], [z, o]]
}

/// `Z ⊗ Z` written as a bond-dimension-2 MPO with the 0 / D-1 boundary convention.
fn zz_mpo() -> Mpo {
    let mut first = MpoTensor::zeros(1, 2, 2, 2);
    first.set_block(0, 0, pauli_z());
    let mut last = MpoTensor::zeros(2, 1, 2, 2);
    last.set_block(0, 0, pauli_z());
    last.set_block(1, 0, identity());
    Mpo::new(vec![first, last]).unwrap()
}

#[test]
fn dense_zz_is_diagonal_signs() {
    let mpo = zz_mpo();
    assert_eq!(mpo.len(), 2);
    assert_eq!(mpo.left_bond_dim(), 1);
    assert_eq!(mpo.right_bond_dim(), 1);

    let (dim, h) = mpo.to_dense().unwrap();
    assert_eq!(dim, 4);
    let expected = [1.0, -1.0, -1.0, 1.0];
    for r in 0..4 {
        for c in 0..4 {
            let want = if r == c { expected[r] } else { 0.0 };
            assert!((h[r * 4 + c] - C64::new(want, 0.0)).norm() < 1e-15);
        }
    }
}

#[test]
fn construction_validates_chain() {
    assert!(matches!(Mpo::new(vec![]), Err(TnError::EmptyChain)));

    let a = MpoTensor::zeros(1, 2, 2, 2);
    let b = MpoTensor::zeros(3, 1, 2, 2);
    assert!(matches!(
        Mpo::new(vec![a, b]),
        Err(TnError::BondMismatch { bond: 1, left: 2, right: 3 })
    ));

    let skew = MpoTensor::zeros(1, 1, 2, 3);
    assert!(matches!(
        Mpo::new(vec![skew]),
        Err(TnError::PhysicalMismatch { site: 0, up: 2, down: 3 })
    ));
}

#[test]
fn zero_blocks_are_detected() {
    let mpo = zz_mpo();
    let last = mpo.tensor(1).unwrap();
    assert!(!last.block_is_zero(0, 0));
    assert!(MpoTensor::zeros(2, 2, 2, 2).block_is_zero(1, 0));
    assert!(mpo.tensor(2).is_err());
}
