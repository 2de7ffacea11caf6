use num_complex::Complex64;

pub type C64 = Complex64;

pub type Op2 = [[C64; 2]; 2];

pub fn identity() -> Op2 {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    [[o, z], [z, o]]
}

pub fn pauli_x() -> Op2 {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    [[z, o], [o, z]]
}

pub fn pauli_y() -> Op2 {
    let z = C64::new(0.0, 0.0);
    let i = C64::new(0.0, 1.0);
    let ni = C64::new(0.0, -1.0);
    [[z, ni], [i, z]]
}

pub fn pauli_z() -> Op2 {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    let m = C64::new(-1.0, 0.0);
    [[o, z], [z, m]]
}

pub fn scaled(op: Op2, c: f64) -> Op2 {
    let mut out = op;
    for row in out.iter_mut() {
        for v in row.iter_mut() {
            *v *= c;
        }
    }
    out
}

pub fn add(a: Op2, b: Op2) -> Op2 {
    let mut out = a;
    for (row, brow) in out.iter_mut().zip(b.iter()) {
        for (v, w) in row.iter_mut().zip(brow.iter()) {
            *v += *w;
        }
    }
    out
}
