//! Deterministic SHAKE256 stream used to build random initial states and
//! test vectors. Nothing in the optimiser itself draws from it.

use sha3::{digest::{ExtendableOutput, Update, XofReader}, Shake256};

pub struct ShakeRng {
    state: [u8; 32],
    step: u64,
}

impl ShakeRng {
    pub fn new(seed: &[u8]) -> Self {
        let mut state = [0u8; 32];
        shake(&[seed, b"SHAKE_RNG_INIT"], &mut state);
        Self { state, step: 0 }
    }

    /// Independent child stream; the parent is not advanced.
    pub fn fork(&self, label: &[u8]) -> Self {
        let mut state = [0u8; 32];
        shake(&[&self.state, label, b"FORK"], &mut state);
        Self { state, step: 0 }
    }

    /// Uniform sample in `[0, 1]`, domain-separated by `ctx`.
    pub fn next_f64(&mut self, ctx: &[u8]) -> f64 {
        self.step += 1;

        let state = self.state;
        let mut next_state = [0u8; 32];
        shake(&[&state, &self.step.to_be_bytes(), b"ADVANCE"], &mut next_state);
        self.state = next_state;

        let mut out = [0u8; 8];
        shake(&[&self.state, ctx], &mut out);

        (u64::from_be_bytes(out) as f64) / (u64::MAX as f64)
    }

    /// Standard normal sample (Box-Muller).
    pub fn next_gaussian(&mut self, ctx: &[u8]) -> f64 {
        let u1 = self.next_f64(ctx).max(f64::MIN_POSITIVE);
        let u2 = self.next_f64(ctx);
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

fn shake(parts: &[&[u8]], out: &mut [u8]) {
    let mut h = Shake256::default();
    for p in parts {
        h.update(p);
    }
    let mut r = h.finalize_xof();
    r.read(out);
}
