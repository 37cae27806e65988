//! Monte-Carlo noise channels applied on top of the state-vector kernel
//! (§4.3). The noise model borrows the kernel's amplitude buffer for the
//! duration of a call; it never owns the state (§9 Design Notes).
//!
//! Kraus-operator channel definitions below are kept for reference and for
//! density-matrix-based analysis; trajectory sampling against the state
//! vector uses the closed-form amplitude-damping/phase-damping/depolarizing
//! branches directly, following `original_source/api/kernels/noise_model.py`.

use std::collections::HashMap;

use rand::Rng;

use crate::{complex, Complex, Matrix};

const GAMMA_EPSILON: f64 = 1e-10;

#[derive(Clone, Debug)]
pub struct KrausOperator {
    pub matrix: Matrix<Complex>,
    pub name: String,
}

impl KrausOperator {
    pub fn new(name: &str, matrix: Matrix<Complex>) -> Self {
        Self { matrix, name: name.to_string() }
    }
}

#[derive(Clone, Debug)]
pub struct NoiseChannel {
    pub name: String,
    pub operators: Vec<KrausOperator>,
}

impl NoiseChannel {
    pub fn new(name: &str, operators: Vec<KrausOperator>) -> Self {
        Self { name: name.to_string(), operators }
    }

    pub fn depolarising(p: f64) -> Self {
        let sqrt_1_p = (1.0 - p).sqrt();
        let sqrt_p3 = (p / 3.0).sqrt();

        let k0 = Matrix::new(2, 2, vec![complex!(sqrt_1_p, 0.0), Complex::ZERO, Complex::ZERO, complex!(sqrt_1_p, 0.0)]);
        let k1 = Matrix::new(2, 2, vec![Complex::ZERO, complex!(sqrt_p3, 0.0), complex!(sqrt_p3, 0.0), Complex::ZERO]);
        let k2 = Matrix::new(2, 2, vec![Complex::ZERO, complex!(0.0, -sqrt_p3), complex!(0.0, sqrt_p3), Complex::ZERO]);
        let k3 = Matrix::new(2, 2, vec![complex!(sqrt_p3, 0.0), Complex::ZERO, Complex::ZERO, complex!(-sqrt_p3, 0.0)]);

        Self::new(
            "Depolarising",
            vec![
                KrausOperator::new("K0", k0),
                KrausOperator::new("K1(X)", k1),
                KrausOperator::new("K2(Y)", k2),
                KrausOperator::new("K3(Z)", k3),
            ],
        )
    }

    pub fn amplitude_damping(gamma: f64) -> Self {
        let sqrt_gamma = gamma.sqrt();
        let sqrt_1_gamma = (1.0 - gamma).sqrt();
        let k0 = Matrix::new(2, 2, vec![complex!(1.0, 0.0), Complex::ZERO, Complex::ZERO, complex!(sqrt_1_gamma, 0.0)]);
        let k1 = Matrix::new(2, 2, vec![Complex::ZERO, complex!(sqrt_gamma, 0.0), Complex::ZERO, Complex::ZERO]);
        Self::new("AmplitudeDamping", vec![KrausOperator::new("K0", k0), KrausOperator::new("K1", k1)])
    }

    pub fn phase_damping(gamma: f64) -> Self {
        let sqrt_gamma = gamma.sqrt();
        let sqrt_1_gamma = (1.0 - gamma).sqrt();
        let k0 = Matrix::new(2, 2, vec![complex!(1.0, 0.0), Complex::ZERO, Complex::ZERO, complex!(sqrt_1_gamma, 0.0)]);
        let k1 = Matrix::new(2, 2, vec![Complex::ZERO, Complex::ZERO, Complex::ZERO, complex!(sqrt_gamma, 0.0)]);
        Self::new("PhaseDamping", vec![KrausOperator::new("K0", k0), KrausOperator::new("K1", k1)])
    }
}

/// Per-qubit T1/T2 override; unset fields fall back to the global config.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QubitNoiseOverride {
    pub t1: Option<f64>,
    pub t2: Option<f64>,
}

/// Hierarchical noise configuration (§4.3, §6): a `global` section, optional
/// per-qubit T1/T2 overrides, and optional per-qubit readout confusion
/// matrices.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseConfig {
    pub t1: f64,
    pub t2: f64,
    pub gate_time: f64,
    pub depolarizing: f64,
    pub per_qubit: HashMap<usize, QubitNoiseOverride>,
    pub readout: HashMap<usize, [[f64; 2]; 2]>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            t1: 0.0,
            t2: 0.0,
            gate_time: 0.0,
            depolarizing: 0.0,
            per_qubit: HashMap::new(),
            readout: HashMap::new(),
        }
    }
}

impl NoiseConfig {
    pub fn with_global(mut self, t1: f64, t2: f64, gate_time: f64, depolarizing: f64) -> Self {
        self.t1 = t1;
        self.t2 = t2;
        self.gate_time = gate_time;
        self.depolarizing = depolarizing;
        self
    }

    pub fn with_qubit_override(mut self, qubit: usize, t1: Option<f64>, t2: Option<f64>) -> Self {
        self.per_qubit.insert(qubit, QubitNoiseOverride { t1, t2 });
        self
    }

    pub fn with_readout(mut self, qubit: usize, confusion: [[f64; 2]; 2]) -> Self {
        self.readout.insert(qubit, confusion);
        self
    }

    fn t1_for(&self, qubit: usize) -> f64 {
        self.per_qubit.get(&qubit).and_then(|o| o.t1).unwrap_or(self.t1)
    }

    fn t2_for(&self, qubit: usize) -> f64 {
        self.per_qubit.get(&qubit).and_then(|o| o.t2).unwrap_or(self.t2)
    }

    /// A representative superconducting-style default: tens-of-microseconds
    /// T1/T2, a nominal gate duration, a small depolarizing rate, and a
    /// mildly asymmetric per-qubit readout confusion matrix.
    pub fn realistic_default(num_qubits: usize) -> Self {
        let mut config = NoiseConfig::default().with_global(50_000.0, 70_000.0, 50.0, 0.001);
        for q in 0..num_qubits {
            config = config.with_readout(q, [[0.98, 0.02], [0.04, 0.96]]);
        }
        config
    }
}

/// Builds the default IBM-style noise profile named in §4.3's supplemented
/// constructors, grounded on `create_ibm_noise_model` in
/// `original_source/api/kernels/noise_model.py`.
pub fn create_ibm_noise_model(num_qubits: usize) -> NoiseModel {
    NoiseModel::new(NoiseConfig::realistic_default(num_qubits))
}

pub struct NoiseModel {
    config: NoiseConfig,
}

impl NoiseModel {
    pub fn new(config: NoiseConfig) -> Self {
        NoiseModel { config }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Applies depolarizing, amplitude-damping, and phase-damping noise to
    /// `qubit` after a gate touches it (§4.3), mutating `state` in place and
    /// consuming samples from `rng`.
    pub fn apply_post_gate_noise(&mut self, state: &mut [Complex], qubit: usize, rng: &mut impl Rng) {
        let p = self.config.depolarizing;
        if p > 0.0 {
            self.apply_depolarizing(state, qubit, p, rng);
        }

        let t1 = self.config.t1_for(qubit);
        if t1 > 0.0 {
            let gamma = 1.0 - (-self.config.gate_time / t1).exp();
            if gamma > GAMMA_EPSILON {
                self.apply_amplitude_damping(state, qubit, gamma, rng);
            }
        }

        let t2 = self.config.t2_for(qubit);
        if t2 > 0.0 {
            let gamma_phi = if t1 > 0.0 { (1.0 / t2 - 1.0 / (2.0 * t1)).max(0.0) } else { 1.0 / t2 };
            let lambda = 1.0 - (-gamma_phi * self.config.gate_time).exp();
            if lambda > GAMMA_EPSILON {
                self.apply_phase_damping(state, qubit, lambda, rng);
            }
        }
    }

    fn apply_depolarizing(&self, state: &mut [Complex], qubit: usize, p: f64, rng: &mut impl Rng) {
        let u: f64 = rng.random::<f64>();
        let third = p / 3.0;
        if u < third {
            apply_pauli_x(state, qubit);
        } else if u < 2.0 * third {
            apply_pauli_y(state, qubit);
        } else if u < p {
            apply_pauli_z(state, qubit);
        }
    }

    fn apply_amplitude_damping(&self, state: &mut [Complex], qubit: usize, gamma: f64, rng: &mut impl Rng) {
        let mask = 1usize << qubit;
        let p_decay: f64 = state
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm2())
            .sum::<f64>()
            * gamma;

        if rng.random::<f64>() < p_decay {
            for i in 0..state.len() {
                if i & mask != 0 {
                    let j = i & !mask;
                    let amp = state[i];
                    state[j] = state[j] + amp * gamma.sqrt();
                    state[i] = Complex::ZERO;
                }
            }
        } else {
            let scale = (1.0 - gamma).sqrt();
            for i in 0..state.len() {
                if i & mask != 0 {
                    state[i] = state[i] * scale;
                }
            }
        }
        renormalize(state);
    }

    fn apply_phase_damping(&self, state: &mut [Complex], qubit: usize, lambda: f64, rng: &mut impl Rng) {
        let mask = 1usize << qubit;
        let p_dephase: f64 = state
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm2())
            .sum::<f64>()
            * lambda;

        let scale = if rng.random::<f64>() < p_dephase { lambda.sqrt() } else { (1.0 - lambda).sqrt() };
        for i in 0..state.len() {
            if i & mask != 0 {
                state[i] = state[i] * scale;
            }
        }
        renormalize(state);
    }

    /// Draws a Bernoulli flip with probability `confusion[r][1-r]`; returns
    /// the (possibly flipped) outcome. A qubit with no configured confusion
    /// matrix reads out ideally.
    pub fn apply_readout_error(&self, qubit: usize, outcome: u8, rng: &mut impl Rng) -> u8 {
        let confusion = match self.config.readout.get(&qubit) {
            Some(c) => c,
            None => return outcome,
        };
        let r = outcome as usize;
        let flip_prob = confusion[r][1 - r];
        if rng.random::<f64>() < flip_prob {
            1 - outcome
        } else {
            outcome
        }
    }
}

fn renormalize(state: &mut [Complex]) {
    let norm: f64 = state.iter().map(|a| a.norm2()).sum();
    if norm <= 0.0 {
        return;
    }
    let scale = 1.0 / norm.sqrt();
    for a in state.iter_mut() {
        *a = *a * scale;
    }
}

fn apply_pauli_x(state: &mut [Complex], qubit: usize) {
    let mask = 1usize << qubit;
    for i in 0..state.len() {
        if i & mask == 0 {
            state.swap(i, i | mask);
        }
    }
}

fn apply_pauli_y(state: &mut [Complex], qubit: usize) {
    let mask = 1usize << qubit;
    for i in 0..state.len() {
        if i & mask == 0 {
            let j = i | mask;
            let a_i = state[i];
            let a_j = state[j];
            state[i] = a_j * complex!(0.0, -1.0);
            state[j] = a_i * complex!(0.0, 1.0);
        }
    }
}

fn apply_pauli_z(state: &mut [Complex], qubit: usize) {
    let mask = 1usize << qubit;
    for i in 0..state.len() {
        if i & mask != 0 {
            state[i] = -state[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bell_state() -> Vec<Complex> {
        let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        vec![complex!(inv_sqrt2, 0.0), Complex::ZERO, Complex::ZERO, complex!(inv_sqrt2, 0.0)]
    }

    #[test]
    fn zero_rate_noise_model_leaves_state_untouched() {
        let mut model = NoiseModel::new(NoiseConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = bell_state();
        let before = state.clone();
        model.apply_post_gate_noise(&mut state, 0, &mut rng);
        for (a, b) in state.iter().zip(before.iter()) {
            assert!((a.real - b.real).abs() < 1e-12);
            assert!((a.imaginary - b.imaginary).abs() < 1e-12);
        }
    }

    #[test]
    fn noise_application_preserves_normalization() {
        let config = NoiseConfig::default().with_global(20.0, 15.0, 1.0, 0.05);
        let mut model = NoiseModel::new(config);
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = bell_state();
        model.apply_post_gate_noise(&mut state, 0, &mut rng);
        model.apply_post_gate_noise(&mut state, 1, &mut rng);

        let norm: f64 = state.iter().map(|a| a.norm2()).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn readout_error_without_configured_confusion_matrix_is_identity() {
        let model = NoiseModel::new(NoiseConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(model.apply_readout_error(0, 1, &mut rng), 1);
    }

    #[test]
    fn create_ibm_noise_model_configures_readout_for_every_qubit() {
        let model = create_ibm_noise_model(3);
        assert_eq!(model.config().readout.len(), 3);
        assert!(model.config().t1 > 0.0);
    }
}
