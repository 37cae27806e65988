//! Exact state-vector simulation by bit-masked amplitude updates (§4.2).
//!
//! Qubit indices follow the little-endian convention (§3): bit `k` of a
//! basis-state integer corresponds to qubit `k`, and the emitted bitstring
//! renders qubit 0 as its rightmost character.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::{CoreError, CoreResult};
use crate::core::gates;
use crate::core::noise::NoiseModel;
use crate::{complex, Complex, Matrix};

const PROBABILITY_EPSILON: f64 = 1e-12;

pub struct StatevectorKernel {
    state: Vec<Complex>,
    num_qubits: usize,
    noise_model: Option<NoiseModel>,
    rng: StdRng,
}

impl StatevectorKernel {
    pub fn new() -> Self {
        StatevectorKernel {
            state: vec![Complex::ONE],
            num_qubits: 0,
            noise_model: None,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_noise_model(noise_model: NoiseModel) -> Self {
        let mut kernel = Self::new();
        kernel.noise_model = Some(noise_model);
        kernel
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut kernel = Self::new();
        kernel.rng = StdRng::seed_from_u64(seed);
        kernel
    }

    pub fn attach_noise_model(&mut self, noise_model: NoiseModel) {
        self.noise_model = Some(noise_model);
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Allocates a `2^n`-amplitude vector in |0...0⟩.
    pub fn initialize(&mut self, num_qubits: usize) {
        self.num_qubits = num_qubits;
        let dim = 1usize << num_qubits;
        self.state = vec![Complex::ZERO; dim];
        self.state[0] = Complex::ONE;
    }

    /// Applies a single-qubit unitary by iterating the indices with bit `q`
    /// clear and updating the paired amplitude at bit `q` set. Unknown gate
    /// types are no-ops (§7 recovery policy).
    pub fn apply_gate(&mut self, gate_type: &str, q: usize, theta: Option<f64>) {
        let matrix = match self.single_qubit_matrix(gate_type, theta) {
            Some(m) => m,
            None => return,
        };
        self.apply_single_qubit_matrix(&matrix, q);
        self.apply_post_gate_noise(&[q]);
    }

    fn single_qubit_matrix(&self, gate_type: &str, theta: Option<f64>) -> Option<Matrix<Complex>> {
        match gate_type {
            "RX" => Some(gates::rx_matrix(theta.unwrap_or(0.0))),
            "RY" => Some(gates::ry_matrix(theta.unwrap_or(0.0))),
            "RZ" => Some(gates::rz_matrix(theta.unwrap_or(0.0))),
            "P" => Some(gates::p_matrix(theta.unwrap_or(0.0))),
            "U1" => Some(gates::u1_matrix(theta.unwrap_or(0.0))),
            _ => gates::fixed_gate(gate_type).filter(|g| g.num_qubits == 1).map(|g| g.matrix.clone()),
        }
    }

    fn apply_single_qubit_matrix(&mut self, matrix: &Matrix<Complex>, q: usize) {
        let mask = 1usize << q;
        let dim = self.state.len();
        for i in 0..dim {
            if i & mask == 0 {
                let j = i | mask;
                let a_i = self.state[i];
                let a_j = self.state[j];
                self.state[i] = *matrix.get(0, 0) * a_i + *matrix.get(0, 1) * a_j;
                self.state[j] = *matrix.get(1, 0) * a_i + *matrix.get(1, 1) * a_j;
            }
        }
    }

    /// Applies a controlled gate: `cmask` is the OR of all control bits;
    /// amplitudes with every control bit set are updated by the target's
    /// 2×2 matrix (X for CNOT/CCNOT, Z for CZ, otherwise the named matrix).
    pub fn apply_controlled_gate(&mut self, gate_type: &str, controls: &[usize], target: usize) {
        let matrix = match gate_type {
            "CNOT" | "CCNOT" => gates::PAULI_X.matrix.clone(),
            "CZ" => gates::PAULI_Z.matrix.clone(),
            other => {
                if let Some(g) = gates::fixed_gate(other).filter(|g| g.num_qubits == 1) {
                    g.matrix.clone()
                } else {
                    return;
                }
            }
        };

        let cmask: usize = controls.iter().fold(0, |acc, &c| acc | (1usize << c));
        let tmask = 1usize << target;
        let dim = self.state.len();

        for i in 0..dim {
            if (i & cmask) == cmask && (i & tmask) == 0 {
                let j = i | tmask;
                let a_i = self.state[i];
                let a_j = self.state[j];
                self.state[i] = *matrix.get(0, 0) * a_i + *matrix.get(0, 1) * a_j;
                self.state[j] = *matrix.get(1, 0) * a_i + *matrix.get(1, 1) * a_j;
            }
        }

        let mut touched = controls.to_vec();
        touched.push(target);
        self.apply_post_gate_noise(&touched);
    }

    /// Applies a parametric controlled rotation (CRX/CRY/CRZ/CP) whose full
    /// 4×4 matrix is built directly, rather than routed through the
    /// single-control dispatch in `apply_controlled_gate`.
    pub fn apply_controlled_rotation(&mut self, gate_type: &str, control: usize, target: usize, theta: f64) {
        let matrix = match gate_type {
            "CRX" => gates::crx_matrix(theta),
            "CRY" => gates::cry_matrix(theta),
            "CRZ" => gates::crz_matrix(theta),
            "CP" => gates::cp_matrix(theta),
            _ => return,
        };
        self.apply_dense_submatrix(&matrix, &[control, target]);
        self.apply_post_gate_noise(&[control, target]);
    }

    /// Applies CCNOT/CSWAP (3-qubit fixed gates) via the general dense
    /// submatrix update, generalized from the 1-target loop above to `g`
    /// target bits (§4.2 rationale).
    pub fn apply_multi_qubit_gate(&mut self, gate_type: &str, qubits: &[usize]) {
        let gate = match gate_type {
            "CCNOT" => &*gates::TOFFOLI,
            "CSWAP" => &*gates::FREDKIN,
            _ => return,
        };
        self.apply_dense_submatrix(&gate.matrix, qubits);
        self.apply_post_gate_noise(qubits);
    }

    fn apply_dense_submatrix(&mut self, matrix: &Matrix<Complex>, targets: &[usize]) {
        let g = targets.len();
        let gate_dim = 1usize << g;
        let dim = self.state.len();

        let mut non_target_mask = dim - 1;
        for &t in targets {
            non_target_mask &= !(1usize << t);
        }

        let mut new_state = vec![Complex::ZERO; dim];
        for i in 0..dim {
            let mut row = 0usize;
            for (k, &t) in targets.iter().enumerate() {
                if (i >> t) & 1 == 1 {
                    row |= 1 << k;
                }
            }

            let mut sum = Complex::ZERO;
            for col in 0..gate_dim {
                let elem = *matrix.get(row, col);
                if elem.is_negligible(1e-15) {
                    continue;
                }
                let mut source = i & non_target_mask;
                for (k, &t) in targets.iter().enumerate() {
                    if (col >> k) & 1 == 1 {
                        source |= 1 << t;
                    }
                }
                sum = sum + elem * self.state[source];
            }
            new_state[i] = sum;
        }

        self.state = new_state;
    }

    /// Exchanges amplitudes differing only in bits `q1`/`q2`; the `i < j`
    /// guard avoids swapping each pair back.
    pub fn apply_swap(&mut self, q1: usize, q2: usize) {
        let m1 = 1usize << q1;
        let m2 = 1usize << q2;
        let dim = self.state.len();
        for i in 0..dim {
            let bit1 = (i & m1) != 0;
            let bit2 = (i & m2) != 0;
            if bit1 != bit2 {
                let j = i ^ m1 ^ m2;
                if i < j {
                    self.state.swap(i, j);
                }
            }
        }
        self.apply_post_gate_noise(&[q1, q2]);
    }

    /// Samples a Bernoulli outcome for qubit `q`, collapses and renormalizes
    /// the state vector in place, and returns the outcome bit.
    pub fn measure(&mut self, q: usize) -> u8 {
        let mask = 1usize << q;
        let p1: f64 = self
            .state
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm2())
            .sum();

        let outcome = if self.rng.random::<f64>() < p1 { 1u8 } else { 0u8 };

        let mut norm = 0.0;
        for (i, a) in self.state.iter_mut().enumerate() {
            let bit = ((i & mask) != 0) as u8;
            if bit != outcome {
                *a = Complex::ZERO;
            } else {
                norm += a.norm2();
            }
        }

        let scale = 1.0 / norm.sqrt();
        for a in self.state.iter_mut() {
            *a = *a * complex!(scale, 0.0);
        }

        outcome
    }

    /// Maps basis-state bitstrings (qubit 0 rightmost) to probabilities,
    /// omitting entries below 10⁻¹².
    pub fn get_probabilities(&self) -> BTreeMap<String, f64> {
        let mut probs = BTreeMap::new();
        for (i, a) in self.state.iter().enumerate() {
            let p = a.norm2();
            if p > PROBABILITY_EPSILON {
                probs.insert(format!("{:0width$b}", i, width = self.num_qubits.max(1)), p);
            }
        }
        probs
    }

    pub fn get_statevector(&self) -> Vec<Complex> {
        self.state.clone()
    }

    pub fn get_density_matrix(&self) -> Matrix<Complex> {
        let dim = self.state.len();
        let mut data = vec![Complex::ZERO; dim * dim];
        for i in 0..dim {
            for j in 0..dim {
                data[i * dim + j] = self.state[i] * self.state[j].get_conjugate();
            }
        }
        Matrix::new(dim, dim, data)
    }

    fn apply_post_gate_noise(&mut self, touched: &[usize]) {
        if self.noise_model.is_none() {
            return;
        }
        let mut noise = self.noise_model.take().unwrap();
        for &q in touched {
            noise.apply_post_gate_noise(&mut self.state, q, &mut self.rng);
        }
        self.noise_model = Some(noise);
    }
}

impl Default for StatevectorKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies a gate descriptor (dispatching on the gate catalogue's arity) to
/// a kernel; raises `InvalidCircuit` for qubit indices out of range.
pub fn validate_qubit_range(qubits: &[usize], num_qubits: usize) -> CoreResult<()> {
    for &q in qubits {
        if q >= num_qubits {
            return Err(CoreError::invalid_circuit(format!(
                "qubit index {q} out of range [0, {num_qubits})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_has_expected_probabilities() {
        let mut kernel = StatevectorKernel::new();
        kernel.initialize(2);
        kernel.apply_gate("H", 0, None);
        kernel.apply_controlled_gate("CNOT", &[0], 1);

        let probs = kernel.get_probabilities();
        assert_eq!(probs.len(), 2);
        assert!((probs["00"] - 0.5).abs() < 1e-9);
        assert!((probs["11"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn ghz_state_places_qubit_zero_as_rightmost_character() {
        let mut kernel = StatevectorKernel::new();
        kernel.initialize(3);
        kernel.apply_gate("H", 0, None);
        kernel.apply_controlled_gate("CNOT", &[0], 1);
        kernel.apply_controlled_gate("CNOT", &[1], 2);

        let probs = kernel.get_probabilities();
        assert!((probs["000"] - 0.5).abs() < 1e-9);
        assert!((probs["111"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn x_on_qubit_k_sets_bit_k_from_the_right() {
        let mut kernel = StatevectorKernel::new();
        kernel.initialize(3);
        kernel.apply_gate("X", 1, None);
        let probs = kernel.get_probabilities();
        assert!((probs["010"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unitarity_is_preserved_across_a_random_circuit() {
        let mut kernel = StatevectorKernel::new();
        kernel.initialize(4);
        kernel.apply_gate("H", 0, None);
        kernel.apply_gate("RX", 1, Some(0.37));
        kernel.apply_controlled_gate("CNOT", &[0], 2);
        kernel.apply_gate("T", 3, None);
        kernel.apply_swap(1, 3);

        let norm: f64 = kernel.get_statevector().iter().map(|a| a.norm2()).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn measure_collapses_to_a_single_consistent_outcome() {
        let mut kernel = StatevectorKernel::with_seed(7);
        kernel.initialize(1);
        kernel.apply_gate("H", 0, None);
        let outcome = kernel.measure(0);

        let sv = kernel.get_statevector();
        let norm: f64 = sv.iter().map(|a| a.norm2()).sum();
        assert!((norm - 1.0).abs() < 1e-9);
        let inconsistent = if outcome == 0 { 1 } else { 0 };
        assert!(sv[inconsistent].norm2() < 1e-15);
    }

    #[test]
    fn unknown_gate_type_is_a_no_op() {
        let mut kernel = StatevectorKernel::new();
        kernel.initialize(1);
        kernel.apply_gate("NOT_A_GATE", 0, None);
        let probs = kernel.get_probabilities();
        assert!((probs["0"] - 1.0).abs() < 1e-9);
    }
}
