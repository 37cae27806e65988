//! Stabilizer-tableau simulation for Clifford-only circuits (§4.4), after
//! Aaronson & Gottesman, "Improved Simulation of Stabilizer Circuits".
//!
//! The tableau is `2n` rows by `2n+1` bits: row `i` for `i < n` is a
//! destabilizer generator, row `n+i` is a stabilizer generator, and each row
//! packs `n` X bits, `n` Z bits, and a phase bit (0 = +1, 2 = -1 in the
//! mod-4 phase convention used by `rowsum`).

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::{CoreError, CoreResult};
use crate::{complex, Complex};

pub struct CliffordKernel {
    num_qubits: usize,
    tableau: Vec<u8>,
    rng: StdRng,
}

impl CliffordKernel {
    pub fn new() -> Self {
        CliffordKernel { num_qubits: 0, tableau: Vec::new(), rng: StdRng::from_os_rng() }
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut kernel = Self::new();
        kernel.rng = StdRng::seed_from_u64(seed);
        kernel
    }

    fn row_width(&self) -> usize {
        2 * self.num_qubits + 1
    }

    /// Initializes the tableau to |0...0⟩: destabilizer `i` is `X_i`,
    /// stabilizer `i` is `Z_i`.
    pub fn initialize(&mut self, num_qubits: usize) {
        self.num_qubits = num_qubits;
        let n = num_qubits;
        self.tableau = vec![0u8; 2 * n * self.row_width()];
        for i in 0..n {
            self.set_x_bit(i, i, 1);
            self.set_z_bit(n + i, i, 1);
        }
    }

    fn x_bit(&self, row: usize, qubit: usize) -> u8 {
        self.tableau[row * self.row_width() + qubit]
    }

    fn z_bit(&self, row: usize, qubit: usize) -> u8 {
        self.tableau[row * self.row_width() + self.num_qubits + qubit]
    }

    fn set_x_bit(&mut self, row: usize, qubit: usize, val: u8) {
        let w = self.row_width();
        self.tableau[row * w + qubit] = val & 1;
    }

    fn set_z_bit(&mut self, row: usize, qubit: usize, val: u8) {
        let n = self.num_qubits;
        let w = self.row_width();
        self.tableau[row * w + n + qubit] = val & 1;
    }

    fn phase(&self, row: usize) -> u8 {
        self.tableau[row * self.row_width() + 2 * self.num_qubits]
    }

    fn set_phase(&mut self, row: usize, val: u8) {
        let w = self.row_width();
        let n = self.num_qubits;
        self.tableau[row * w + 2 * n] = val & 3;
    }

    fn row(&self, i: usize) -> Vec<u8> {
        let w = self.row_width();
        self.tableau[i * w..(i + 1) * w].to_vec()
    }

    fn set_row(&mut self, i: usize, data: &[u8]) {
        let w = self.row_width();
        self.tableau[i * w..(i + 1) * w].copy_from_slice(data);
    }

    /// `row h <- row h XOR row i`, with the Aaronson-Gottesman phase update
    /// via the per-qubit Pauli-multiplication sign function `g`.
    fn rowsum(&mut self, h: usize, i: usize) {
        let n = self.num_qubits;
        let mut phase_sum: i32 = 0;
        for j in 0..n {
            let (x_i, z_i) = (self.x_bit(i, j) as i32, self.z_bit(i, j) as i32);
            let (x_h, z_h) = (self.x_bit(h, j) as i32, self.z_bit(h, j) as i32);
            let g = if x_i == 0 && z_i == 0 {
                0
            } else if x_i == 1 && z_i == 1 {
                z_h - x_h
            } else if x_i == 1 && z_i == 0 {
                z_h * (2 * x_h - 1)
            } else {
                x_h * (1 - 2 * z_h)
            };
            phase_sum += g;
        }

        let new_phase = ((self.phase(h) as i32 + self.phase(i) as i32 + phase_sum).rem_euclid(4)) as u8;
        self.set_phase(h, new_phase);

        for j in 0..n {
            let x = self.x_bit(h, j) ^ self.x_bit(i, j);
            let z = self.z_bit(h, j) ^ self.z_bit(i, j);
            self.set_x_bit(h, j, x);
            self.set_z_bit(h, j, z);
        }
    }

    /// Applies a single-qubit Clifford gate. Unknown gate types are no-ops
    /// (§7 recovery policy), matching the state-vector kernel's behavior.
    pub fn apply_gate(&mut self, gate_type: &str, target: usize) {
        let n = self.num_qubits;
        match gate_type {
            "H" => {
                for row in 0..2 * n {
                    let (x, z) = (self.x_bit(row, target), self.z_bit(row, target));
                    let phase = (self.phase(row) + 2 * (x & z)) % 4;
                    self.set_phase(row, phase);
                    self.set_x_bit(row, target, z);
                    self.set_z_bit(row, target, x);
                }
            }
            "S" => {
                for row in 0..2 * n {
                    let (x, z) = (self.x_bit(row, target), self.z_bit(row, target));
                    let phase = (self.phase(row) + 2 * (x & z)) % 4;
                    self.set_phase(row, phase);
                    self.set_z_bit(row, target, x ^ z);
                }
            }
            "SDG" => {
                for _ in 0..3 {
                    self.apply_gate("S", target);
                }
            }
            "X" => {
                for row in 0..2 * n {
                    if self.z_bit(row, target) != 0 {
                        let phase = (self.phase(row) + 2) % 4;
                        self.set_phase(row, phase);
                    }
                }
            }
            "Y" => {
                self.apply_gate("X", target);
                self.apply_gate("Z", target);
                for row in 0..2 * n {
                    if (self.x_bit(row, target) ^ self.z_bit(row, target)) != 0 {
                        let phase = (self.phase(row) + 1) % 4;
                        self.set_phase(row, phase);
                    }
                }
            }
            "Z" => {
                for row in 0..2 * n {
                    if self.x_bit(row, target) != 0 {
                        let phase = (self.phase(row) + 2) % 4;
                        self.set_phase(row, phase);
                    }
                }
            }
            "I" => {}
            _ => {}
        }
    }

    /// Applies CNOT or CZ. Returns `ArityMismatch` if more than one control
    /// is given; the tableau formalism only supports single-control gates.
    pub fn apply_controlled_gate(&mut self, gate_type: &str, controls: &[usize], target: usize) -> CoreResult<()> {
        if controls.len() != 1 {
            return Err(CoreError::arity_mismatch(format!(
                "Clifford kernel only supports single-control gates, got {} controls",
                controls.len()
            )));
        }
        let control = controls[0];
        let n = self.num_qubits;

        match gate_type {
            "CNOT" | "CX" | "CCNOT" => {
                for row in 0..2 * n {
                    let (x_c, z_c) = (self.x_bit(row, control), self.z_bit(row, control));
                    let (x_t, z_t) = (self.x_bit(row, target), self.z_bit(row, target));
                    let phase_contrib = x_c & z_t & (x_t ^ z_c ^ 1);
                    let phase = (self.phase(row) + 2 * phase_contrib) % 4;
                    self.set_phase(row, phase);
                    self.set_x_bit(row, target, x_t ^ x_c);
                    self.set_z_bit(row, control, z_c ^ z_t);
                }
            }
            "CZ" => {
                self.apply_gate("H", target);
                self.apply_controlled_gate("CNOT", &[control], target)?;
                self.apply_gate("H", target);
            }
            _ => {}
        }
        Ok(())
    }

    /// SWAP via three CNOTs.
    pub fn apply_swap(&mut self, q1: usize, q2: usize) -> CoreResult<()> {
        self.apply_controlled_gate("CNOT", &[q1], q2)?;
        self.apply_controlled_gate("CNOT", &[q2], q1)?;
        self.apply_controlled_gate("CNOT", &[q1], q2)?;
        Ok(())
    }

    /// Measures `qubit` in the computational basis. If some stabilizer
    /// anticommutes with `Z_qubit` the outcome is random and the tableau is
    /// updated per Gottesman's measurement rule; otherwise the outcome is
    /// deterministic and read off a scratch row.
    pub fn measure(&mut self, qubit: usize) -> u8 {
        let n = self.num_qubits;

        let p = (n..2 * n).find(|&i| self.x_bit(i, qubit) != 0);

        if let Some(p) = p {
            for i in 0..2 * n {
                if i != p && self.x_bit(i, qubit) != 0 {
                    self.rowsum(i, p);
                }
            }

            let p_row = self.row(p);
            self.set_row(p - n, &p_row);

            let cleared = vec![0u8; self.row_width()];
            self.set_row(p, &cleared);
            self.set_z_bit(p, qubit, 1);

            let outcome = self.rng.random_range(0..2) as u8;
            self.set_phase(p, 2 * outcome);
            outcome
        } else {
            let mut scratch = vec![0u8; self.row_width()];
            for i in 0..n {
                if self.x_bit(i, qubit) != 0 {
                    let stabilizer = self.row(i + n);
                    for (s, v) in scratch.iter_mut().zip(stabilizer.iter()) {
                        *s ^= v;
                    }
                }
            }
            (scratch[2 * n] >> 1) & 1
        }
    }

    /// Estimates measurement-outcome probabilities over `samples` full
    /// measurement trajectories, restoring the tableau after each one.
    pub fn get_probabilities(&mut self) -> BTreeMap<String, f64> {
        self.get_probabilities_with_samples(1000)
    }

    pub fn get_probabilities_with_samples(&mut self, samples: usize) -> BTreeMap<String, f64> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let saved = self.tableau.clone();

        for _ in 0..samples {
            let mut bits = vec![0u8; self.num_qubits];
            for q in 0..self.num_qubits {
                bits[q] = self.measure(q);
            }
            let key: String = bits.iter().rev().map(|b| if *b == 1 { '1' } else { '0' }).collect();
            *counts.entry(key).or_insert(0) += 1;
            self.tableau = saved.clone();
        }

        counts.into_iter().map(|(k, v)| (k, v as f64 / samples as f64)).collect()
    }

    /// Reconstructs the dense state vector by testing every computational
    /// basis state against every stabilizer generator; exponential in
    /// qubit count, intended for small circuits and debugging only.
    pub fn get_statevector(&self) -> Vec<Complex> {
        let n = self.num_qubits;
        let dim = 1usize << n;
        let mut state = vec![Complex::ZERO; dim];

        for i in 0..dim {
            let mut stabilized = true;
            for row in n..2 * n {
                let mut x_count = 0u32;
                for q in 0..n {
                    if self.x_bit(row, q) != 0 && (i >> q) & 1 == 1 {
                        x_count += 1;
                    }
                }
                let eigenvalue_phase = (x_count * 2 + self.phase(row) as u32) % 4;
                if eigenvalue_phase == 2 || eigenvalue_phase == 3 {
                    stabilized = false;
                    break;
                }
            }
            if stabilized {
                state[i] = complex!(1.0, 0.0);
            }
        }

        let norm: f64 = state.iter().map(|a| a.norm2()).sum();
        if norm > 0.0 {
            let scale = 1.0 / norm.sqrt();
            for a in state.iter_mut() {
                *a = *a * scale;
            }
        }
        state
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }
}

impl Default for CliffordKernel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_statevector_matches_expected_amplitudes() {
        let mut kernel = CliffordKernel::new();
        kernel.initialize(2);
        kernel.apply_gate("H", 0);
        kernel.apply_controlled_gate("CNOT", &[0], 1).unwrap();

        let sv = kernel.get_statevector();
        let inv_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        assert!((sv[0].real - inv_sqrt2).abs() < 1e-9);
        assert!((sv[1].real).abs() < 1e-9);
        assert!((sv[2].real).abs() < 1e-9);
        assert!((sv[3].real - inv_sqrt2).abs() < 1e-9);
    }

    #[test]
    fn deterministic_measurement_after_x_always_returns_one() {
        let mut kernel = CliffordKernel::with_seed(11);
        kernel.initialize(1);
        kernel.apply_gate("X", 0);
        assert_eq!(kernel.measure(0), 1);
        assert_eq!(kernel.measure(0), 1);
    }

    #[test]
    fn multi_control_gate_is_an_arity_mismatch() {
        let mut kernel = CliffordKernel::new();
        kernel.initialize(3);
        let err = kernel.apply_controlled_gate("CNOT", &[0, 1], 2).unwrap_err();
        assert!(matches!(err, CoreError::ArityMismatch { .. }));
    }

    #[test]
    fn sampled_probabilities_of_a_bell_pair_are_half_and_half() {
        let mut kernel = CliffordKernel::with_seed(5);
        kernel.initialize(2);
        kernel.apply_gate("H", 0);
        kernel.apply_controlled_gate("CNOT", &[0], 1).unwrap();

        let probs = kernel.get_probabilities_with_samples(500);
        assert!(probs.get("00").copied().unwrap_or(0.0) > 0.3);
        assert!(probs.get("11").copied().unwrap_or(0.0) > 0.3);
    }
}
