//! Dynamic circuit virtual machine (§4.11): mid-circuit measurement,
//! classical registers, conditional gates, and real-time qubit reset.
//!
//! Shots run independently and are dispatched across a rayon thread pool,
//! following the sparse-update parallelism pattern the state-vector kernel
//! itself uses for multi-target gates.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::core::circuit::{canonicalize_gate_type, GateStep};
use crate::core::statevector::StatevectorKernel;

const DEFAULT_SHOTS: usize = 1000;

/// A sparse classical register: unset bits read as 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassicalRegister {
    size: usize,
    bits: BTreeMap<usize, u8>,
}

impl ClassicalRegister {
    pub fn new(size: usize) -> Self {
        ClassicalRegister { size, bits: BTreeMap::new() }
    }

    pub fn set(&mut self, index: usize, value: u8) {
        self.bits.insert(index, value & 1);
    }

    pub fn get(&self, index: usize) -> u8 {
        self.bits.get(&index).copied().unwrap_or(0)
    }

    pub fn get_value(&self) -> u64 {
        (0..self.size).fold(0u64, |value, i| value | ((self.get(i) as u64) << i))
    }

    pub fn reset(&mut self) {
        self.bits.clear();
    }

    pub fn bits(&self) -> &BTreeMap<usize, u8> {
        &self.bits
    }
}

/// A condition guarding conditional gates/measurements/resets: execute only
/// if classical bit `creg_index` currently equals `expected_value`.
pub type Condition = (usize, u8);

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Gate { gate_type: String, qubits: Vec<usize>, theta: Option<f64>, condition: Option<Condition> },
    Measure { qubit: usize, classical_bit: usize, condition: Option<Condition> },
    Reset { qubit: usize, condition: Option<Condition> },
    Conditional { creg_index: usize, expected_value: u8, body: Vec<Instruction> },
    Barrier,
}

pub struct DynamicCircuitVM {
    num_qubits: usize,
    num_classical: usize,
    instructions: Vec<Instruction>,
}

impl DynamicCircuitVM {
    pub fn new(num_qubits: usize, num_classical: usize) -> Self {
        DynamicCircuitVM { num_qubits, num_classical, instructions: Vec::new() }
    }

    pub fn add_gate(&mut self, gate_type: impl Into<String>, qubits: Vec<usize>, theta: Option<f64>, condition: Option<Condition>) {
        self.instructions.push(Instruction::Gate { gate_type: gate_type.into(), qubits, theta, condition });
    }

    pub fn add_measurement(&mut self, qubit: usize, classical_bit: usize, condition: Option<Condition>) {
        self.instructions.push(Instruction::Measure { qubit, classical_bit, condition });
    }

    pub fn add_reset(&mut self, qubit: usize) {
        self.instructions.push(Instruction::Reset { qubit, condition: None });
    }

    pub fn add_conditional(&mut self, creg_index: usize, expected_value: u8, body: Vec<Instruction>) {
        self.instructions.push(Instruction::Conditional { creg_index, expected_value, body });
    }

    pub fn add_barrier(&mut self) {
        self.instructions.push(Instruction::Barrier);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Runs the instruction list once against a freshly initialized kernel
    /// and register, returning the sampled final bitstring and the
    /// classical register contents.
    pub fn run_single_shot(&self, rng: &mut impl Rng) -> (String, BTreeMap<usize, u8>) {
        let mut kernel = StatevectorKernel::new();
        kernel.initialize(self.num_qubits);
        let mut creg = ClassicalRegister::new(self.num_classical);

        for instr in &self.instructions {
            execute_instruction(&mut kernel, &mut creg, instr, rng);
        }

        let probs = kernel.get_probabilities();
        let final_state = sample_weighted(&probs, rng).unwrap_or_else(|| "0".repeat(self.num_qubits.max(1)));

        (final_state, creg.bits().clone())
    }

    /// Runs `shots` independent trajectories in parallel and tallies the
    /// final-state bitstrings.
    pub fn run(&self, shots: usize) -> BTreeMap<String, usize> {
        let outcomes: Vec<String> = (0..shots)
            .into_par_iter()
            .map(|_| {
                let mut rng = StdRng::from_os_rng();
                self.run_single_shot(&mut rng).0
            })
            .collect();

        let mut counts = BTreeMap::new();
        for state in outcomes {
            *counts.entry(state).or_insert(0) += 1;
        }
        counts
    }

    pub fn get_probabilities(&self, shots: usize) -> BTreeMap<String, f64> {
        let counts = self.run(shots);
        let total: usize = counts.values().sum();
        if total == 0 {
            return BTreeMap::new();
        }
        counts.into_iter().map(|(k, v)| (k, v as f64 / total as f64)).collect()
    }
}

fn condition_holds(creg: &ClassicalRegister, condition: &Option<Condition>) -> bool {
    match condition {
        Some((idx, expected)) => creg.get(*idx) == *expected,
        None => true,
    }
}

fn execute_instruction(kernel: &mut StatevectorKernel, creg: &mut ClassicalRegister, instr: &Instruction, rng: &mut impl Rng) {
    match instr {
        Instruction::Gate { gate_type, qubits, theta, condition } => {
            if !condition_holds(creg, condition) {
                return;
            }
            match qubits.len() {
                1 => kernel.apply_gate(gate_type, qubits[0], *theta),
                2 if gate_type == "SWAP" => kernel.apply_swap(qubits[0], qubits[1]),
                2 => kernel.apply_controlled_gate(gate_type, &qubits[..1], qubits[1]),
                _ => kernel.apply_multi_qubit_gate(gate_type, qubits),
            }
        }
        Instruction::Measure { qubit, classical_bit, condition } => {
            if !condition_holds(creg, condition) {
                return;
            }
            let result = kernel.measure(*qubit);
            creg.set(*classical_bit, result);
        }
        Instruction::Reset { qubit, condition } => {
            if !condition_holds(creg, condition) {
                return;
            }
            let result = kernel.measure(*qubit);
            if result == 1 {
                kernel.apply_gate("X", *qubit, None);
            }
        }
        Instruction::Conditional { creg_index, expected_value, body } => {
            if creg.get(*creg_index) == *expected_value {
                for body_instr in body {
                    execute_instruction(kernel, creg, body_instr, rng);
                }
            }
        }
        Instruction::Barrier => {}
    }
}

/// Samples one key from a discrete distribution via cumulative-sum
/// inversion; returns `None` for an empty distribution.
fn sample_weighted(probs: &BTreeMap<String, f64>, rng: &mut impl Rng) -> Option<String> {
    if probs.is_empty() {
        return None;
    }
    let u: f64 = rng.random::<f64>();
    let mut cumulative = 0.0;
    for (state, p) in probs {
        cumulative += p;
        if u < cumulative {
            return Some(state.clone());
        }
    }
    probs.keys().last().cloned()
}

/// Parses a step list into VM instructions (§4.11), ordering by timestep.
/// `RESET`/`MEASUREMENT` gate types become their dedicated instruction
/// kinds; everything else becomes a `Gate` instruction.
pub fn parse_dynamic_circuit(steps: &[GateStep], num_qubits: usize, num_classical: usize) -> DynamicCircuitVM {
    let mut vm = DynamicCircuitVM::new(num_qubits, num_classical);
    let mut ordered: Vec<&GateStep> = steps.iter().collect();
    ordered.sort_by_key(|s| s.timestep);

    for step in ordered {
        let gate_type = canonicalize_gate_type(&step.gate_type);
        match gate_type.as_str() {
            "MEASUREMENT" => {
                vm.add_measurement(step.qubit.unwrap_or(0), step.classical_bit.unwrap_or(0), None);
            }
            "RESET" => {
                vm.add_reset(step.qubit.unwrap_or(0));
            }
            "BARRIER" => {
                vm.add_barrier();
            }
            _ => {
                let qubits = step.qubits();
                vm.add_gate(gate_type, qubits, step.theta, None);
            }
        }
    }

    vm
}

/// Runs a parsed dynamic circuit for `shots` trajectories and returns
/// (probabilities, raw counts) (§4.11).
pub fn run_dynamic_simulation(
    num_qubits: usize,
    num_classical: usize,
    steps: &[GateStep],
    shots: usize,
) -> (BTreeMap<String, f64>, BTreeMap<String, usize>) {
    let vm = parse_dynamic_circuit(steps, num_qubits, num_classical);
    let counts = vm.run(if shots == 0 { DEFAULT_SHOTS } else { shots });
    let total: usize = counts.values().sum();
    let probabilities = if total == 0 {
        BTreeMap::new()
    } else {
        counts.iter().map(|(k, v)| (k.clone(), *v as f64 / total as f64)).collect()
    };
    (probabilities, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classical_register_packs_bits_into_an_integer_value() {
        let mut creg = ClassicalRegister::new(3);
        creg.set(0, 1);
        creg.set(2, 1);
        assert_eq!(creg.get_value(), 0b101);
    }

    #[test]
    fn mid_circuit_measurement_feeds_a_conditional_x() {
        let steps = vec![
            GateStep::new("X", 0).with_qubit(0),
            GateStep::new("MEASUREMENT", 1).with_qubit(0).with_classical_bit(0),
        ];
        let mut vm = parse_dynamic_circuit(&steps, 1, 1);
        vm.add_conditional(0, 1, vec![Instruction::Gate {
            gate_type: "X".to_string(),
            qubits: vec![0],
            theta: None,
            condition: None,
        }]);

        let mut rng = StdRng::seed_from_u64(1);
        let (_final_state, creg) = vm.run_single_shot(&mut rng);
        assert_eq!(creg.get(&0).copied().unwrap_or(0), 1);
    }

    #[test]
    fn reset_instruction_always_returns_qubit_to_zero() {
        let mut vm = DynamicCircuitVM::new(1, 0);
        vm.add_gate("X", vec![0], None, None);
        vm.add_reset(0);

        let mut rng = StdRng::seed_from_u64(3);
        let (final_state, _creg) = vm.run_single_shot(&mut rng);
        assert_eq!(final_state, "0");
    }

    #[test]
    fn run_tallies_shots_into_counts_summing_to_the_shot_count() {
        let mut vm = DynamicCircuitVM::new(1, 0);
        vm.add_gate("H", vec![0], None, None);
        let counts = vm.run(200);
        let total: usize = counts.values().sum();
        assert_eq!(total, 200);
    }

    /// Teleportation fragment: the marginal on qubit 2 after classically
    /// corrected teleportation must match RX(1.2)|0⟩'s own marginal.
    #[test]
    fn teleported_qubit_marginal_matches_the_prepared_state() {
        let mut vm = DynamicCircuitVM::new(3, 2);
        vm.add_gate("RX", vec![0], Some(1.2), None);
        vm.add_gate("H", vec![1], None, None);
        vm.add_gate("CNOT", vec![1, 2], None, None);
        vm.add_gate("CNOT", vec![0, 1], None, None);
        vm.add_gate("H", vec![0], None, None);
        vm.add_measurement(0, 0, None);
        vm.add_measurement(1, 1, None);
        vm.add_gate("X", vec![2], None, Some((1, 1)));
        vm.add_gate("Z", vec![2], None, Some((0, 1)));

        let shots = 5000;
        let counts = vm.run(shots);
        let ones: usize = counts.iter().filter(|(state, _)| state.starts_with('1')).map(|(_, c)| c).sum();
        let observed_p1 = ones as f64 / shots as f64;

        let expected_p1 = (1.2_f64 / 2.0).sin().powi(2);
        assert!((observed_p1 - expected_p1).abs() < 0.05, "observed {observed_p1}, expected {expected_p1}");
    }
}
