//! DAG-based optimization passes (§4.7): gate cancellation, rotation
//! fusion, and commutation detection.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::core::circuit::GateStep;
use crate::core::dag::{CircuitDAG, DAGNode, NodeId};

const TWO_PI: f64 = std::f64::consts::TAU;
const ANGLE_EPSILON: f64 = 1e-10;

pub trait OptimizationPass {
    fn name(&self) -> &'static str;
    fn run(&self, dag: &mut CircuitDAG);
}

/// Cancels adjacent inverse gate pairs: self-inverse gates applied twice in
/// a row, and named inverse pairs (S/SDG, T/TDG).
pub struct GateCancellation;

const SELF_INVERSE: &[&str] = &["X", "Y", "Z", "H", "CNOT", "CZ", "SWAP"];
const INVERSE_PAIRS: &[(&str, &str)] = &[("S", "SDG"), ("SDG", "S"), ("T", "TDG"), ("TDG", "T")];

impl GateCancellation {
    fn gates_cancel(&self, a: &DAGNode, b: &DAGNode) -> bool {
        let qa: BTreeSet<usize> = a.qubits.iter().copied().collect();
        let qb: BTreeSet<usize> = b.qubits.iter().copied().collect();
        if qa != qb {
            return false;
        }
        if a.gate_type == b.gate_type && SELF_INVERSE.contains(&a.gate_type.as_str()) {
            return true;
        }
        INVERSE_PAIRS.contains(&(a.gate_type.as_str(), b.gate_type.as_str()))
    }

    /// `b` must be the only successor of `a` that touches their shared
    /// qubits, otherwise some other gate has already interleaved itself.
    fn can_cancel(&self, a: &DAGNode, b: &DAGNode, dag: &CircuitDAG) -> bool {
        let shared: BTreeSet<usize> = a.qubits.iter().copied().filter(|q| b.qubits.contains(q)).collect();
        for &succ_id in &a.successors {
            if succ_id == b.id {
                continue;
            }
            if let Some(succ) = dag.node(succ_id) {
                if succ.qubits.iter().any(|q| shared.contains(q)) {
                    return false;
                }
            }
        }
        true
    }
}

impl OptimizationPass for GateCancellation {
    fn name(&self) -> &'static str {
        "GateCancellation"
    }

    fn run(&self, dag: &mut CircuitDAG) {
        loop {
            let mut to_remove: BTreeSet<NodeId> = BTreeSet::new();

            'outer: for id in dag.node_ids() {
                if to_remove.contains(&id) {
                    continue;
                }
                let node = match dag.node(id) {
                    Some(n) => n.clone(),
                    None => continue,
                };
                for &succ_id in &node.successors {
                    if to_remove.contains(&succ_id) {
                        continue;
                    }
                    let succ = match dag.node(succ_id) {
                        Some(s) => s.clone(),
                        None => continue,
                    };
                    if self.gates_cancel(&node, &succ) && self.can_cancel(&node, &succ, dag) {
                        to_remove.insert(id);
                        to_remove.insert(succ_id);
                        break 'outer;
                    }
                }
            }

            if to_remove.is_empty() {
                break;
            }
            for id in to_remove {
                dag.remove_node(id);
            }
        }
    }
}

/// Fuses adjacent same-axis rotations: `RX(a)·RX(b) = RX(a+b)`, and likewise
/// for RY/RZ. A fused angle that is a multiple of 2π drops both gates.
pub struct GateFusion;

const ROTATION_GATES: &[&str] = &["RX", "RY", "RZ"];

impl OptimizationPass for GateFusion {
    fn name(&self) -> &'static str {
        "GateFusion"
    }

    fn run(&self, dag: &mut CircuitDAG) {
        loop {
            let mut fused = false;

            for id in dag.node_ids() {
                let node = match dag.node(id) {
                    Some(n) if ROTATION_GATES.contains(&n.gate_type.as_str()) => n.clone(),
                    _ => continue,
                };

                for &succ_id in &node.successors {
                    let succ = match dag.node(succ_id) {
                        Some(s) => s.clone(),
                        None => continue,
                    };
                    if succ.gate_type != node.gate_type || succ.qubits != node.qubits {
                        continue;
                    }

                    let theta1 = node.theta.unwrap_or(0.0);
                    let theta2 = succ.theta.unwrap_or(0.0);
                    let new_theta = theta1 + theta2;

                    if (new_theta % TWO_PI).abs() < ANGLE_EPSILON {
                        dag.remove_node(id);
                        dag.remove_node(succ_id);
                    } else {
                        dag.set_theta(id, new_theta);
                        dag.remove_node(succ_id);
                    }
                    fused = true;
                    break;
                }
                if fused {
                    break;
                }
            }

            if !fused {
                break;
            }
        }
    }
}

/// Detects commuting gate pairs. Actually reordering the DAG to exploit
/// commutation is left undone: the analysis only tags which adjacent pairs
/// commute, since a correct reordering would need to preserve every other
/// pairwise dependency and that rewrite isn't implemented here.
pub struct CommutationAnalysis;

const Z_TYPE: &[&str] = &["Z", "S", "SDG", "T", "TDG", "RZ"];

impl CommutationAnalysis {
    pub fn gates_commute(&self, a: &DAGNode, b: &DAGNode) -> bool {
        if !a.qubits.iter().any(|q| b.qubits.contains(q)) {
            return true;
        }
        Z_TYPE.contains(&a.gate_type.as_str()) && Z_TYPE.contains(&b.gate_type.as_str())
    }
}

impl OptimizationPass for CommutationAnalysis {
    fn name(&self) -> &'static str {
        "CommutationAnalysis"
    }

    fn run(&self, dag: &mut CircuitDAG) {
        for id in dag.node_ids() {
            let node = match dag.node(id) {
                Some(n) => n.clone(),
                None => continue,
            };
            for &succ_id in &node.successors {
                let succ = match dag.node(succ_id) {
                    Some(s) => s,
                    None => continue,
                };
                if self.gates_commute(&node, succ) {
                    debug!(a = node.id, b = succ.id, gate_a = %node.gate_type, gate_b = %succ.gate_type, "candidate commuting pair");
                }
            }
        }
    }
}

/// Runs the passes appropriate to `level` (0 = none, 1 = basic, 2 =
/// aggressive) and returns the optimized step list (§4.7).
pub fn optimize_circuit(steps: &[GateStep], level: u8) -> Vec<GateStep> {
    if level == 0 {
        return steps.to_vec();
    }

    let mut dag = CircuitDAG::from_circuit(steps);
    let original_count = dag.len();

    let mut passes: Vec<Box<dyn OptimizationPass>> = Vec::new();
    if level >= 1 {
        passes.push(Box::new(GateCancellation));
        passes.push(Box::new(GateFusion));
    }
    if level >= 2 {
        passes.push(Box::new(CommutationAnalysis));
        passes.push(Box::new(GateCancellation));
        passes.push(Box::new(GateFusion));
    }

    for pass in &passes {
        pass.run(&mut dag);
    }

    let optimized_count = dag.len();
    if optimized_count < original_count {
        info!(original_count, optimized_count, removed = original_count - optimized_count, "circuit optimized");
    }

    dag.to_circuit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_hadamards_cancel() {
        let steps = vec![GateStep::new("H", 0).with_qubit(0), GateStep::new("H", 1).with_qubit(0)];
        let optimized = optimize_circuit(&steps, 1);
        assert!(optimized.is_empty());
    }

    #[test]
    fn adjacent_rz_rotations_fuse_into_one() {
        let steps = vec![
            GateStep::new("RZ", 0).with_qubit(0).with_theta(0.3),
            GateStep::new("RZ", 1).with_qubit(0).with_theta(0.4),
        ];
        let optimized = optimize_circuit(&steps, 1);
        assert_eq!(optimized.len(), 1);
        assert!((optimized[0].theta.unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn rotation_summing_to_a_full_turn_cancels_entirely() {
        let steps = vec![
            GateStep::new("RX", 0).with_qubit(0).with_theta(std::f64::consts::PI),
            GateStep::new("RX", 1).with_qubit(0).with_theta(std::f64::consts::PI),
        ];
        let optimized = optimize_circuit(&steps, 1);
        assert!(optimized.is_empty());
    }

    #[test]
    fn level_zero_is_a_no_op() {
        let steps = vec![GateStep::new("H", 0).with_qubit(0), GateStep::new("H", 1).with_qubit(0)];
        let optimized = optimize_circuit(&steps, 0);
        assert_eq!(optimized.len(), 2);
    }

    #[test]
    fn disjoint_qubit_gates_commute() {
        let a = GateStep::new("X", 0).with_qubit(0);
        let b = GateStep::new("Z", 1).with_qubit(1);
        let dag = CircuitDAG::from_circuit(&[a, b]);
        let nodes: Vec<_> = dag.nodes().cloned().collect();
        let pass = CommutationAnalysis;
        assert!(pass.gates_commute(&nodes[0], &nodes[1]));
    }

    #[test]
    fn an_intervening_gate_blocks_cancellation() {
        let steps = vec![
            GateStep::new("X", 0).with_qubit(0),
            GateStep::new("H", 1).with_qubit(0),
            GateStep::new("X", 2).with_qubit(0),
        ];
        let optimized = optimize_circuit(&steps, 1);
        assert_eq!(optimized.len(), 3);
    }

    #[test]
    fn level_one_optimization_is_idempotent() {
        let steps = vec![
            GateStep::new("H", 0).with_qubit(0),
            GateStep::new("H", 1).with_qubit(0),
            GateStep::new("RZ", 2).with_qubit(1).with_theta(0.2),
            GateStep::new("RZ", 3).with_qubit(1).with_theta(0.5),
            GateStep::new("X", 4).with_qubit(2),
        ];
        let once = optimize_circuit(&steps, 1);
        let twice = optimize_circuit(&once, 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn a_swap_survives_the_dag_round_trip_as_control_free() {
        let steps = vec![
            GateStep::new("H", 0).with_qubit(0),
            GateStep::new("SWAP", 1).with_controls_targets(vec![], vec![0, 1]),
        ];
        let optimized = optimize_circuit(&steps, 1);
        let swap = optimized.iter().find(|s| s.gate_type == "SWAP").unwrap();
        assert!(swap.controls.is_empty());
        assert_eq!(swap.targets, vec![0, 1]);
    }

    #[test]
    fn optimized_circuit_with_a_swap_reproduces_the_original_statevector() {
        use crate::core::statevector::StatevectorKernel;

        let steps = vec![
            GateStep::new("H", 0).with_qubit(0),
            GateStep::new("X", 1).with_qubit(1),
            GateStep::new("SWAP", 2).with_controls_targets(vec![], vec![0, 1]),
        ];
        let optimized = optimize_circuit(&steps, 1);

        let run = |circuit: &[GateStep]| -> Vec<crate::Complex> {
            let mut kernel = StatevectorKernel::new();
            kernel.initialize(2);
            for step in circuit {
                if step.gate_type == "SWAP" {
                    kernel.apply_swap(step.targets[0], step.targets[1]);
                } else if step.controls.is_empty() {
                    kernel.apply_gate(&step.gate_type, step.qubit.unwrap_or(0), step.theta);
                } else {
                    kernel.apply_controlled_gate(&step.gate_type, &step.controls, step.targets[0]);
                }
            }
            kernel.get_statevector()
        };

        let original_sv = run(&steps);
        let optimized_sv = run(&optimized);
        for (a, b) in original_sv.iter().zip(optimized_sv.iter()) {
            assert!((*a - *b).abs() < 1e-9);
        }
    }

    #[test]
    fn optimized_circuit_reproduces_the_original_statevector() {
        use crate::core::statevector::StatevectorKernel;

        let steps = vec![
            GateStep::new("H", 0).with_qubit(0),
            GateStep::new("H", 1).with_qubit(0),
            GateStep::new("X", 2).with_qubit(1),
            GateStep::new("RZ", 3).with_qubit(1).with_theta(0.3),
            GateStep::new("RZ", 4).with_qubit(1).with_theta(-0.3),
            GateStep::new("CNOT", 5).with_controls_targets(vec![1], vec![0]),
        ];
        let optimized = optimize_circuit(&steps, 1);

        let run = |circuit: &[GateStep]| -> Vec<crate::Complex> {
            let mut kernel = StatevectorKernel::new();
            kernel.initialize(2);
            for step in circuit {
                if step.controls.is_empty() {
                    kernel.apply_gate(&step.gate_type, step.qubit.unwrap_or(0), step.theta);
                } else {
                    kernel.apply_controlled_gate(&step.gate_type, &step.controls, step.targets[0]);
                }
            }
            kernel.get_statevector()
        };

        let original_sv = run(&steps);
        let optimized_sv = run(&optimized);
        for (a, b) in original_sv.iter().zip(optimized_sv.iter()) {
            assert!((*a - *b).abs() < 1e-9);
        }
    }
}
