//! Main compilation pipeline (§4.10): layout selection, SABRE routing,
//! optional SWAP decomposition, and shadow-circuit generation for
//! visualizing what routing inserted.
//!
//! `estimate_resources` (runtime/fidelity estimation) is explicitly out of
//! scope here.

use crate::core::circuit::{canonicalize_gate_type, GateStep};
use crate::core::error::CoreResult;
use crate::core::router::{decompose_swap, GateOp, SABRERouter};
use crate::core::topology::{CouplingMap, HardwareTopology, Layout};

const DEFAULT_FALLBACK_QUBITS: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct TranspileResult {
    pub gates: Vec<GateOp>,
    pub layout: Layout,
    pub num_swaps: usize,
    pub original_depth: usize,
    pub transpiled_depth: usize,
    pub backend: String,
}

pub struct Transpiler {
    backend: String,
    coupling_map: CouplingMap,
}

impl Transpiler {
    pub fn new(backend: &str) -> Self {
        let coupling_map = Self::coupling_map_for(backend, DEFAULT_FALLBACK_QUBITS);
        Transpiler { backend: backend.to_string(), coupling_map }
    }

    fn coupling_map_for(backend: &str, fallback_qubits: usize) -> CouplingMap {
        match backend {
            "grid" => HardwareTopology::grid(4, 5),
            "all_to_all" => HardwareTopology::all_to_all(fallback_qubits),
            other => HardwareTopology::by_name(other, fallback_qubits).unwrap_or_else(|| HardwareTopology::linear(fallback_qubits)),
        }
    }

    pub fn transpile(&self, steps: &[GateStep], num_qubits: usize, decompose_swaps: bool) -> CoreResult<TranspileResult> {
        let gates = convert_to_gate_ops(steps);
        let original_depth = calculate_depth(&gates);

        let needs_routing = gates
            .iter()
            .filter(|g| g.qubits.len() == 2)
            .any(|g| !self.coupling_map.is_connected(g.qubits[0], g.qubits[1]));

        if !needs_routing {
            return Ok(TranspileResult {
                gates,
                layout: Layout::identity(num_qubits),
                num_swaps: 0,
                original_depth,
                transpiled_depth: original_depth,
                backend: self.backend.clone(),
            });
        }

        let router = SABRERouter::new(&self.coupling_map);
        let (mut routed_gates, final_layout, num_swaps) = router.route(&gates, None)?;

        if decompose_swaps {
            let mut decomposed = Vec::with_capacity(routed_gates.len());
            for gate in routed_gates {
                if gate.gate_type == "SWAP" {
                    decomposed.extend(decompose_swap(gate.qubits[0], gate.qubits[1]));
                } else {
                    decomposed.push(gate);
                }
            }
            routed_gates = decomposed;
        }

        let transpiled_depth = calculate_depth(&routed_gates);

        Ok(TranspileResult {
            gates: routed_gates,
            layout: final_layout,
            num_swaps,
            original_depth,
            transpiled_depth,
            backend: self.backend.clone(),
        })
    }

    /// Re-transpiles without decomposing SWAPs and relabels each inserted
    /// SWAP so a caller can render it distinctly (§4.10).
    pub fn get_shadow_circuit(&self, steps: &[GateStep], num_qubits: usize) -> CoreResult<Vec<ShadowStep>> {
        let result = self.transpile(steps, num_qubits, false)?;
        Ok(result
            .gates
            .into_iter()
            .map(|gate| {
                let is_transpiled = gate.gate_type == "SWAP";
                let mut step = GateStep::new(gate.gate_type.clone(), gate.timestep);
                if gate.qubits.len() == 1 {
                    step = step.with_qubit(gate.qubits[0]);
                } else if !gate.qubits.is_empty() {
                    let num_controls = num_controls_for(&gate.gate_type, gate.qubits.len());
                    let controls = gate.qubits[..num_controls].to_vec();
                    let targets = gate.qubits[num_controls..].to_vec();
                    step = step.with_controls_targets(controls, targets);
                }
                if let Some(theta) = gate.theta {
                    step = step.with_theta(theta);
                }
                ShadowStep { step, is_transpiled }
            })
            .collect())
    }
}

/// A gate step annotated with whether routing inserted it, so the caller
/// can render routing-added SWAPs distinctly from the user's own circuit.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowStep {
    pub step: GateStep,
    pub is_transpiled: bool,
}

/// How many leading qubits of a flattened `(controls ++ targets)` list are
/// controls, for gate types whose canonical arity is known (§3). `SWAP` has
/// none; `CSWAP` has exactly one; everything else with two or more qubits
/// puts every control before a single final target.
fn num_controls_for(gate_type: &str, num_qubits: usize) -> usize {
    match gate_type {
        "SWAP" => 0,
        "CSWAP" => 1,
        _ => num_qubits.saturating_sub(1),
    }
}

fn convert_to_gate_ops(steps: &[GateStep]) -> Vec<GateOp> {
    let mut gates: Vec<GateOp> = steps
        .iter()
        .filter(|s| canonicalize_gate_type(&s.gate_type) != "MEASUREMENT")
        .map(|s| {
            let gate_type = canonicalize_gate_type(&s.gate_type);
            let mut op = GateOp::new(gate_type, s.qubits()).with_timestep(s.timestep);
            op.theta = s.theta;
            op
        })
        .collect();
    gates.sort_by_key(|g| g.timestep);
    gates
}

fn calculate_depth(gates: &[GateOp]) -> usize {
    if gates.is_empty() {
        return 0;
    }
    let mut qubit_depths = std::collections::HashMap::new();
    for gate in gates {
        let max_depth = gate.qubits.iter().map(|q| *qubit_depths.get(q).unwrap_or(&0)).max().unwrap_or(0);
        let new_depth = max_depth + 1;
        for q in &gate.qubits {
            qubit_depths.insert(*q, new_depth);
        }
    }
    qubit_depths.values().copied().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_connected_circuit_needs_no_swaps() {
        let transpiler = Transpiler::new("linear");
        let steps = vec![GateStep::new("H", 0).with_qubit(0), GateStep::new("CNOT", 1).with_controls_targets(vec![0], vec![1])];
        let result = transpiler.transpile(&steps, 2, true).unwrap();
        assert_eq!(result.num_swaps, 0);
    }

    #[test]
    fn distant_gate_on_a_linear_backend_gets_routed() {
        let transpiler = Transpiler::new("linear");
        let steps = vec![GateStep::new("CNOT", 0).with_controls_targets(vec![0], vec![3])];
        let result = transpiler.transpile(&steps, 4, true).unwrap();
        assert!(result.num_swaps >= 1);
        assert!(result.gates.iter().all(|g| g.gate_type != "SWAP"));
    }

    #[test]
    fn shadow_circuit_marks_inserted_swaps() {
        let transpiler = Transpiler::new("linear");
        let steps = vec![GateStep::new("CNOT", 0).with_controls_targets(vec![0], vec![3])];
        let shadow = transpiler.get_shadow_circuit(&steps, 4).unwrap();
        assert!(shadow.iter().any(|s| s.is_transpiled));
    }

    #[test]
    fn all_to_all_backend_never_needs_routing() {
        let transpiler = Transpiler::new("all_to_all");
        let steps = vec![GateStep::new("CNOT", 0).with_controls_targets(vec![0], vec![9])];
        let result = transpiler.transpile(&steps, 10, true).unwrap();
        assert_eq!(result.num_swaps, 0);
    }

    #[test]
    fn shadow_circuit_renders_an_inserted_swap_as_control_free() {
        let transpiler = Transpiler::new("linear");
        let steps = vec![GateStep::new("CNOT", 0).with_controls_targets(vec![0], vec![3])];
        let shadow = transpiler.get_shadow_circuit(&steps, 4).unwrap();
        let swap = shadow.iter().find(|s| s.step.gate_type == "SWAP").unwrap();
        assert!(swap.step.controls.is_empty());
        assert_eq!(swap.step.targets.len(), 2);
    }

    #[test]
    fn shadow_circuit_keeps_an_already_connected_cswap_intact() {
        let transpiler = Transpiler::new("all_to_all");
        let steps = vec![GateStep::new("CSWAP", 0).with_controls_targets(vec![0], vec![1, 2])];
        let shadow = transpiler.get_shadow_circuit(&steps, 3).unwrap();
        let cswap = shadow.iter().find(|s| s.step.gate_type == "CSWAP").unwrap();
        assert_eq!(cswap.step.controls, vec![0]);
        assert_eq!(cswap.step.targets, vec![1, 2]);
    }

    #[test]
    fn routing_cnot_across_a_five_qubit_path_needs_three_swaps_and_grows_depth() {
        let transpiler = Transpiler::new("linear");
        let steps = vec![GateStep::new("CNOT", 0).with_controls_targets(vec![0], vec![4])];
        let result = transpiler.transpile(&steps, 5, true).unwrap();
        assert_eq!(result.num_swaps, 3);
        assert!(result.transpiled_depth >= 7);
    }
}
