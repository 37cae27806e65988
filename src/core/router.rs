//! SABRE routing: SWAP-insertion so a circuit's two-qubit gates only ever
//! land on coupled physical qubits (§4.9).
//!
//! Reference: Li, Ding, Xie, "Tackling the Qubit Mapping Problem for
//! NISQ-Era Quantum Devices".

use crate::core::config::RouterConfig;
use crate::core::error::{CoreError, CoreResult};
use crate::core::topology::{CouplingMap, Layout};

#[derive(Clone, Debug, PartialEq)]
pub struct GateOp {
    pub gate_type: String,
    pub qubits: Vec<usize>,
    pub theta: Option<f64>,
    pub timestep: i64,
}

impl GateOp {
    pub fn new(gate_type: impl Into<String>, qubits: Vec<usize>) -> Self {
        GateOp { gate_type: gate_type.into(), qubits, theta: None, timestep: 0 }
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = Some(theta);
        self
    }

    pub fn with_timestep(mut self, timestep: i64) -> Self {
        self.timestep = timestep;
        self
    }
}

pub struct SABRERouter<'a> {
    coupling_map: &'a CouplingMap,
    lookahead_depth: usize,
    decay_factor: f64,
}

impl<'a> SABRERouter<'a> {
    pub fn new(coupling_map: &'a CouplingMap) -> Self {
        Self::from_config(coupling_map, RouterConfig::default())
    }

    /// Builds a router from an explicit `RouterConfig` (§10.3), rather than
    /// the compiled-in defaults `new` uses.
    pub fn from_config(coupling_map: &'a CouplingMap, config: RouterConfig) -> Self {
        SABRERouter { coupling_map, lookahead_depth: config.lookahead_depth, decay_factor: config.decay_factor }
    }

    pub fn with_lookahead_depth(mut self, lookahead_depth: usize) -> Self {
        self.lookahead_depth = lookahead_depth;
        self
    }

    /// Routes `gates`, inserting SWAPs as needed, and returns the physical
    /// step list, the resulting layout, and the SWAP count. Returns
    /// `RoutingStalled` if no candidate SWAP improves the front layer
    /// (shouldn't happen for a connected coupling map).
    pub fn route(&self, gates: &[GateOp], initial_layout: Option<Layout>) -> CoreResult<(Vec<GateOp>, Layout, usize)> {
        if gates.is_empty() {
            return Ok((Vec::new(), initial_layout.unwrap_or_default(), 0));
        }

        let mut logical_qubits: Vec<usize> = gates.iter().flat_map(|g| g.qubits.iter().copied()).collect();
        logical_qubits.sort_unstable();
        logical_qubits.dedup();

        let mut layout = initial_layout.unwrap_or_else(|| {
            Layout::new(logical_qubits.iter().map(|&q| (q, q)).collect())
        });

        let mut remaining: Vec<GateOp> = gates.to_vec();
        let mut routed: Vec<GateOp> = Vec::new();
        let mut num_swaps = 0usize;
        let total_gates = gates.len();

        while !remaining.is_empty() {
            let front_layer = self.front_layer(&remaining);
            if front_layer.is_empty() {
                break;
            }

            let mut executed_any = false;
            let mut still_remaining = Vec::with_capacity(remaining.len());
            let mut executed_indices = std::collections::HashSet::new();

            for (idx, gate) in remaining.iter().enumerate() {
                if executed_indices.contains(&idx) {
                    continue;
                }
                if front_layer.iter().any(|&i| i == idx) && self.is_executable(gate, &layout) {
                    let physical_qubits: Vec<usize> = gate.qubits.iter().map(|&q| layout.get_physical(q)).collect();
                    let mut routed_gate = GateOp::new(gate.gate_type.clone(), physical_qubits);
                    routed_gate.theta = gate.theta;
                    routed_gate.timestep = routed.len() as i64;
                    routed.push(routed_gate);
                    executed_indices.insert(idx);
                    executed_any = true;
                }
            }

            for (idx, gate) in remaining.into_iter().enumerate() {
                if !executed_indices.contains(&idx) {
                    still_remaining.push(gate);
                }
            }
            remaining = still_remaining;

            if executed_any {
                continue;
            }

            let front_gates: Vec<GateOp> = self.front_layer(&remaining).iter().map(|&i| remaining[i].clone()).collect();
            match self.find_best_swap(&front_gates, &remaining, &layout) {
                Some((p1, p2)) => {
                    routed.push(GateOp::new("SWAP", vec![p1, p2]).with_timestep(routed.len() as i64));
                    num_swaps += 1;
                    layout.swap(p1, p2);
                }
                None => {
                    return Err(CoreError::RoutingStalled { gates_routed: routed.len(), total_gates });
                }
            }
        }

        Ok((routed, layout, num_swaps))
    }

    /// Indices into `gates` of those executable "now": single-qubit gates
    /// always qualify; two-qubit gates qualify if neither logical qubit has
    /// already been claimed by an earlier front-layer gate this round.
    fn front_layer(&self, gates: &[GateOp]) -> Vec<usize> {
        let mut front = Vec::new();
        let mut claimed = std::collections::HashSet::new();

        for (idx, gate) in gates.iter().enumerate() {
            if gate.qubits.len() == 2 {
                if !gate.qubits.iter().any(|q| claimed.contains(q)) {
                    front.push(idx);
                    claimed.extend(gate.qubits.iter().copied());
                }
            } else if gate.qubits.len() <= 1 {
                front.push(idx);
            }
            if front.len() >= self.lookahead_depth {
                break;
            }
        }
        front
    }

    fn is_executable(&self, gate: &GateOp, layout: &Layout) -> bool {
        if gate.qubits.len() <= 1 {
            return true;
        }
        if gate.qubits.len() == 2 {
            let p1 = layout.get_physical(gate.qubits[0]);
            let p2 = layout.get_physical(gate.qubits[1]);
            return self.coupling_map.is_connected(p1, p2);
        }
        false
    }

    fn find_best_swap(&self, front_layer: &[GateOp], remaining: &[GateOp], layout: &Layout) -> Option<(usize, usize)> {
        let mut best_swap = None;
        let mut best_cost = f64::INFINITY;

        let mut edges: Vec<(usize, usize)> = Vec::new();
        for q in 0..self.coupling_map.num_qubits() {
            for n in self.coupling_map.neighbors(q) {
                if q < n {
                    edges.push((q, n));
                }
            }
        }

        for (p1, p2) in edges {
            let mut test_layout = layout.clone();
            test_layout.swap(p1, p2);
            let cost = self.calculate_cost(front_layer, remaining, &test_layout);
            if cost < best_cost {
                best_cost = cost;
                best_swap = Some((p1, p2));
            }
        }

        best_swap
    }

    fn calculate_cost(&self, front_layer: &[GateOp], remaining: &[GateOp], layout: &Layout) -> f64 {
        let mut cost = 0.0;

        for gate in front_layer {
            if gate.qubits.len() == 2 {
                let p1 = layout.get_physical(gate.qubits[0]);
                let p2 = layout.get_physical(gate.qubits[1]);
                cost += self.coupling_map.distance(p1, p2).map(|d| d as f64).unwrap_or(f64::INFINITY);
            }
        }

        let mut decay = self.decay_factor;
        let lookahead_end = self.lookahead_depth.min(remaining.len());
        for gate in remaining.iter().skip(front_layer.len()).take(lookahead_end.saturating_sub(front_layer.len())) {
            if gate.qubits.len() == 2 {
                let p1 = layout.get_physical(gate.qubits[0]);
                let p2 = layout.get_physical(gate.qubits[1]);
                cost += decay * self.coupling_map.distance(p1, p2).map(|d| d as f64).unwrap_or(f64::INFINITY);
                decay *= self.decay_factor;
            }
        }

        cost
    }
}

/// Decomposes a SWAP into three CNOTs, for backends without a native SWAP.
pub fn decompose_swap(p1: usize, p2: usize) -> Vec<GateOp> {
    vec![
        GateOp::new("CNOT", vec![p1, p2]),
        GateOp::new("CNOT", vec![p2, p1]),
        GateOp::new("CNOT", vec![p1, p2]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topology::HardwareTopology;

    #[test]
    fn from_config_carries_the_configured_lookahead_into_routing() {
        let map = HardwareTopology::linear(4);
        let config = crate::core::config::RouterConfig::new().with_lookahead_depth(1).with_decay_factor(0.1);
        let router = SABRERouter::from_config(&map, config);
        assert_eq!(router.lookahead_depth, 1);
        let gates = vec![GateOp::new("CNOT", vec![0, 3])];
        let (routed, _layout, swaps) = router.route(&gates, None).unwrap();
        assert!(swaps >= 1);
        assert!(routed.iter().any(|g| g.gate_type == "CNOT"));
    }

    #[test]
    fn adjacent_qubits_need_no_swaps() {
        let map = HardwareTopology::linear(3);
        let router = SABRERouter::new(&map);
        let gates = vec![GateOp::new("CNOT", vec![0, 1])];
        let (routed, _layout, swaps) = router.route(&gates, None).unwrap();
        assert_eq!(swaps, 0);
        assert_eq!(routed.len(), 1);
    }

    #[test]
    fn distant_qubits_require_at_least_one_swap() {
        let map = HardwareTopology::linear(4);
        let router = SABRERouter::new(&map);
        let gates = vec![GateOp::new("CNOT", vec![0, 3])];
        let (routed, _layout, swaps) = router.route(&gates, None).unwrap();
        assert!(swaps >= 1);
        assert!(routed.iter().any(|g| g.gate_type == "CNOT"));
    }

    #[test]
    fn decompose_swap_produces_three_cnots() {
        let decomposed = decompose_swap(0, 1);
        assert_eq!(decomposed.len(), 3);
        assert!(decomposed.iter().all(|g| g.gate_type == "CNOT"));
    }

    #[test]
    fn empty_circuit_routes_to_nothing() {
        let map = HardwareTopology::linear(3);
        let router = SABRERouter::new(&map);
        let (routed, _layout, swaps) = router.route(&[], None).unwrap();
        assert!(routed.is_empty());
        assert_eq!(swaps, 0);
    }

    #[test]
    fn every_routed_two_qubit_gate_lands_on_a_connected_edge() {
        let map = HardwareTopology::linear(5);
        let router = SABRERouter::new(&map);
        let gates = vec![
            GateOp::new("CNOT", vec![0, 4]),
            GateOp::new("CNOT", vec![1, 3]),
            GateOp::new("CNOT", vec![0, 2]),
        ];
        let (routed, _layout, _swaps) = router.route(&gates, None).unwrap();
        for gate in &routed {
            if gate.qubits.len() == 2 {
                assert!(map.is_connected(gate.qubits[0], gate.qubits[1]), "gate {:?} not on a coupled edge", gate);
            }
        }
    }

    #[test]
    fn routed_circuit_reproduces_the_same_probabilities_under_the_final_layout() {
        use crate::core::statevector::StatevectorKernel;

        let map = HardwareTopology::linear(5);
        let router = SABRERouter::new(&map);
        let gates = vec![GateOp::new("H", vec![0]), GateOp::new("CNOT", vec![0, 4])];
        let (routed, final_layout, _swaps) = router.route(&gates, None).unwrap();

        let mut original_kernel = StatevectorKernel::new();
        original_kernel.initialize(5);
        original_kernel.apply_gate("H", 0, None);
        original_kernel.apply_controlled_gate("CNOT", &[0], 4);
        let original_probs = original_kernel.get_probabilities();

        let mut routed_kernel = StatevectorKernel::new();
        routed_kernel.initialize(5);
        for gate in &routed {
            if gate.qubits.len() == 1 {
                routed_kernel.apply_gate(&gate.gate_type, gate.qubits[0], gate.theta);
            } else if gate.gate_type == "SWAP" {
                routed_kernel.apply_swap(gate.qubits[0], gate.qubits[1]);
            } else {
                routed_kernel.apply_controlled_gate(&gate.gate_type, &gate.qubits[..1], gate.qubits[1]);
            }
        }
        let routed_probs = routed_kernel.get_probabilities();

        let mut relabeled = std::collections::BTreeMap::new();
        for (bitstring, p) in &routed_probs {
            let bits: Vec<char> = bitstring.chars().rev().collect();
            let n = bits.len();
            let mut logical_bits = vec!['0'; n];
            for physical in 0..n {
                let logical_qubit = final_layout.get_logical(physical);
                logical_bits[logical_qubit] = bits[physical];
            }
            let relabeled_string: String = logical_bits.into_iter().rev().collect();
            *relabeled.entry(relabeled_string).or_insert(0.0) += p;
        }

        for (bitstring, p) in &original_probs {
            let got = relabeled.get(bitstring).copied().unwrap_or(0.0);
            assert!((got - p).abs() < 1e-9, "mismatch on {bitstring}: {got} vs {p}");
        }
    }
}
