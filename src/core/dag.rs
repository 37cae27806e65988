//! Directed-acyclic-graph view of a circuit (§4.6): nodes are gates, edges
//! are same-qubit data dependencies. Backs the optimizer's pattern matching
//! and the transpiler's layering.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::circuit::{canonicalize_gate_type, GateStep};

pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct DAGNode {
    pub id: NodeId,
    pub gate_type: String,
    pub qubits: Vec<usize>,
    /// How many leading entries of `qubits` are controls; the rest are
    /// targets. A plain single-qubit gate (no controls, no explicit
    /// targets) has this at 0 with `qubits.len() == 1`.
    pub num_controls: usize,
    pub theta: Option<f64>,
    pub predecessors: BTreeSet<NodeId>,
    pub successors: BTreeSet<NodeId>,
    pub layer: usize,
}

/// Arena-of-nodes DAG keyed by stable integer ids, rather than the
/// string-keyed dict the original used, since ids never need to be
/// human-readable here.
#[derive(Default)]
pub struct CircuitDAG {
    nodes: HashMap<NodeId, DAGNode>,
    input_nodes: BTreeSet<NodeId>,
    output_nodes: BTreeSet<NodeId>,
    next_id: NodeId,
}

impl CircuitDAG {
    pub fn new() -> Self {
        CircuitDAG::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&DAGNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DAGNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn set_theta(&mut self, id: NodeId, theta: f64) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.theta = Some(theta);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_gate(&mut self, gate_type: impl Into<String>, qubits: Vec<usize>, theta: Option<f64>, num_controls: usize) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            DAGNode {
                id,
                gate_type: gate_type.into(),
                qubits,
                num_controls,
                theta,
                predecessors: BTreeSet::new(),
                successors: BTreeSet::new(),
                layer: 0,
            },
        );
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return;
        }
        self.nodes.get_mut(&from).unwrap().successors.insert(to);
        self.nodes.get_mut(&to).unwrap().predecessors.insert(from);
    }

    /// Removes a node, reconnecting its predecessors directly to its
    /// successors so the remaining dependency order is preserved.
    pub fn remove_node(&mut self, id: NodeId) {
        let node = match self.nodes.remove(&id) {
            Some(n) => n,
            None => return,
        };

        for &pred in &node.predecessors {
            if let Some(p) = self.nodes.get_mut(&pred) {
                p.successors.remove(&id);
                p.successors.extend(&node.successors);
            }
        }
        for &succ in &node.successors {
            if let Some(s) = self.nodes.get_mut(&succ) {
                s.predecessors.remove(&id);
                s.predecessors.extend(&node.predecessors);
            }
        }

        self.input_nodes.remove(&id);
        self.output_nodes.remove(&id);
    }

    /// Builds a DAG from a step list, adding an edge from the last gate that
    /// touched each qubit to the current one (§4.6). Measurement steps are
    /// excluded from dependency tracking, matching the original.
    pub fn from_circuit(steps: &[GateStep]) -> Self {
        let mut dag = CircuitDAG::new();
        let mut ordered: Vec<&GateStep> = steps.iter().collect();
        ordered.sort_by_key(|s| s.timestep);

        let mut last_on_qubit: HashMap<usize, NodeId> = HashMap::new();

        for step in ordered {
            let gate_type = canonicalize_gate_type(&step.gate_type);
            if gate_type == "MEASUREMENT" {
                continue;
            }

            let qubits = step.qubits();
            let num_controls = if step.controls.is_empty() && step.targets.is_empty() { 0 } else { step.controls.len() };
            let node_id = dag.add_gate(gate_type, qubits.clone(), step.theta, num_controls);

            for q in qubits {
                if let Some(&prev) = last_on_qubit.get(&q) {
                    dag.add_edge(prev, node_id);
                }
                last_on_qubit.insert(q, node_id);
            }
        }

        for (&id, node) in dag.nodes.iter() {
            if node.predecessors.is_empty() {
                dag.input_nodes.insert(id);
            }
            if node.successors.is_empty() {
                dag.output_nodes.insert(id);
            }
        }

        dag.compute_layers();
        dag
    }

    fn compute_layers(&mut self) {
        for id in self.topological_order() {
            let layer = {
                let node = &self.nodes[&id];
                if node.predecessors.is_empty() {
                    0
                } else {
                    node.predecessors.iter().map(|p| self.nodes[p].layer).max().unwrap() + 1
                }
            };
            self.nodes.get_mut(&id).unwrap().layer = layer;
        }
    }

    /// Post-order DFS over successors from the input nodes, reversed, then
    /// any nodes not reached that way (defensive, mirrors the original).
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut visited = BTreeSet::new();
        let mut result = Vec::new();

        fn visit(id: NodeId, nodes: &HashMap<NodeId, DAGNode>, visited: &mut BTreeSet<NodeId>, result: &mut Vec<NodeId>) {
            if !visited.insert(id) {
                return;
            }
            if let Some(node) = nodes.get(&id) {
                for &succ in &node.successors {
                    visit(succ, nodes, visited, result);
                }
            }
            result.push(id);
        }

        for &id in &self.input_nodes {
            visit(id, &self.nodes, &mut visited, &mut result);
        }
        let mut remaining: Vec<NodeId> = self.nodes.keys().copied().collect();
        remaining.sort_unstable();
        for id in remaining {
            visit(id, &self.nodes, &mut visited, &mut result);
        }

        result.reverse();
        result
    }

    /// Reconstructs a step list, one step per node, ordered topologically
    /// with `timestep` set to the node's layer (§4.6).
    pub fn to_circuit(&self) -> Vec<GateStep> {
        self.topological_order()
            .into_iter()
            .map(|id| {
                let node = &self.nodes[&id];
                let mut step = GateStep::new(node.gate_type.clone(), node.layer as i64);
                if node.num_controls == 0 && node.qubits.len() == 1 {
                    step = step.with_qubit(node.qubits[0]);
                } else if !node.qubits.is_empty() {
                    let controls = node.qubits[..node.num_controls].to_vec();
                    let targets = node.qubits[node.num_controls..].to_vec();
                    step = step.with_controls_targets(controls, targets);
                }
                if let Some(theta) = node.theta {
                    step = step.with_theta(theta);
                }
                step
            })
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.nodes.values().map(|n| n.layer).max().map(|l| l + 1).unwrap_or(0)
    }

    pub fn gate_count(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes.values() {
            *counts.entry(node.gate_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Finds every node sequence matching `pattern` (gate type, arity pairs)
    /// by walking successor chains (§4.7's cancellation/fusion passes use
    /// this for detection).
    pub fn find_pattern(&self, pattern: &[(&str, usize)]) -> Vec<Vec<NodeId>> {
        let mut matches = Vec::new();
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        for start in ids {
            if let Some(m) = self.match_pattern_from(start, pattern) {
                matches.push(m);
            }
        }
        matches
    }

    fn match_pattern_from(&self, start: NodeId, pattern: &[(&str, usize)]) -> Option<Vec<NodeId>> {
        if pattern.is_empty() {
            return Some(Vec::new());
        }
        let node = self.nodes.get(&start)?;
        let (gate_type, num_qubits) = pattern[0];
        if node.gate_type != gate_type || node.qubits.len() != num_qubits {
            return None;
        }
        if pattern.len() == 1 {
            return Some(vec![start]);
        }
        for &succ in &node.successors {
            if let Some(mut rest) = self.match_pattern_from(succ, &pattern[1..]) {
                let mut full = vec![start];
                full.append(&mut rest);
                return Some(full);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bell_steps() -> Vec<GateStep> {
        vec![
            GateStep::new("H", 0).with_qubit(0),
            GateStep::new("CNOT", 1).with_controls_targets(vec![0], vec![1]),
        ]
    }

    #[test]
    fn from_circuit_links_sequential_gates_on_shared_qubits() {
        let dag = CircuitDAG::from_circuit(&bell_steps());
        assert_eq!(dag.len(), 2);
        assert_eq!(dag.depth(), 2);
    }

    #[test]
    fn to_circuit_round_trips_gate_types_and_qubit_roles() {
        let dag = CircuitDAG::from_circuit(&bell_steps());
        let steps = dag.to_circuit();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].gate_type, "H");
        assert_eq!(steps[1].gate_type, "CNOT");
        assert_eq!(steps[1].controls, vec![0]);
        assert_eq!(steps[1].targets, vec![1]);
    }

    #[test]
    fn to_circuit_preserves_swap_and_cswap_as_control_free_targets() {
        let steps = vec![
            GateStep::new("SWAP", 0).with_controls_targets(vec![], vec![0, 1]),
            GateStep::new("CSWAP", 1).with_controls_targets(vec![2], vec![0, 1]),
        ];
        let dag = CircuitDAG::from_circuit(&steps);
        let round_tripped = dag.to_circuit();

        let swap = round_tripped.iter().find(|s| s.gate_type == "SWAP").unwrap();
        assert!(swap.controls.is_empty());
        assert_eq!(swap.targets, vec![0, 1]);

        let cswap = round_tripped.iter().find(|s| s.gate_type == "CSWAP").unwrap();
        assert_eq!(cswap.controls, vec![2]);
        assert_eq!(cswap.targets, vec![0, 1]);
    }

    #[test]
    fn remove_node_reconnects_predecessors_and_successors() {
        let mut dag = CircuitDAG::new();
        let a = dag.add_gate("H", vec![0], None, 0);
        let b = dag.add_gate("X", vec![0], None, 0);
        let c = dag.add_gate("Z", vec![0], None, 0);
        dag.add_edge(a, b);
        dag.add_edge(b, c);

        dag.remove_node(b);

        assert!(dag.node(a).unwrap().successors.contains(&c));
        assert!(dag.node(c).unwrap().predecessors.contains(&a));
    }

    #[test]
    fn find_pattern_matches_a_two_gate_chain() {
        let dag = CircuitDAG::from_circuit(&bell_steps());
        let matches = dag.find_pattern(&[("H", 1), ("CNOT", 2)]);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn gate_count_tallies_by_canonical_type() {
        let dag = CircuitDAG::from_circuit(&bell_steps());
        let counts = dag.gate_count();
        assert_eq!(counts["H"], 1);
        assert_eq!(counts["CNOT"], 1);
    }
}
