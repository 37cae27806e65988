//! The step-list data model shared by every kernel, the DAG, and the
//! transpiler (§3, §6).

use serde::{Deserialize, Serialize};

/// A single gate/measurement/reset descriptor, in the caller-facing wire
/// format (§6). `gate_type` has already been alias-canonicalized to an
/// uppercase identifier by [`canonicalize_gate_type`] before it reaches any
/// kernel or the DAG.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GateStep {
    #[serde(rename = "gateType")]
    pub gate_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qubit: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
    #[serde(rename = "classicalBit", default, skip_serializing_if = "Option::is_none")]
    pub classical_bit: Option<usize>,
    pub timestep: i64,
}

impl GateStep {
    pub fn new(gate_type: impl Into<String>, timestep: i64) -> Self {
        GateStep {
            gate_type: gate_type.into(),
            qubit: None,
            controls: Vec::new(),
            targets: Vec::new(),
            theta: None,
            classical_bit: None,
            timestep,
        }
    }

    pub fn with_qubit(mut self, qubit: usize) -> Self {
        self.qubit = Some(qubit);
        self
    }

    pub fn with_controls_targets(mut self, controls: Vec<usize>, targets: Vec<usize>) -> Self {
        self.controls = controls;
        self.targets = targets;
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = Some(theta);
        self
    }

    pub fn with_classical_bit(mut self, bit: usize) -> Self {
        self.classical_bit = Some(bit);
        self
    }

    /// The full set of qubits this step touches, in (controls ++ targets) or
    /// single-`qubit` order, matching §4.6's DAG-construction rule.
    pub fn qubits(&self) -> Vec<usize> {
        if !self.controls.is_empty() || !self.targets.is_empty() {
            let mut q = self.controls.clone();
            q.extend(&self.targets);
            q
        } else if let Some(q) = self.qubit {
            vec![q]
        } else {
            Vec::new()
        }
    }

    pub fn is_measurement(&self) -> bool {
        self.gate_type == "MEASUREMENT"
    }

    pub fn is_reset(&self) -> bool {
        self.gate_type == "RESET"
    }

    pub fn is_single_qubit(&self) -> bool {
        self.controls.is_empty() && self.targets.is_empty() && self.qubit.is_some()
    }
}

/// Canonicalizes a caller-supplied gate type string to the identifiers in
/// §3: `{I,X,Y,Z,H,S,SDG,T,TDG,SX,SXDG,RX,RY,RZ,P,U1,U2,U3,CNOT,CZ,CCNOT,
/// CRX,CRY,CRZ,CP,SWAP,CSWAP,MEASUREMENT,RESET,BARRIER}`.
pub fn canonicalize_gate_type(raw: &str) -> String {
    let upper = raw.to_uppercase();
    match upper.as_str() {
        "S†" | "S\u{2020}" | "SDAGGER" => "SDG".to_string(),
        "T†" | "T\u{2020}" | "TDAGGER" => "TDG".to_string(),
        "CCX" | "TOFFOLI" => "CCNOT".to_string(),
        "CX" => "CNOT".to_string(),
        "M" => "MEASUREMENT".to_string(),
        other => other.to_string(),
    }
}

/// Known canonical single-qubit fixed gate types (no parameters, no
/// control), used by the kernel manager's Clifford-only analysis (§4.5).
pub const CLIFFORD_GATE_TYPES: &[&str] =
    &["I", "H", "S", "SDG", "X", "Y", "Z", "CNOT", "CZ", "SWAP", "MEASUREMENT"];

pub const PARAMETRIC_GATE_TYPES: &[&str] =
    &["RX", "RY", "RZ", "P", "U1", "U2", "U3", "CRX", "CRY", "CRZ", "CP"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_canonicalize_to_spec_identifiers() {
        assert_eq!(canonicalize_gate_type("cx"), "CNOT");
        assert_eq!(canonicalize_gate_type("ccx"), "CCNOT");
        assert_eq!(canonicalize_gate_type("toffoli"), "CCNOT");
        assert_eq!(canonicalize_gate_type("s\u{2020}"), "SDG");
        assert_eq!(canonicalize_gate_type("m"), "MEASUREMENT");
        assert_eq!(canonicalize_gate_type("h"), "H");
    }

    #[test]
    fn qubits_prefers_controls_and_targets_over_single_qubit() {
        let step = GateStep::new("CNOT", 0).with_controls_targets(vec![0], vec![1]);
        assert_eq!(step.qubits(), vec![0, 1]);

        let single = GateStep::new("H", 0).with_qubit(2);
        assert_eq!(single.qubits(), vec![2]);
    }
}
