//! Circuit analysis and kernel selection (§4.5): a strategy-pattern
//! dispatcher that looks at a circuit's gate-type set and qubit count and
//! picks the cheapest kernel that can run it exactly.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::warn;

use crate::core::circuit::{canonicalize_gate_type, GateStep, CLIFFORD_GATE_TYPES, PARAMETRIC_GATE_TYPES};
use crate::core::clifford::CliffordKernel;
use crate::core::config::KernelManagerConfig;
use crate::core::error::CoreResult;
use crate::core::noise::NoiseModel;
use crate::core::statevector::StatevectorKernel;
use crate::Complex;

const DEFAULT_MAX_STATEVECTOR_QUBITS: usize = 25;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CircuitAnalysis {
    pub gate_types: BTreeSet<String>,
    pub num_gates: usize,
    pub is_clifford_only: bool,
    pub has_parametric: bool,
    pub has_measurement: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelKind {
    Statevector,
    Clifford,
    /// No tensor-network backend is implemented; selecting this kind falls
    /// back to the state-vector kernel with a logged warning (§4.5).
    TensorNetwork,
}

pub struct KernelManager {
    max_statevector_qubits: usize,
}

impl KernelManager {
    pub fn new() -> Self {
        KernelManager { max_statevector_qubits: DEFAULT_MAX_STATEVECTOR_QUBITS }
    }

    pub fn with_max_statevector_qubits(max_statevector_qubits: usize) -> Self {
        KernelManager { max_statevector_qubits }
    }

    pub fn analyze_circuit(&self, steps: &[GateStep]) -> CircuitAnalysis {
        let mut gate_types = BTreeSet::new();
        let mut has_parametric = false;
        let mut has_measurement = false;

        for step in steps {
            let gate_type = canonicalize_gate_type(&step.gate_type);
            if PARAMETRIC_GATE_TYPES.contains(&gate_type.as_str()) {
                has_parametric = true;
            }
            if gate_type == "MEASUREMENT" {
                has_measurement = true;
            }
            gate_types.insert(gate_type);
        }

        let clifford_set: BTreeSet<&str> = CLIFFORD_GATE_TYPES.iter().copied().collect();
        let is_clifford_only = gate_types.iter().all(|g| clifford_set.contains(g.as_str()) || g == "I");

        CircuitAnalysis {
            gate_types,
            num_gates: steps.len(),
            is_clifford_only,
            has_parametric,
            has_measurement,
        }
    }

    pub fn select_kernel(&self, num_qubits: usize, analysis: &CircuitAnalysis) -> KernelKind {
        if num_qubits > self.max_statevector_qubits {
            if analysis.is_clifford_only {
                return KernelKind::Clifford;
            }
            return KernelKind::TensorNetwork;
        }
        KernelKind::Statevector
    }

    /// Rejects an explicit request for exact state-vector simulation above
    /// the configured cap, rather than silently falling back (§7 `KernelCapacity`).
    pub fn validate_statevector_capacity(&self, num_qubits: usize) -> CoreResult<()> {
        if num_qubits > self.max_statevector_qubits {
            return Err(crate::core::error::CoreError::KernelCapacity {
                num_qubits,
                cap: self.max_statevector_qubits,
            });
        }
        Ok(())
    }
}

impl Default for KernelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl From<KernelManagerConfig> for KernelManager {
    fn from(config: KernelManagerConfig) -> Self {
        KernelManager::with_max_statevector_qubits(config.max_statevector_qubits)
    }
}

/// Either concrete kernel the executor can drive; kept as a closed enum
/// rather than a trait object since the two kernels' capabilities diverge
/// (only the state-vector kernel supports parametric gates and noise).
pub enum Kernel {
    Statevector(StatevectorKernel),
    Clifford(CliffordKernel),
}

/// Orchestrates kernel selection, circuit execution, and result extraction
/// (§4.5), mirroring the caller-facing entry point described in §6.
pub struct CircuitExecutor {
    manager: KernelManager,
    noise_model: Option<NoiseModel>,
    kernel: Option<Kernel>,
}

impl CircuitExecutor {
    pub fn new() -> Self {
        CircuitExecutor { manager: KernelManager::new(), noise_model: None, kernel: None }
    }

    pub fn with_config(config: KernelManagerConfig) -> Self {
        CircuitExecutor { manager: KernelManager::from(config), noise_model: None, kernel: None }
    }

    pub fn with_noise_model(noise_model: NoiseModel) -> Self {
        let mut executor = Self::new();
        executor.noise_model = Some(noise_model);
        executor
    }

    pub fn execute(
        &mut self,
        num_qubits: usize,
        steps: &[GateStep],
        noise_level: f64,
    ) -> CoreResult<(BTreeMap<String, f64>, Vec<Complex>)> {
        let analysis = self.manager.analyze_circuit(steps);
        let mut kind = self.manager.select_kernel(num_qubits, &analysis);
        if kind == KernelKind::TensorNetwork {
            warn!(num_qubits, "no tensor-network backend available, falling back to state-vector");
            kind = KernelKind::Statevector;
        }

        let mut kernel = match kind {
            KernelKind::Statevector => {
                let noise = self.noise_model.take().or_else(|| {
                    if noise_level > 0.0 {
                        use crate::core::noise::NoiseConfig;
                        Some(NoiseModel::new(NoiseConfig::default().with_global(0.0, 0.0, 0.0, noise_level)))
                    } else {
                        None
                    }
                });
                let sv = match noise {
                    Some(n) => StatevectorKernel::with_noise_model(n),
                    None => StatevectorKernel::new(),
                };
                Kernel::Statevector(sv)
            }
            KernelKind::Clifford => Kernel::Clifford(CliffordKernel::new()),
            KernelKind::TensorNetwork => unreachable!("fallen back above"),
        };

        match &mut kernel {
            Kernel::Statevector(k) => k.initialize(num_qubits),
            Kernel::Clifford(k) => k.initialize(num_qubits),
        }

        for step in steps {
            execute_step(&mut kernel, step)?;
        }

        let result = match &mut kernel {
            Kernel::Statevector(k) => (k.get_probabilities(), k.get_statevector()),
            Kernel::Clifford(k) => (k.get_probabilities(), k.get_statevector()),
        };

        self.kernel = Some(kernel);
        Ok(result)
    }

    /// Like `execute`, but demands exact state-vector simulation regardless
    /// of the analysis, rejecting circuits above the configured qubit cap
    /// instead of approximating or falling back (§7 `KernelCapacity`).
    pub fn execute_forcing_statevector(
        &mut self,
        num_qubits: usize,
        steps: &[GateStep],
        noise_level: f64,
    ) -> CoreResult<(BTreeMap<String, f64>, Vec<Complex>)> {
        self.manager.validate_statevector_capacity(num_qubits)?;
        self.execute(num_qubits, steps, noise_level)
    }
}

impl Default for CircuitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn execute_step(kernel: &mut Kernel, step: &GateStep) -> CoreResult<()> {
    let gate_type = canonicalize_gate_type(&step.gate_type);

    match gate_type.as_str() {
        "MEASUREMENT" => {
            let q = step.qubit.unwrap_or(0);
            match kernel {
                Kernel::Statevector(k) => {
                    k.measure(q);
                }
                Kernel::Clifford(k) => {
                    k.measure(q);
                }
            }
        }
        "RESET" | "BARRIER" => {}
        "CNOT" | "CCNOT" | "CZ" if !step.targets.is_empty() => {
            let target = step.targets[0];
            match kernel {
                Kernel::Statevector(k) => {
                    if gate_type == "CCNOT" && step.controls.len() == 2 {
                        let mut qubits = step.controls.clone();
                        qubits.push(target);
                        k.apply_multi_qubit_gate("CCNOT", &qubits);
                    } else {
                        k.apply_controlled_gate(&gate_type, &step.controls, target);
                    }
                }
                Kernel::Clifford(k) => {
                    k.apply_controlled_gate(&gate_type, &step.controls, target)?;
                }
            }
        }
        "CSWAP" if step.targets.len() >= 2 => {
            if let Kernel::Statevector(k) = kernel {
                let mut qubits = step.controls.clone();
                qubits.extend(&step.targets[..2]);
                k.apply_multi_qubit_gate("CSWAP", &qubits);
            }
        }
        "SWAP" if step.targets.len() >= 2 => match kernel {
            Kernel::Statevector(k) => k.apply_swap(step.targets[0], step.targets[1]),
            Kernel::Clifford(k) => k.apply_swap(step.targets[0], step.targets[1])?,
        },
        "CRX" | "CRY" | "CRZ" | "CP" if !step.controls.is_empty() && !step.targets.is_empty() => {
            if let Kernel::Statevector(k) = kernel {
                k.apply_controlled_rotation(&gate_type, step.controls[0], step.targets[0], step.theta.unwrap_or(0.0));
            }
        }
        _ => {
            let q = step.qubit.unwrap_or(0);
            match kernel {
                Kernel::Statevector(k) => k.apply_gate(&gate_type, q, step.theta),
                Kernel::Clifford(k) => k.apply_gate(&gate_type, q),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::GateStep;

    fn bell_steps() -> Vec<GateStep> {
        vec![
            GateStep::new("H", 0).with_qubit(0),
            GateStep::new("CNOT", 1).with_controls_targets(vec![0], vec![1]),
        ]
    }

    #[test]
    fn clifford_only_small_circuit_selects_statevector() {
        let manager = KernelManager::new();
        let steps = bell_steps();
        let analysis = manager.analyze_circuit(&steps);
        assert!(analysis.is_clifford_only);
        assert_eq!(manager.select_kernel(2, &analysis), KernelKind::Statevector);
    }

    #[test]
    fn clifford_only_large_circuit_selects_clifford_kernel() {
        let manager = KernelManager::new();
        let steps = bell_steps();
        let analysis = manager.analyze_circuit(&steps);
        assert_eq!(manager.select_kernel(30, &analysis), KernelKind::Clifford);
    }

    #[test]
    fn parametric_gate_breaks_clifford_only_classification() {
        let manager = KernelManager::new();
        let steps = vec![GateStep::new("RX", 0).with_qubit(0).with_theta(0.5)];
        let analysis = manager.analyze_circuit(&steps);
        assert!(!analysis.is_clifford_only);
        assert!(analysis.has_parametric);
    }

    #[test]
    fn executor_runs_a_bell_pair_and_returns_expected_probabilities() {
        let mut executor = CircuitExecutor::new();
        let steps = bell_steps();
        let (probs, _sv) = executor.execute(2, &steps, 0.0).unwrap();
        assert!((probs["00"] - 0.5).abs() < 1e-9);
        assert!((probs["11"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn forcing_statevector_above_the_cap_is_a_kernel_capacity_error() {
        let mut executor = CircuitExecutor::new();
        let steps = vec![GateStep::new("RX", 0).with_qubit(0).with_theta(0.3)];
        let err = executor.execute_forcing_statevector(30, &steps, 0.0).unwrap_err();
        assert!(matches!(err, crate::core::error::CoreError::KernelCapacity { num_qubits: 30, cap: 25 }));
    }

    #[test]
    fn executor_built_from_a_lowered_config_cap_rejects_a_smaller_forced_request() {
        use crate::core::config::KernelManagerConfig;

        let config = KernelManagerConfig::new().with_max_statevector_qubits(4);
        let mut executor = CircuitExecutor::with_config(config);
        let steps = vec![GateStep::new("RX", 0).with_qubit(0).with_theta(0.3)];
        let err = executor.execute_forcing_statevector(10, &steps, 0.0).unwrap_err();
        assert!(matches!(err, crate::core::error::CoreError::KernelCapacity { num_qubits: 10, cap: 4 }));
    }

    #[test]
    fn non_clifford_circuit_above_the_cap_falls_back_to_statevector_with_a_warning() {
        let _ = tracing_subscriber::fmt().try_init();

        let mut executor = CircuitExecutor::new();
        let steps = vec![GateStep::new("RX", 0).with_qubit(0).with_theta(0.3)];
        let (probs, _sv) = executor.execute(30, &steps, 0.0).unwrap();
        assert!(!probs.is_empty());
    }
}
