//! Error kinds surfaced at the core's public boundary (§7).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid circuit: {reason}")]
    InvalidCircuit { reason: String },

    #[error("arity mismatch: {reason}")]
    ArityMismatch { reason: String },

    #[error("topology error: {reason}")]
    TopologyError { reason: String },

    #[error("routing stalled after {gates_routed} of {total_gates} gates")]
    RoutingStalled {
        gates_routed: usize,
        total_gates: usize,
    },

    #[error("kernel capacity exceeded: {num_qubits} qubits requested, cap is {cap}")]
    KernelCapacity { num_qubits: usize, cap: usize },
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn invalid_circuit(reason: impl Into<String>) -> Self {
        CoreError::InvalidCircuit { reason: reason.into() }
    }

    pub fn arity_mismatch(reason: impl Into<String>) -> Self {
        CoreError::ArityMismatch { reason: reason.into() }
    }

    pub fn topology_error(reason: impl Into<String>) -> Self {
        CoreError::TopologyError { reason: reason.into() }
    }
}
