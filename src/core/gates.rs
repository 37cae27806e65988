//! Fixed and parametric gate matrices (§4.1 of the core design).
//!
//! Rotation gates use the half-angle convention: `RX(θ)` has `cos(θ/2)` on
//! the diagonal, matching the reference kernel this was ported from.

use crate::{complex, matrix, Complex, Matrix};
use std::f64::consts::FRAC_1_SQRT_2;

/// A named unitary together with the qubit arity it acts on.
#[derive(Clone)]
pub struct QuantumGate {
    pub name: &'static str,
    pub matrix: Matrix<Complex>,
    pub num_qubits: usize,
}

impl QuantumGate {
    pub fn new(name: &'static str, matrix: Matrix<Complex>, num_qubits: usize) -> Self {
        let expected_dim = 1usize << num_qubits;
        assert_eq!(matrix.rows, expected_dim, "gate matrix rows must be 2^num_qubits");
        assert_eq!(matrix.cols, expected_dim, "gate matrix cols must be 2^num_qubits");
        QuantumGate { name, matrix, num_qubits }
    }
}

impl std::fmt::Display for QuantumGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub fn rx_matrix(theta: f64) -> Matrix<Complex> {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(cos, 0.0), complex!(0.0, -sin)];
        [complex!(0.0, -sin), complex!(cos, 0.0)]
    )
}

pub fn ry_matrix(theta: f64) -> Matrix<Complex> {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(cos, 0.0), complex!(-sin, 0.0)];
        [complex!(sin, 0.0), complex!(cos, 0.0)]
    )
}

pub fn rz_matrix(theta: f64) -> Matrix<Complex> {
    let half = theta / 2.0;
    matrix!(
        [complex!(half.cos(), -half.sin()), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(half.cos(), half.sin())]
    )
}

pub fn p_matrix(theta: f64) -> Matrix<Complex> {
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(theta.cos(), theta.sin())]
    )
}

pub fn u1_matrix(lambda: f64) -> Matrix<Complex> {
    p_matrix(lambda)
}

pub fn u2_matrix(phi: f64, lambda: f64) -> Matrix<Complex> {
    let inv_sqrt2 = FRAC_1_SQRT_2;
    matrix!(
        [complex!(inv_sqrt2, 0.0), complex!(-inv_sqrt2 * lambda.cos(), -inv_sqrt2 * lambda.sin())];
        [complex!(inv_sqrt2 * phi.cos(), inv_sqrt2 * phi.sin()), complex!((phi + lambda).cos() * inv_sqrt2, (phi + lambda).sin() * inv_sqrt2)]
    )
}

pub fn u3_matrix(theta: f64, phi: f64, lambda: f64) -> Matrix<Complex> {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(cos, 0.0), complex!(-sin * lambda.cos(), -sin * lambda.sin())];
        [complex!(sin * phi.cos(), sin * phi.sin()), complex!(cos * (phi + lambda).cos(), cos * (phi + lambda).sin())]
    )
}

pub fn crx_matrix(theta: f64) -> Matrix<Complex> {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(cos, 0.0), complex!(0.0, -sin)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, -sin), complex!(cos, 0.0)]
    )
}

pub fn cry_matrix(theta: f64) -> Matrix<Complex> {
    let cos = (theta / 2.0).cos();
    let sin = (theta / 2.0).sin();
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(cos, 0.0), complex!(-sin, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(sin, 0.0), complex!(cos, 0.0)]
    )
}

pub fn crz_matrix(theta: f64) -> Matrix<Complex> {
    let half = theta / 2.0;
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(half.cos(), -half.sin()), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(half.cos(), half.sin())]
    )
}

pub fn cp_matrix(theta: f64) -> Matrix<Complex> {
    matrix!(
        [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0)];
        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(theta.cos(), theta.sin())]
    )
}

#[rustfmt::skip]
lazy_static::lazy_static! {
    pub static ref HADAMARD: QuantumGate = QuantumGate {
        name: "H",
        matrix: matrix!([complex!(1.0, 0.0), complex!( 1.0, 0.0)];
                        [complex!(1.0, 0.0), complex!(-1.0, 0.0)]) *
                complex!(FRAC_1_SQRT_2, 0.0),
        num_qubits: 1,
    };

    pub static ref PAULI_X: QuantumGate = QuantumGate {
        name: "X",
        matrix: matrix!([complex!(0.0, 0.0), complex!(1.0, 0.0)];
                        [complex!(1.0, 0.0), complex!(0.0, 0.0)]),
        num_qubits: 1,
    };

    pub static ref PAULI_Y: QuantumGate = QuantumGate {
        name: "Y",
        matrix: matrix!([complex!(0.0, 0.0), complex!(0.0, -1.0)];
                        [complex!(0.0, 1.0), complex!(0.0,  0.0)]),
        num_qubits: 1,
    };

    pub static ref PAULI_Z: QuantumGate = QuantumGate {
        name: "Z",
        matrix: matrix!([complex!(1.0, 0.0), complex!( 0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(-1.0, 0.0)]),
        num_qubits: 1,
    };

    pub static ref S_GATE: QuantumGate = QuantumGate {
        name: "S",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 1.0)]),
        num_qubits: 1,
    };

    pub static ref T_GATE: QuantumGate = QuantumGate {
        name: "T",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(FRAC_1_SQRT_2, FRAC_1_SQRT_2)]),
        num_qubits: 1,
    };

    pub static ref SDG_GATE: QuantumGate = QuantumGate {
        name: "SDG",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, -1.0)]),
        num_qubits: 1,
    };

    pub static ref TDG_GATE: QuantumGate = QuantumGate {
        name: "TDG",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)]),
        num_qubits: 1,
    };

    pub static ref SX_GATE: QuantumGate = QuantumGate {
        name: "SX",
        matrix: matrix!([complex!(0.5, 0.5), complex!(0.5, -0.5)];
                        [complex!(0.5, -0.5), complex!(0.5, 0.5)]),
        num_qubits: 1,
    };

    pub static ref SXDG_GATE: QuantumGate = QuantumGate {
        name: "SXDG",
        matrix: matrix!([complex!(0.5, -0.5), complex!(0.5, 0.5)];
                        [complex!(0.5, 0.5), complex!(0.5, -0.5)]),
        num_qubits: 1,
    };

    pub static ref IDENTITY: QuantumGate = QuantumGate {
        name: "I",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(1.0, 0.0)]),
        num_qubits: 1,
    };

    pub static ref CNOT: QuantumGate = QuantumGate {
        name: "CNOT",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0)]),
        num_qubits: 2,
    };

    pub static ref CZ: QuantumGate = QuantumGate {
        name: "CZ",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!( 0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!( 0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!( 0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(-1.0, 0.0)]),
        num_qubits: 2,
    };

    pub static ref SWAP_GATE: QuantumGate = QuantumGate {
        name: "SWAP",
        matrix: matrix!([complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
                        [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)]),
        num_qubits: 2,
    };

    pub static ref TOFFOLI: QuantumGate = QuantumGate {
        name: "CCNOT",
        matrix: matrix!(
            [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0)]
        ),
        num_qubits: 3,
    };

    pub static ref FREDKIN: QuantumGate = QuantumGate {
        name: "CSWAP",
        matrix: matrix!(
            [complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0)];
            [complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(0.0, 0.0), complex!(1.0, 0.0)]
        ),
        num_qubits: 3,
    };
}

/// Returns the fixed-matrix gate for every canonical gate-type name that
/// carries no parameters, or `None` for parametric/measurement/unknown types.
pub fn fixed_gate(gate_type: &str) -> Option<&'static QuantumGate> {
    match gate_type {
        "I" => Some(&IDENTITY),
        "X" => Some(&PAULI_X),
        "Y" => Some(&PAULI_Y),
        "Z" => Some(&PAULI_Z),
        "H" => Some(&HADAMARD),
        "S" => Some(&S_GATE),
        "SDG" => Some(&SDG_GATE),
        "T" => Some(&T_GATE),
        "TDG" => Some(&TDG_GATE),
        "SX" => Some(&SX_GATE),
        "SXDG" => Some(&SXDG_GATE),
        "CNOT" => Some(&CNOT),
        "CZ" => Some(&CZ),
        "SWAP" => Some(&SWAP_GATE),
        "CCNOT" => Some(&TOFFOLI),
        "CSWAP" => Some(&FREDKIN),
        _ => None,
    }
}
