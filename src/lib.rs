pub mod core;
pub mod maths;

pub use maths::complex::*;
pub use maths::format::*;
pub use maths::matrix::*;

pub use core::circuit::*;
pub use core::clifford::*;
pub use core::config::*;
pub use core::dag::*;
pub use core::error::*;
pub use core::gates;
pub use core::kernel_manager::*;
pub use core::noise::*;
pub use core::optimizer::*;
pub use core::router::*;
pub use core::statevector::*;
pub use core::topology::*;
pub use core::transpiler::*;
pub use core::vm::*;
