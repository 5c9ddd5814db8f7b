//! Safe-error fault analysis of ECDSA over a Montgomery ladder
//!
//! This library provides prime-field and short Weierstrass curve arithmetic, a
//! scalar-multiplication ladder with a single injectable fault, ECDSA built on
//! that ladder, and the pipeline turning faulted signatures into Hidden Number
//! Problem hints for a lattice solver.

pub mod attack;
pub mod curve;
pub mod ecdsa;
pub mod error;
pub mod math;
pub mod provider;
pub mod signature;

pub use attack::{LeakModel, LeakSide, SafeErrorAnalysis};
pub use curve::{AffinePoint, Curve, JacobianPoint};
pub use ecdsa::{Fault, Keypair, Ladder, ScalarMul};
pub use error::{Error, Result};
pub use signature::Signature;
