//! Hardware Abstraction Layer.
#![cfg_attr(not(test), no_std)]

pub mod diag;
pub mod mmio;
pub mod serial;

pub use diag::{DiagnosticPort, DiagnosticWriter};
pub use serial::{LineStatus, Ns16550a};
