//! Mathematical primitives for SCPN Fusion Core.

pub mod interp;
pub mod summation;
