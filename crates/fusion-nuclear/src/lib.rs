// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Fusion Nuclear
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Method-of-characteristics neutron transport.
//!
//! Source iteration for the multiplication eigenvalue `k_eff` on a 2D
//! flat-source region model: materials and geometry, cyclic tracks, polar
//! quadrature, the exponential kernel, the parallel transport sweep and the
//! [`solver::MocSolver`] controller with its acceleration seam.

pub mod accelerator;
mod buffers;
mod coverage;
mod eigen;
pub mod exponential;
pub mod geometry;
pub mod material;
pub mod quadrature;
pub mod report;
pub mod slab;
pub mod solver;
mod sweep;
pub mod timer;
pub mod track;
