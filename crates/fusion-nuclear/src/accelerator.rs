// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Acceleration Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Coarse-mesh acceleration seam.
//!
//! The solver hands the fine-mesh flux and surface currents to an
//! [`Accelerator`] once per iteration. The coarse solve itself (CMFD or
//! anything else) lives behind the trait.

use fusion_types::error::FusionResult;
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut2};

/// Surfaces tallied per coarse cell: four faces then four corners.
pub const SURFACES_PER_CELL: usize = 8;

/// Local surface index within a coarse cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshSurface {
    XMin = 0,
    YMin = 1,
    XMax = 2,
    YMax = 3,
    XMinYMin = 4,
    XMaxYMin = 5,
    XMaxYMax = 6,
    XMinYMax = 7,
}

impl MeshSurface {
    /// Global surface id used by segment tallies.
    pub fn id(self, cell: usize) -> usize {
        cell * SURFACES_PER_CELL + self as usize
    }
}

/// Fine-mesh data fixed for the whole solve.
#[derive(Debug, Clone, Copy)]
pub struct FineMeshLayout<'a> {
    pub num_groups: usize,
    pub num_mesh_cells: usize,
    pub volumes: ArrayView1<'a, f64>,
    pub materials: ArrayView1<'a, usize>,
}

/// Fine-mesh state after a transport sweep.
#[derive(Debug)]
pub struct FineMeshState<'a> {
    /// `(num_fsrs, num_groups)`; the accelerator may rescale it.
    pub scalar_flux: ArrayViewMut2<'a, f64>,
    /// `(num_mesh_cells · 8, num_groups)` net currents from the last sweep.
    pub surface_currents: ArrayView2<'a, f64>,
    pub k_eff: f64,
}

pub trait Accelerator: Send {
    /// When false the solver skips current tallies and `compute_keff`.
    fn is_active(&self) -> bool;

    /// Coarse group count; 0 until a group structure exists.
    fn num_groups(&self) -> usize;

    /// Build a default coarse group structure for `num_fine_groups`.
    fn create_group_structure(&mut self, num_fine_groups: usize);

    fn initialize(&mut self, layout: &FineMeshLayout<'_>) -> FusionResult<()>;

    /// Coarse-mesh eigenvalue; may correct `state.scalar_flux` in place.
    fn compute_keff(&mut self, state: &mut FineMeshState<'_>) -> FusionResult<f64>;
}

/// Pass-through accelerator used when none is bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAcceleration;

impl Accelerator for NoAcceleration {
    fn is_active(&self) -> bool {
        false
    }

    fn num_groups(&self) -> usize {
        0
    }

    fn create_group_structure(&mut self, _num_fine_groups: usize) {}

    fn initialize(&mut self, _layout: &FineMeshLayout<'_>) -> FusionResult<()> {
        Ok(())
    }

    fn compute_keff(&mut self, state: &mut FineMeshState<'_>) -> FusionResult<f64> {
        Ok(state.k_eff)
    }
}
