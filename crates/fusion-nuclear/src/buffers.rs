// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — MOC Working Buffers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Numeric state owned by one solver instance.
//!
//! Allocated from the current bindings at the start of every solve and
//! dropped with the solver.

use ndarray::{Array1, Array2, Array3};

#[derive(Debug, Clone)]
pub(crate) struct MocBuffers {
    pub num_polar: usize,
    pub fsr_volumes: Array1<f64>,
    pub fsr_materials: Array1<usize>,
    /// Total cross section per region, `(num_fsrs, num_groups)`.
    pub sigma_t: Array2<f64>,
    pub scalar_flux: Array2<f64>,
    pub fission_sources: Array2<f64>,
    pub scatter_sources: Array2<f64>,
    pub source: Array2<f64>,
    pub old_source: Array2<f64>,
    /// `source / Σt`
    pub reduced_source: Array2<f64>,
    pub source_residuals: Array1<f64>,
    /// Incoming angular flux, `(num_tracks, 2, num_polar · num_groups)`.
    pub boundary_flux: Array3<f64>,
    /// Angular flux leaving each track end during the current sweep.
    pub outgoing_flux: Array3<f64>,
    pub boundary_leakage: f64,
    /// `(num_mesh_cells · 8, num_groups)`, empty without acceleration.
    pub surface_currents: Array2<f64>,
}

impl MocBuffers {
    pub(crate) fn allocate(
        num_fsrs: usize,
        num_groups: usize,
        num_tracks: usize,
        num_polar: usize,
        num_surfaces: usize,
    ) -> Self {
        let region_group = (num_fsrs, num_groups);
        let track_shape = (num_tracks, 2, num_polar * num_groups);
        MocBuffers {
            num_polar,
            fsr_volumes: Array1::zeros(num_fsrs),
            fsr_materials: Array1::zeros(num_fsrs),
            sigma_t: Array2::zeros(region_group),
            scalar_flux: Array2::zeros(region_group),
            fission_sources: Array2::zeros(region_group),
            scatter_sources: Array2::zeros(region_group),
            source: Array2::zeros(region_group),
            old_source: Array2::zeros(region_group),
            reduced_source: Array2::zeros(region_group),
            source_residuals: Array1::zeros(num_fsrs),
            boundary_flux: Array3::zeros(track_shape),
            outgoing_flux: Array3::zeros(track_shape),
            boundary_leakage: 0.0,
            surface_currents: Array2::zeros((num_surfaces, num_groups)),
        }
    }

    pub(crate) fn num_fsrs(&self) -> usize {
        self.scalar_flux.nrows()
    }

    pub(crate) fn num_groups(&self) -> usize {
        self.scalar_flux.ncols()
    }

    pub(crate) fn polar_times_groups(&self) -> usize {
        self.num_polar * self.num_groups()
    }

    pub(crate) fn flatten_fluxes(&mut self, value: f64) {
        self.scalar_flux.fill(value);
    }

    pub(crate) fn flatten_sources(&mut self, value: f64) {
        self.source.fill(value);
        self.old_source.fill(value);
    }

    pub(crate) fn zero_track_fluxes(&mut self) {
        self.boundary_flux.fill(0.0);
        self.outgoing_flux.fill(0.0);
        self.boundary_leakage = 0.0;
    }
}
