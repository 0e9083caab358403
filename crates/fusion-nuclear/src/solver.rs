// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — MOC Eigenvalue Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Source iteration for the multiplication eigenvalue `k_eff`.
//!
//! Per iteration: normalize → build sources → sweep → add local source →
//! accelerate → neutron balance → convergence test. The solver owns every
//! working buffer; geometry and tracks are shared read-only.

use crate::accelerator::{
    Accelerator, FineMeshLayout, FineMeshState, NoAcceleration, SURFACES_PER_CELL,
};
use crate::buffers::MocBuffers;
use crate::coverage;
use crate::eigen;
use crate::exponential::ExponentialKernel;
use crate::geometry::{BoundaryKind, Geometry, Side};
use crate::quadrature::PolarQuadrature;
use crate::report::{LogReporter, PerformanceReport, Reporter};
use crate::sweep::{transfer_boundary_flux, SweepContext};
use crate::timer::Timer;
use crate::track::{FlatTracks, TrackSource};
use fusion_types::config::{MocConfig, PolarQuadratureType};
use fusion_types::constants::{
    DEFAULT_NUM_POLAR, DEFAULT_SOURCE_CONVERGENCE_THRESHOLD, FLAT_INITIAL_VALUE, INITIAL_KEFF,
    MAX_NUM_POLAR,
};
use fusion_types::error::{FusionError, FusionResult};
use fusion_types::state::{EigenvalueResult, Precision, SolveState};
use ndarray::{ArrayView1, ArrayView2, ArrayView3};
use std::sync::Arc;

/// Timer split holding the wall time of the last solve.
const SOLVE_SPLIT: &str = "Total time to converge the source";

pub struct MocSolver {
    geometry: Option<Arc<dyn Geometry>>,
    tracks: Option<Arc<dyn TrackSource>>,
    flat: Option<FlatTracks>,
    accelerator: Option<Box<dyn Accelerator>>,
    reporter: Box<dyn Reporter>,
    pool: Option<rayon::ThreadPool>,

    num_polar: usize,
    quadrature_type: PolarQuadratureType,
    threshold: f64,
    interpolate_exponential: bool,

    quadrature: Option<PolarQuadrature>,
    kernel: Option<ExponentialKernel>,
    polar_weights: Vec<f64>,
    buffers: MocBuffers,

    k_eff: f64,
    balance_keff: f64,
    num_iterations: usize,
    residual: f64,
    residual_history: Vec<f64>,
    state: SolveState,
    timer: Timer,
}

impl std::fmt::Debug for MocSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MocSolver")
            .field("num_polar", &self.num_polar)
            .field("quadrature_type", &self.quadrature_type)
            .field("threshold", &self.threshold)
            .field("interpolate_exponential", &self.interpolate_exponential)
            .field("k_eff", &self.k_eff)
            .field("num_iterations", &self.num_iterations)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for MocSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MocSolver {
    pub fn new() -> Self {
        MocSolver {
            geometry: None,
            tracks: None,
            flat: None,
            accelerator: None,
            reporter: Box::new(LogReporter),
            pool: None,
            num_polar: DEFAULT_NUM_POLAR,
            quadrature_type: PolarQuadratureType::Tabuchi,
            threshold: DEFAULT_SOURCE_CONVERGENCE_THRESHOLD,
            interpolate_exponential: true,
            quadrature: None,
            kernel: None,
            polar_weights: Vec::new(),
            buffers: MocBuffers::allocate(0, 0, 0, DEFAULT_NUM_POLAR, 0),
            k_eff: INITIAL_KEFF,
            balance_keff: INITIAL_KEFF,
            num_iterations: 0,
            residual: 0.0,
            residual_history: Vec::new(),
            state: SolveState::Uninitialized,
            timer: Timer::new(),
        }
    }

    /// Solver bound to a geometry and a track set.
    pub fn with_models(
        geometry: Arc<dyn Geometry>,
        tracks: Arc<dyn TrackSource>,
    ) -> FusionResult<Self> {
        let mut solver = Self::new();
        solver.set_geometry(geometry)?;
        solver.set_track_generator(tracks)?;
        Ok(solver)
    }

    // ── Binding ──────────────────────────────────────────────────────

    pub fn set_geometry(&mut self, geometry: Arc<dyn Geometry>) -> FusionResult<()> {
        if geometry.num_regions() == 0 {
            return Err(FusionError::ConfigError(
                "Unable to set the geometry since it has no flat source regions".to_string(),
            ));
        }
        if geometry.num_energy_groups() == 0 {
            return Err(FusionError::ConfigError(
                "Unable to set the geometry since it has no energy groups".to_string(),
            ));
        }
        if let Some(side) = Side::ALL
            .iter()
            .find(|&&s| geometry.boundary(s) == BoundaryKind::ZeroFlux)
        {
            return Err(FusionError::ConfigError(format!(
                "Zero-flux boundary on {side:?} side; MOC transport supports only \
                 vacuum or reflective boundaries"
            )));
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    pub fn set_track_generator(&mut self, tracks: Arc<dyn TrackSource>) -> FusionResult<()> {
        if !tracks.contains_tracks() {
            return Err(FusionError::ConfigError(
                "Unable to set the track generator since it has not generated tracks"
                    .to_string(),
            ));
        }
        self.flat = Some(FlatTracks::build(tracks.as_ref())?);
        self.tracks = Some(tracks);
        Ok(())
    }

    pub fn set_accelerator(&mut self, accelerator: Box<dyn Accelerator>) {
        self.accelerator = Some(accelerator);
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporter = reporter;
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn set_num_polar_angles(&mut self, num_polar: i32) -> FusionResult<()> {
        if num_polar <= 0 {
            return Err(FusionError::ConfigError(format!(
                "Unable to set the number of polar angles to {num_polar}; it must be positive"
            )));
        }
        if num_polar as usize > MAX_NUM_POLAR {
            return Err(FusionError::ConfigError(format!(
                "Unable to set the number of polar angles to {num_polar}; \
                 only 1, 2 or 3 are supported"
            )));
        }
        self.num_polar = num_polar as usize;
        Ok(())
    }

    pub fn set_polar_quadrature_type(&mut self, quadrature_type: PolarQuadratureType) {
        self.quadrature_type = quadrature_type;
    }

    pub fn set_source_convergence_threshold(&mut self, threshold: f64) -> FusionResult<()> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "Unable to set the source convergence threshold to {threshold}; \
                 it must be a positive number"
            )));
        }
        self.threshold = threshold;
        Ok(())
    }

    pub fn use_exponential_interpolation(&mut self) {
        self.interpolate_exponential = true;
    }

    pub fn use_exponential_intrinsic(&mut self) {
        self.interpolate_exponential = false;
    }

    /// Run every phase on a dedicated pool of `num_threads` workers.
    pub fn set_num_threads(&mut self, num_threads: usize) -> FusionResult<()> {
        if num_threads == 0 {
            return Err(FusionError::ConfigError(
                "Unable to use 0 threads".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| FusionError::ConfigError(format!("Thread pool: {e}")))?;
        self.pool = Some(pool);
        Ok(())
    }

    /// Apply the solver options of a run configuration. `num_azim` belongs to
    /// the track builder, see [`crate::slab::build_slab_from_config`].
    pub fn apply_config(&mut self, config: &MocConfig) -> FusionResult<()> {
        config.validate()?;
        let num_polar = i32::try_from(config.num_polar).map_err(|_| {
            FusionError::ConfigError(format!("num_polar {} out of range", config.num_polar))
        })?;
        self.set_num_polar_angles(num_polar)?;
        self.set_polar_quadrature_type(config.quadrature);
        self.set_source_convergence_threshold(config.tolerance)?;
        if config.interpolate_exponential {
            self.use_exponential_interpolation();
        } else {
            self.use_exponential_intrinsic();
        }
        if let Some(threads) = config.num_threads {
            self.set_num_threads(threads)?;
        }
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn geometry(&self) -> FusionResult<&Arc<dyn Geometry>> {
        self.geometry.as_ref().ok_or_else(|| {
            FusionError::ConfigError(
                "Unable to return the geometry since it has not been set".to_string(),
            )
        })
    }

    pub fn track_generator(&self) -> FusionResult<&Arc<dyn TrackSource>> {
        self.tracks.as_ref().ok_or_else(|| {
            FusionError::ConfigError(
                "Unable to return the track generator since it has not been set".to_string(),
            )
        })
    }

    pub fn keff(&self) -> f64 {
        self.k_eff
    }

    /// Fine-mesh balance estimate of the last iteration.
    ///
    /// Equal to [`keff`](Self::keff) without an active accelerator. With one,
    /// `keff` carries the accelerator's value and this keeps the balance
    /// estimate for comparison.
    pub fn balance_keff(&self) -> f64 {
        self.balance_keff
    }

    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    /// Wall time of the last solve [s]; 0 before any solve.
    pub fn total_time(&self) -> f64 {
        self.timer.split(SOLVE_SPLIT).unwrap_or(0.0)
    }

    pub fn source_convergence_threshold(&self) -> f64 {
        self.threshold
    }

    pub fn num_polar_angles(&self) -> usize {
        self.num_polar
    }

    pub fn polar_quadrature_type(&self) -> PolarQuadratureType {
        self.quadrature_type
    }

    pub fn precision(&self) -> Precision {
        Precision::Double
    }

    pub fn is_using_double_precision(&self) -> bool {
        self.precision() == Precision::Double
    }

    /// Always false: fluxes and sources are stored as `f64`.
    pub fn is_using_single_precision(&self) -> bool {
        self.precision() != Precision::Double
    }

    pub fn is_using_exponential_interpolation(&self) -> bool {
        self.interpolate_exponential
    }

    pub fn is_using_exponential_intrinsic(&self) -> bool {
        !self.interpolate_exponential
    }

    pub fn is_using_cmfd(&self) -> bool {
        self.accelerator.as_ref().is_some_and(|a| a.is_active())
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    pub fn residual(&self) -> f64 {
        self.residual
    }

    pub fn residual_history(&self) -> &[f64] {
        &self.residual_history
    }

    pub fn result(&self) -> EigenvalueResult {
        EigenvalueResult {
            k_eff: self.k_eff,
            iterations: self.num_iterations,
            residual: self.residual,
            converged: self.state == SolveState::Converged,
            solve_time_s: self.total_time(),
            residual_history: self.residual_history.clone(),
        }
    }

    /// `(num_fsrs, num_groups)` scalar flux of the last solve.
    pub fn scalar_flux(&self) -> ArrayView2<'_, f64> {
        self.buffers.scalar_flux.view()
    }

    pub fn source(&self) -> ArrayView2<'_, f64> {
        self.buffers.source.view()
    }

    pub fn fsr_volumes(&self) -> ArrayView1<'_, f64> {
        self.buffers.fsr_volumes.view()
    }

    /// Incoming angular flux, `(num_tracks, 2, num_polar · num_groups)`.
    pub fn boundary_flux(&self) -> ArrayView3<'_, f64> {
        self.buffers.boundary_flux.view()
    }

    pub fn boundary_leakage(&self) -> f64 {
        self.buffers.boundary_leakage
    }

    /// Coverage check on the bound models without solving.
    pub fn verify_coverage(&self) -> FusionResult<()> {
        let geometry = self.geometry()?;
        let tracks = self.track_generator()?;
        let flat = self.flat()?;
        coverage::verify_coverage(tracks.as_ref(), flat, geometry.num_regions())
    }

    fn flat(&self) -> FusionResult<&FlatTracks> {
        self.flat.as_ref().ok_or_else(|| {
            FusionError::ConfigError("Tracks have not been flattened".to_string())
        })
    }

    // ── Solve ────────────────────────────────────────────────────────

    /// Iterate until the source residual drops below the threshold or
    /// `max_iterations` have run. Exhaustion is not an error: the last
    /// `k_eff` is returned and a warning reported.
    pub fn converge_source(&mut self, max_iterations: usize) -> FusionResult<f64> {
        let geometry = Arc::clone(self.geometry.as_ref().ok_or_else(|| {
            FusionError::ConfigError(
                "Unable to converge the source since no geometry is set".to_string(),
            )
        })?);
        let tracks = Arc::clone(self.tracks.as_ref().ok_or_else(|| {
            FusionError::ConfigError(
                "Unable to converge the source since no track generator is set".to_string(),
            )
        })?);

        let outcome = match self.pool.take() {
            Some(pool) => {
                let outcome =
                    pool.install(|| self.solve(geometry.as_ref(), tracks.as_ref(), max_iterations));
                self.pool = Some(pool);
                outcome
            }
            None => self.solve(geometry.as_ref(), tracks.as_ref(), max_iterations),
        };
        if outcome.is_err() {
            self.timer.stop();
            self.state = SolveState::Uninitialized;
        }
        outcome
    }

    fn solve(
        &mut self,
        geometry: &dyn Geometry,
        tracks: &dyn TrackSource,
        max_iterations: usize,
    ) -> FusionResult<f64> {
        self.reporter.normal("Converging the source...");
        self.timer.clear_split(SOLVE_SPLIT);
        self.timer.start();
        self.state = SolveState::Initializing;
        self.initialize(geometry, tracks)?;

        self.k_eff = INITIAL_KEFF;
        self.balance_keff = INITIAL_KEFF;
        self.residual = 0.0;
        self.num_iterations = 0;
        self.residual_history.clear();
        self.state = SolveState::Iterating;

        let mut accelerator = self
            .accelerator
            .take()
            .unwrap_or_else(|| Box::new(NoAcceleration) as Box<dyn Accelerator>);
        let outcome = self.iterate(geometry, tracks, accelerator.as_mut(), max_iterations);
        self.accelerator = Some(accelerator);
        let converged = outcome?;

        self.timer.stop();
        self.timer.record_split(SOLVE_SPLIT);
        if converged {
            self.state = SolveState::Converged;
        } else {
            self.state = SolveState::Exhausted;
            self.reporter.warning(&format!(
                "Unable to converge the source after {max_iterations} iterations \
                 (residual {:.3E}, threshold {:.3E})",
                self.residual, self.threshold
            ));
        }
        Ok(self.k_eff)
    }

    fn initialize(&mut self, geometry: &dyn Geometry, tracks: &dyn TrackSource) -> FusionResult<()> {
        let flat = self.flat.as_ref().ok_or_else(|| {
            FusionError::ConfigError("Tracks have not been flattened".to_string())
        })?;
        let num_fsrs = geometry.num_regions();
        let num_groups = geometry.num_energy_groups();

        let quadrature = PolarQuadrature::new(self.quadrature_type, self.num_polar)?;
        self.polar_weights = quadrature.polar_weights(flat.azim_weights());

        let accelerator = self
            .accelerator
            .get_or_insert_with(|| Box::new(NoAcceleration) as Box<dyn Accelerator>);
        let num_surfaces = if accelerator.is_active() {
            geometry.num_mesh_cells() * SURFACES_PER_CELL
        } else {
            0
        };
        self.buffers = MocBuffers::allocate(
            num_fsrs,
            num_groups,
            flat.len(),
            self.num_polar,
            num_surfaces,
        );

        self.kernel = Some(ExponentialKernel::build(
            &quadrature,
            self.interpolate_exponential,
            self.threshold,
        )?);
        self.quadrature = Some(quadrature);

        self.buffers.fsr_volumes = coverage::region_volumes(tracks, flat, num_fsrs)?;
        for r in 0..num_fsrs {
            let id = geometry.region_material(r);
            if id >= geometry.num_materials() {
                return Err(FusionError::ConfigError(format!(
                    "Region {r} references material {id}, only {} defined",
                    geometry.num_materials()
                )));
            }
            let material = geometry.material(id);
            if material.num_groups() != num_groups {
                return Err(FusionError::ConfigError(format!(
                    "Material '{}' has {} groups, geometry has {num_groups}",
                    material.name(),
                    material.num_groups()
                )));
            }
            self.buffers.fsr_materials[r] = id;
            self.buffers.sigma_t.row_mut(r).assign(material.sigma_t());
        }

        if accelerator.num_groups() == 0 {
            accelerator.create_group_structure(num_groups);
        }
        accelerator.initialize(&FineMeshLayout {
            num_groups,
            num_mesh_cells: geometry.num_mesh_cells(),
            volumes: self.buffers.fsr_volumes.view(),
            materials: self.buffers.fsr_materials.view(),
        })?;
        if num_surfaces > 0 {
            coverage::verify_mesh_surfaces(tracks, flat, num_surfaces)?;
        }

        coverage::verify_coverage(tracks, flat, num_fsrs)?;

        if geometry.has_vacuum_boundary() != flat.has_vacuum_exit() {
            let message = if flat.has_vacuum_exit() {
                "Tracks leave through vacuum exits but the geometry has no vacuum boundary"
            } else {
                "Geometry has a vacuum boundary but no track leaves the domain"
            };
            log::warn!("{message}");
            self.reporter.warning(message);
        }

        self.buffers.flatten_fluxes(FLAT_INITIAL_VALUE);
        self.buffers.flatten_sources(FLAT_INITIAL_VALUE);
        self.buffers.zero_track_fluxes();

        log::debug!(
            "MOC initialized: {num_fsrs} regions, {num_groups} groups, {} tracks, \
             {} angular unknowns per track end, {} exponential",
            flat.len(),
            self.buffers.polar_times_groups(),
            if self.interpolate_exponential {
                "interpolated"
            } else {
                "intrinsic"
            }
        );
        Ok(())
    }

    /// Returns whether the residual test passed.
    fn iterate(
        &mut self,
        geometry: &dyn Geometry,
        tracks: &dyn TrackSource,
        accelerator: &mut dyn Accelerator,
        max_iterations: usize,
    ) -> FusionResult<bool> {
        let flat = self.flat.as_ref().ok_or_else(|| {
            FusionError::ConfigError("Tracks have not been flattened".to_string())
        })?;
        let kernel = self.kernel.as_ref().ok_or_else(|| {
            FusionError::ConfigError("Exponential kernel has not been built".to_string())
        })?;
        let accelerated = accelerator.is_active();
        let buffers = &mut self.buffers;

        for i in 0..max_iterations {
            self.reporter.normal(&format!(
                "Iteration {i}: \tk_eff = {:.6}\tres = {:.3E}",
                self.k_eff, self.residual
            ));

            eigen::normalize_fluxes(buffers, geometry, self.num_iterations)?;
            self.residual = eigen::compute_fsr_sources(buffers, geometry, self.k_eff);
            self.residual_history.push(self.residual);

            let ctx = SweepContext {
                tracks,
                flat,
                kernel,
                num_polar: self.num_polar,
                polar_weights: &self.polar_weights,
                sigma_t: buffers.sigma_t.view(),
                reduced_source: buffers.reduced_source.view(),
                incoming: buffers.boundary_flux.view(),
                num_surfaces: buffers.surface_currents.nrows(),
            };
            let tally = ctx.transport_sweep(&mut buffers.outgoing_flux);
            buffers.boundary_leakage = ctx.leakage(&buffers.outgoing_flux);
            transfer_boundary_flux(flat, &buffers.outgoing_flux, &mut buffers.boundary_flux);
            buffers.surface_currents = tally.surface_currents;

            eigen::add_source_to_scalar_flux(buffers, &tally.scalar_flux);

            let mut accelerated_keff = None;
            if accelerated {
                let mut state = FineMeshState {
                    scalar_flux: buffers.scalar_flux.view_mut(),
                    surface_currents: buffers.surface_currents.view(),
                    k_eff: self.k_eff,
                };
                accelerated_keff = Some(accelerator.compute_keff(&mut state)?);
            }

            self.balance_keff =
                eigen::balance_keff(buffers, geometry, buffers.boundary_leakage);
            self.k_eff = accelerated_keff.unwrap_or(self.balance_keff);
            self.num_iterations += 1;

            if !self.k_eff.is_finite() {
                return Err(FusionError::SolverDiverged {
                    iteration: self.num_iterations,
                    message: format!("k_eff became {}", self.k_eff),
                });
            }
            if self.num_iterations > 1 && self.residual < self.threshold {
                self.reporter.result(&format!(
                    "Converged after {} iterations: k_eff = {:.6}",
                    self.num_iterations, self.k_eff
                ));
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Timing summary of the last solve, sent to the reporter.
    pub fn print_timer_report(&mut self) {
        let (num_tracks, num_segments) = self
            .tracks
            .as_ref()
            .map_or((0, 0), |t| (t.total_num_tracks(), t.num_segments()));
        let report = PerformanceReport::new(
            self.total_time(),
            self.num_iterations,
            num_tracks,
            num_segments,
            self.buffers.num_fsrs(),
            self.buffers.num_groups(),
            self.quadrature
                .as_ref()
                .map_or(self.num_polar, PolarQuadrature::num_polar),
        );
        report.emit(self.reporter.as_mut());
    }
}
