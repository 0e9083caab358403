// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — MOC Solver Integration Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end eigenvalue runs on slab and hand-built track models.

use fusion_nuclear::accelerator::{Accelerator, FineMeshLayout, FineMeshState};
use fusion_nuclear::geometry::{BoundaryKind, RegionGeometry};
use fusion_nuclear::material::Material;
use fusion_nuclear::slab::{build_slab, build_slab_from_config, SlabLayer};
use fusion_nuclear::solver::MocSolver;
use fusion_nuclear::track::{Segment, Track, TrackLink, TrackSet, TrackSource};
use fusion_types::config::MocConfig;
use fusion_types::error::FusionError;
use fusion_types::state::SolveState;
use ndarray::{array, Array1};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn fuel() -> Material {
    Material::one_group("fuel", 1.0, 0.3, 0.36, 0.7).unwrap()
}

/// Fast/thermal pair with k∞ = 7/6 and no upscatter.
fn two_group_fuel() -> Material {
    Material::new(
        "uo2-2g",
        array![0.5, 1.3],
        array![0.01, 0.1],
        array![0.005, 0.15],
        array![1.0, 0.0],
        array![[0.47, 0.0], [0.02, 1.2]],
    )
    .unwrap()
}

fn slab_solver(
    materials: Vec<Material>,
    layers: &[SlabLayer],
    left: BoundaryKind,
    right: BoundaryKind,
    num_azim: usize,
) -> MocSolver {
    let (geometry, tracks) = build_slab(materials, layers, left, right, num_azim).unwrap();
    MocSolver::with_models(Arc::new(geometry), Arc::new(tracks)).unwrap()
}

fn bare_slab() -> MocSolver {
    let layers = [SlabLayer::new(2.0, 0, 4); 3];
    slab_solver(vec![fuel()], &layers, BoundaryKind::Vacuum, BoundaryKind::Vacuum, 8)
}

// ── Eigenvalues ──────────────────────────────────────────────────────

#[test]
fn infinite_medium_matches_k_infinity() {
    let layers = [SlabLayer::new(1.0, 0, 3); 2];
    let mut solver = slab_solver(
        vec![fuel()],
        &layers,
        BoundaryKind::Reflective,
        BoundaryKind::Reflective,
        4,
    );
    solver.set_source_convergence_threshold(1e-8).unwrap();
    let k = solver.converge_source(1000).unwrap();
    assert_eq!(solver.state(), SolveState::Converged);
    assert!((k - 1.2).abs() < 1e-5, "k = {k}");

    let flux = solver.scalar_flux();
    let mean = flux.mean().unwrap();
    assert!(flux.iter().all(|&v| ((v - mean) / mean).abs() < 1e-5));
}

#[test]
fn two_group_infinite_medium() {
    let layers = [SlabLayer::new(1.0, 0, 2); 2];
    let mut solver = slab_solver(
        vec![two_group_fuel()],
        &layers,
        BoundaryKind::Reflective,
        BoundaryKind::Reflective,
        4,
    );
    solver.set_source_convergence_threshold(1e-6).unwrap();
    let k = solver.converge_source(1000).unwrap();
    assert!((k - 7.0 / 6.0).abs() < 1e-3, "k = {k}");

    // Thermal to fast flux ratio σs(1→2) / Σa2 = 0.2.
    let flux = solver.scalar_flux();
    let ratio = flux[[0, 1]] / flux[[0, 0]];
    assert!((ratio - 0.2).abs() < 1e-3, "ratio = {ratio}");
}

#[test]
fn leakage_lowers_k() {
    let mut solver = bare_slab();
    solver.set_source_convergence_threshold(1e-6).unwrap();
    let k = solver.converge_source(1000).unwrap();
    assert_eq!(solver.state(), SolveState::Converged);
    assert!(k < 1.2 && k > 0.0, "k = {k}");
    assert!(solver.boundary_leakage() > 0.0);
    assert_eq!(solver.balance_keff(), k);
}

#[test]
fn bare_slab_flux_is_symmetric_and_peaked() {
    let mut solver = bare_slab();
    solver.set_source_convergence_threshold(1e-7).unwrap();
    solver.converge_source(1000).unwrap();
    let flux = solver.scalar_flux().column(0).to_owned();
    let n = flux.len();
    for r in 0..n / 2 {
        let rel = (flux[r] - flux[n - 1 - r]).abs() / flux[r];
        assert!(rel < 1e-6, "region {r}: {} vs {}", flux[r], flux[n - 1 - r]);
    }
    assert!(flux[n / 2] > flux[0]);
}

#[test]
fn residual_falls_across_iterations() {
    let mut solver = bare_slab();
    solver.set_source_convergence_threshold(1e-7).unwrap();
    solver.converge_source(1000).unwrap();
    let history = solver.residual_history();
    assert!(history.len() > 2);
    let first = history[1];
    let last = history[history.len() - 1];
    assert!(last < 1e-7);
    assert!(last < 1e-2 * first, "{first} -> {last}");
    let tail = history[history.len() / 2..].iter().cloned().fold(0.0, f64::max);
    assert!(tail < first, "tail {tail} vs {first}");
}

#[test]
fn reflective_half_slab_matches_full_slab() {
    let mut full = slab_solver(
        vec![fuel()],
        &[SlabLayer::new(6.0, 0, 24)],
        BoundaryKind::Vacuum,
        BoundaryKind::Vacuum,
        8,
    );
    full.set_source_convergence_threshold(1e-9).unwrap();
    let k_full = full.converge_source(5000).unwrap();
    assert_eq!(full.state(), SolveState::Converged);

    for (left, right) in [
        (BoundaryKind::Reflective, BoundaryKind::Vacuum),
        (BoundaryKind::Vacuum, BoundaryKind::Reflective),
    ] {
        let mut half = slab_solver(vec![fuel()], &[SlabLayer::new(3.0, 0, 12)], left, right, 8);
        half.set_source_convergence_threshold(1e-9).unwrap();
        let k_half = half.converge_source(5000).unwrap();
        assert_eq!(half.state(), SolveState::Converged);
        assert!((k_half - k_full).abs() < 1e-5, "{left:?}/{right:?}: {k_half} vs {k_full}");
    }
}

#[test]
fn converged_flux_carries_unit_fission_source() {
    let mut solver = bare_slab();
    solver.set_source_convergence_threshold(1e-8).unwrap();
    solver.converge_source(2000).unwrap();
    assert_eq!(solver.state(), SolveState::Converged);
    let flux = solver.scalar_flux();
    let volumes = solver.fsr_volumes();
    let total: f64 = (0..volumes.len())
        .map(|r| 0.36 * flux[[r, 0]] * volumes[r])
        .sum();
    assert!((total - 1.0).abs() < 1e-5, "fission source {total}");
}

#[test]
fn exponential_modes_agree() {
    let mut table = bare_slab();
    table.set_source_convergence_threshold(1e-6).unwrap();
    table.use_exponential_interpolation();
    let k_table = table.converge_source(1000).unwrap();

    let mut direct = bare_slab();
    direct.set_source_convergence_threshold(1e-6).unwrap();
    direct.use_exponential_intrinsic();
    let k_direct = direct.converge_source(1000).unwrap();

    assert!((k_table - k_direct).abs() < 1e-4, "{k_table} vs {k_direct}");
}

#[test]
fn polar_sets_give_close_answers() {
    let mut ks = Vec::new();
    for num_polar in 1..=3 {
        let mut solver = bare_slab();
        solver.set_num_polar_angles(num_polar).unwrap();
        solver.set_source_convergence_threshold(1e-6).unwrap();
        ks.push(solver.converge_source(1000).unwrap());
    }
    assert!(ks.iter().all(|k| (k - ks[2]).abs() < 0.05), "{ks:?}");
}

// ── Failure paths ────────────────────────────────────────────────────

#[test]
fn uncovered_region_fails_before_iterating() {
    let geometry = RegionGeometry::new(vec![fuel()], vec![0, 0, 0]).unwrap();
    let track = Track {
        azim_index: 0,
        segments: vec![Segment::new(0, 1.0), Segment::new(1, 1.0)],
        forward_exit: TrackLink::Vacuum,
        reverse_exit: TrackLink::Vacuum,
    };
    let tracks = TrackSet::new(vec![vec![track]], vec![1.0]).unwrap();
    let mut solver = MocSolver::with_models(Arc::new(geometry), Arc::new(tracks)).unwrap();

    match solver.verify_coverage() {
        Err(FusionError::UncoveredRegion { region }) => assert_eq!(region, 2),
        other => panic!("Unexpected result: {other:?}"),
    }
    match solver.converge_source(10) {
        Err(FusionError::UncoveredRegion { region }) => assert_eq!(region, 2),
        other => panic!("Unexpected result: {other:?}"),
    }
    assert_eq!(solver.num_iterations(), 0);
    assert_eq!(solver.state(), SolveState::Uninitialized);
}

#[test]
fn zero_flux_slab_is_rejected() {
    let layers = [SlabLayer::new(1.0, 0, 1)];
    let (geometry, tracks) = build_slab(
        vec![fuel()],
        &layers,
        BoundaryKind::ZeroFlux,
        BoundaryKind::Vacuum,
        2,
    )
    .unwrap();
    let err = MocSolver::with_models(Arc::new(geometry), Arc::new(tracks)).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn non_fissile_system_diverges() {
    let water = Material::one_group("water", 1.0, 0.1, 0.0, 0.9).unwrap();
    let layers = [SlabLayer::new(1.0, 0, 2)];
    let mut solver = slab_solver(
        vec![water],
        &layers,
        BoundaryKind::Vacuum,
        BoundaryKind::Vacuum,
        2,
    );
    let err = solver.converge_source(10).unwrap_err();
    assert!(matches!(err, FusionError::SolverDiverged { iteration: 0, .. }));
    assert_eq!(solver.state(), SolveState::Uninitialized);
}

#[test]
fn exhausted_budget_returns_last_estimate() {
    let mut solver = bare_slab();
    solver.set_source_convergence_threshold(1e-12).unwrap();
    let k = solver.converge_source(3).unwrap();
    assert!(k.is_finite());
    assert_eq!(solver.num_iterations(), 3);
    assert_eq!(solver.state(), SolveState::Exhausted);
    let result = solver.result();
    assert!(!result.converged);
    assert_eq!(result.residual_history.len(), 3);
    assert_eq!(result.k_eff, k);
}

// ── Acceleration seam ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Seen {
    group_structure: Option<usize>,
    layout_cells: usize,
    layout_volume: f64,
    calls: usize,
    max_current: f64,
}

/// Returns a fixed eigenvalue and records what the solver hands over.
struct FixedK {
    k: f64,
    groups: usize,
    seen: Arc<Mutex<Seen>>,
}

impl Accelerator for FixedK {
    fn is_active(&self) -> bool {
        true
    }

    fn num_groups(&self) -> usize {
        self.groups
    }

    fn create_group_structure(&mut self, num_fine_groups: usize) {
        self.groups = num_fine_groups;
        self.seen.lock().unwrap().group_structure = Some(num_fine_groups);
    }

    fn initialize(&mut self, layout: &FineMeshLayout<'_>) -> fusion_types::error::FusionResult<()> {
        let mut seen = self.seen.lock().unwrap();
        seen.layout_cells = layout.num_mesh_cells;
        seen.layout_volume = layout.volumes.sum();
        Ok(())
    }

    fn compute_keff(
        &mut self,
        state: &mut FineMeshState<'_>,
    ) -> fusion_types::error::FusionResult<f64> {
        let mut seen = self.seen.lock().unwrap();
        seen.calls += 1;
        let max = state
            .surface_currents
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()));
        seen.max_current = seen.max_current.max(max);
        Ok(self.k)
    }
}

#[test]
fn active_accelerator_sets_keff() {
    let mut solver = bare_slab();
    let seen = Arc::new(Mutex::new(Seen::default()));
    solver.set_accelerator(Box::new(FixedK {
        k: 1.05,
        groups: 0,
        seen: Arc::clone(&seen),
    }));
    assert!(solver.is_using_cmfd());

    let k = solver.converge_source(200).unwrap();
    assert_eq!(k, 1.05);
    assert!((solver.balance_keff() - 1.05).abs() > 1e-6);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.group_structure, Some(1));
    assert_eq!(seen.layout_cells, 3);
    assert!((seen.layout_volume - 6.0).abs() < 1e-12);
    assert_eq!(seen.calls, solver.num_iterations());
    assert!(seen.max_current > 0.0);
}

// ── Configuration ────────────────────────────────────────────────────

#[test]
fn sample_config_drives_solver() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/pin_cell.json");
    let config = MocConfig::from_file(path.to_str().unwrap()).unwrap();
    let layers = [SlabLayer::new(2.0, 0, 4); 3];
    let (geometry, tracks) = build_slab_from_config(
        vec![fuel()],
        &layers,
        BoundaryKind::Vacuum,
        BoundaryKind::Vacuum,
        &config,
    )
    .unwrap();
    assert_eq!(tracks.num_azim(), config.num_azim);
    let mut solver = MocSolver::with_models(Arc::new(geometry), Arc::new(tracks)).unwrap();
    solver.apply_config(&config).unwrap();
    assert_eq!(solver.source_convergence_threshold(), config.tolerance);
    let k = solver.converge_source(config.max_iterations).unwrap();
    assert!(k > 0.0 && k < 1.2);
}

#[test]
fn volumes_are_exposed() {
    let mut solver = bare_slab();
    solver.converge_source(1).unwrap();
    let volumes: Array1<f64> = solver.fsr_volumes().to_owned();
    assert_eq!(volumes.len(), 12);
    assert!(volumes.iter().all(|&v| (v - 0.5).abs() < 1e-12));
}
