// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Source & Eigenvalue Updates
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Region-wise phases of one source iteration.
//!
//! Every phase is a rayon loop over flat source regions. Global totals are
//! collected per region and combined with pairwise summation.

use crate::buffers::MocBuffers;
use crate::geometry::Geometry;
use fusion_math::summation::{pairwise_sum, pairwise_sum_view};
use fusion_types::constants::{FOUR_PI, ONE_OVER_FOUR_PI, SOURCE_RESIDUAL_FLOOR};
use fusion_types::error::{FusionError, FusionResult};
use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis, Zip};

/// Total fission production `Σ νΣf φ V`.
pub(crate) fn total_fission_source(buffers: &MocBuffers, geometry: &dyn Geometry) -> f64 {
    let per_region: Vec<f64> = (0..buffers.num_fsrs())
        .into_par_iter()
        .map(|r| {
            let material = geometry.material(buffers.fsr_materials[r]);
            if !material.is_fissile() {
                return 0.0;
            }
            material.nu_sigma_f().dot(&buffers.scalar_flux.row(r)) * buffers.fsr_volumes[r]
        })
        .collect();
    pairwise_sum(&per_region)
}

/// Scale scalar and boundary flux so the total fission source is one.
pub(crate) fn normalize_fluxes(
    buffers: &mut MocBuffers,
    geometry: &dyn Geometry,
    iteration: usize,
) -> FusionResult<()> {
    let total = total_fission_source(buffers, geometry);
    if !total.is_finite() || total <= 0.0 {
        return Err(FusionError::SolverDiverged {
            iteration,
            message: format!("total fission source is {total}; no fissile region carries flux"),
        });
    }
    let factor = 1.0 / total;
    buffers.scalar_flux.par_mapv_inplace(|v| v * factor);
    buffers.boundary_flux.par_mapv_inplace(|v| v * factor);
    Ok(())
}

/// Rebuild isotropic sources from the current flux and `k_eff`.
///
/// Returns the RMS relative change of the source since the last call,
/// counting only entries with `|Q| > 1e-10`.
pub(crate) fn compute_fsr_sources(
    buffers: &mut MocBuffers,
    geometry: &dyn Geometry,
    k_eff: f64,
) -> f64 {
    let num_groups = buffers.num_groups();
    let inverse_k = 1.0 / k_eff;

    Zip::from(buffers.source.rows_mut())
        .and(buffers.reduced_source.rows_mut())
        .and(buffers.fission_sources.rows_mut())
        .and(buffers.scatter_sources.rows_mut())
        .and(buffers.scalar_flux.rows())
        .and(&buffers.fsr_materials)
        .par_for_each(|mut source, mut reduced, mut fission, mut scatter, flux, &id| {
            let material = geometry.material(id);
            let nu_sigma_f = material.nu_sigma_f();
            for g in 0..num_groups {
                fission[g] = nu_sigma_f[g] * flux[g];
            }
            let production = fission.sum() * inverse_k;
            for g in 0..num_groups {
                scatter[g] = material.sigma_s().row(g).dot(&flux);
                source[g] = (material.chi()[g] * production + scatter[g]) * ONE_OVER_FOUR_PI;
                reduced[g] = source[g] / material.sigma_t()[g];
            }
        });

    Zip::from(&mut buffers.source_residuals)
        .and(buffers.source.rows())
        .and(buffers.old_source.rows_mut())
        .par_for_each(|residual, source, mut old| {
            *residual = source
                .iter()
                .zip(old.iter())
                .filter(|(q, _)| q.abs() > SOURCE_RESIDUAL_FLOOR)
                .map(|(q, q_old)| ((q - q_old) / q).powi(2))
                .sum();
            old.assign(&source);
        });

    let num_fsrs = buffers.num_fsrs().max(1) as f64;
    (pairwise_sum_view(buffers.source_residuals.view()) / num_fsrs).sqrt()
}

/// `φ = 4π Q̄ + ½ φ_tally / (Σt V)`.
pub(crate) fn add_source_to_scalar_flux(buffers: &mut MocBuffers, tally: &Array2<f64>) {
    let volumes = buffers.fsr_volumes.view().insert_axis(Axis(1));
    Zip::from(&mut buffers.scalar_flux)
        .and(tally)
        .and(&buffers.reduced_source)
        .and(&buffers.sigma_t)
        .and_broadcast(&volumes)
        .par_for_each(|phi, &swept, &q, &sigma_t, &volume| {
            *phi = FOUR_PI * q + 0.5 * swept / (sigma_t * volume);
        });
}

/// Neutron balance `Σ νΣf φ V / (Σ Σa φ V + ½ leakage)`.
pub(crate) fn balance_keff(buffers: &MocBuffers, geometry: &dyn Geometry, leakage: f64) -> f64 {
    let (fission, absorption): (Vec<f64>, Vec<f64>) = (0..buffers.num_fsrs())
        .into_par_iter()
        .map(|r| {
            let material = geometry.material(buffers.fsr_materials[r]);
            let flux = buffers.scalar_flux.row(r);
            let volume = buffers.fsr_volumes[r];
            (
                material.nu_sigma_f().dot(&flux) * volume,
                material.sigma_a().dot(&flux) * volume,
            )
        })
        .unzip();
    pairwise_sum(&fission) / (pairwise_sum(&absorption) + 0.5 * leakage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RegionGeometry;
    use crate::material::Material;

    fn setup(flux: f64) -> (MocBuffers, RegionGeometry) {
        let fuel = Material::one_group("fuel", 1.0, 0.3, 0.36, 0.7).unwrap();
        let geometry = RegionGeometry::new(vec![fuel], vec![0, 0]).unwrap();
        let mut buffers = MocBuffers::allocate(2, 1, 1, 1, 0);
        buffers.fsr_volumes.fill(0.5);
        buffers.sigma_t.fill(1.0);
        buffers.flatten_fluxes(flux);
        buffers.flatten_sources(1.0);
        (buffers, geometry)
    }

    #[test]
    fn test_normalization_gives_unit_fission_source() {
        let (mut buffers, geometry) = setup(7.0);
        buffers.boundary_flux.fill(2.0);
        normalize_fluxes(&mut buffers, &geometry, 0).unwrap();
        let total = total_fission_source(&buffers, &geometry);
        assert!((total - 1.0).abs() < 1e-14);
        let scale = 1.0 / (0.36 * 7.0);
        assert!(buffers.boundary_flux.iter().all(|&v| (v - 2.0 * scale).abs() < 1e-14));
    }

    #[test]
    fn test_normalization_fails_without_fission() {
        let water = Material::one_group("water", 1.0, 0.1, 0.0, 0.9).unwrap();
        let geometry = RegionGeometry::new(vec![water], vec![0]).unwrap();
        let mut buffers = MocBuffers::allocate(1, 1, 0, 1, 0);
        buffers.fsr_volumes.fill(1.0);
        buffers.flatten_fluxes(1.0);
        let err = normalize_fluxes(&mut buffers, &geometry, 4).unwrap_err();
        assert!(matches!(err, FusionError::SolverDiverged { iteration: 4, .. }));
    }

    #[test]
    fn test_fission_total_counts_fissile_regions_only() {
        let fuel = Material::one_group("fuel", 1.0, 0.3, 0.36, 0.7).unwrap();
        let water = Material::one_group("water", 2.0, 0.02, 0.0, 1.98).unwrap();
        let geometry = RegionGeometry::new(vec![fuel, water], vec![0, 1, 0]).unwrap();
        let mut buffers = MocBuffers::allocate(3, 1, 1, 1, 0);
        buffers.fsr_materials = ndarray::Array1::from(vec![0, 1, 0]);
        buffers.fsr_volumes.fill(2.0);
        buffers.flatten_fluxes(5.0);
        let total = total_fission_source(&buffers, &geometry);
        assert!((total - 2.0 * 0.36 * 5.0 * 2.0).abs() < 1e-12, "{total}");
    }

    #[test]
    fn test_sources_and_residual() {
        let (mut buffers, geometry) = setup(1.0);
        let residual = compute_fsr_sources(&mut buffers, &geometry, 1.0);
        let q = (0.36 + 0.7) * ONE_OVER_FOUR_PI;
        assert!(buffers.source.iter().all(|&v| (v - q).abs() < 1e-15));
        assert!(buffers.reduced_source.iter().all(|&v| (v - q).abs() < 1e-15));
        let expected = ((q - 1.0) / q).abs();
        assert!((residual - expected).abs() < 1e-12, "{residual} vs {expected}");
        // Unchanged flux gives zero residual on the second pass.
        assert!(compute_fsr_sources(&mut buffers, &geometry, 1.0) < 1e-15);
    }

    #[test]
    fn test_tiny_sources_do_not_enter_residual() {
        let (mut buffers, geometry) = setup(1e-14);
        let residual = compute_fsr_sources(&mut buffers, &geometry, 1.0);
        assert_eq!(residual, 0.0);
    }

    #[test]
    fn test_flat_flux_balance_is_k_infinity() {
        let (buffers, geometry) = setup(3.0);
        assert!((balance_keff(&buffers, &geometry, 0.0) - 1.2).abs() < 1e-14);
        assert!(balance_keff(&buffers, &geometry, 0.5) < 1.2);
    }

    #[test]
    fn test_add_source_without_tally() {
        let (mut buffers, _) = setup(0.0);
        buffers.reduced_source.fill(0.25);
        let tally = Array2::from_elem((2, 1), 0.1);
        add_source_to_scalar_flux(&mut buffers, &tally);
        let expected = FOUR_PI * 0.25 + 0.5 * 0.1 / 0.5;
        assert!(buffers.scalar_flux.iter().all(|&v| (v - expected).abs() < 1e-14));
    }
}
