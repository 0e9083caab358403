// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Track Coverage Check
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Every flat source region must be crossed by at least one segment.

use crate::track::{FlatTracks, TrackSource};
use fusion_types::error::{FusionError, FusionResult};
use ndarray::Array1;
use rayon::prelude::*;

/// Segment count per region, tallied in per-worker partial vectors.
pub(crate) fn segment_tallies(
    tracks: &dyn TrackSource,
    flat: &FlatTracks,
    num_fsrs: usize,
) -> FusionResult<Vec<usize>> {
    (0..flat.len())
        .into_par_iter()
        .try_fold(
            || vec![0usize; num_fsrs],
            |mut tally, uid| {
                let id = flat.id(uid);
                for segment in &tracks.track(id.azim, id.index).segments {
                    let slot = tally.get_mut(segment.region).ok_or_else(|| {
                        FusionError::ConfigError(format!(
                            "Track ({}, {}) crosses region {} but only {num_fsrs} exist",
                            id.azim, id.index, segment.region
                        ))
                    })?;
                    *slot += 1;
                }
                Ok::<_, FusionError>(tally)
            },
        )
        .try_reduce(
            || vec![0usize; num_fsrs],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                Ok(a)
            },
        )
}

/// Track-estimated region volumes `Σ l · ω_a` [area].
pub(crate) fn region_volumes(
    tracks: &dyn TrackSource,
    flat: &FlatTracks,
    num_fsrs: usize,
) -> FusionResult<Array1<f64>> {
    let volumes = (0..flat.len())
        .into_par_iter()
        .try_fold(
            || vec![0.0f64; num_fsrs],
            |mut volumes, uid| {
                let id = flat.id(uid);
                let weight = flat.azim_weight(id.azim);
                for segment in &tracks.track(id.azim, id.index).segments {
                    let slot = volumes.get_mut(segment.region).ok_or_else(|| {
                        FusionError::ConfigError(format!(
                            "Track ({}, {}) crosses region {} but only {num_fsrs} exist",
                            id.azim, id.index, segment.region
                        ))
                    })?;
                    *slot += segment.length * weight;
                }
                Ok::<_, FusionError>(volumes)
            },
        )
        .try_reduce(
            || vec![0.0f64; num_fsrs],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                Ok(a)
            },
        )?;
    Ok(Array1::from(volumes))
}

/// Fails with the lowest region that no segment crosses.
pub(crate) fn verify_coverage(
    tracks: &dyn TrackSource,
    flat: &FlatTracks,
    num_fsrs: usize,
) -> FusionResult<()> {
    let tally = segment_tallies(tracks, flat, num_fsrs)?;
    match tally.iter().position(|&n| n == 0) {
        Some(region) => Err(FusionError::UncoveredRegion { region }),
        None => Ok(()),
    }
}

/// Mesh surface ids on segments must address the current tally.
pub(crate) fn verify_mesh_surfaces(
    tracks: &dyn TrackSource,
    flat: &FlatTracks,
    num_surfaces: usize,
) -> FusionResult<()> {
    (0..flat.len()).into_par_iter().try_for_each(|uid| {
        let id = flat.id(uid);
        let segments = &tracks.track(id.azim, id.index).segments;
        let bad = segments
            .iter()
            .flat_map(|s| [s.mesh_surface_fwd, s.mesh_surface_bwd])
            .flatten()
            .find(|&surface| surface >= num_surfaces);
        match bad {
            Some(surface) => Err(FusionError::ConfigError(format!(
                "Track ({}, {}) tallies mesh surface {surface} but only {num_surfaces} exist",
                id.azim, id.index
            ))),
            None => Ok(()),
        }
    })
}
