// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Transport Sweep
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flat-source MOC transport sweep.
//!
//! Each track is swept forward then in reverse. Along a segment in region
//! `r` the angular flux relaxes towards the reduced source:
//!
//!   Δψ = (ψ − Q̄_r) · (1 − exp(−Σt l / sin θ_p)),   ψ ← ψ − Δψ
//!
//! and `Δψ · w_ap` is tallied into the region scalar flux. Tracks read the
//! incoming flux of the previous sweep and write only their own outgoing
//! slots; region tallies are accumulated per worker and reduced at the end.

use crate::exponential::AttenuationKernel;
use crate::track::{Direction, FlatTracks, Segment, TrackSource};
use fusion_math::summation::pairwise_sum;
use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut1, Axis};

/// Read-only inputs of one sweep.
pub(crate) struct SweepContext<'a, K: AttenuationKernel> {
    pub tracks: &'a dyn TrackSource,
    pub flat: &'a FlatTracks,
    pub kernel: &'a K,
    pub num_polar: usize,
    /// `4π ω_a sin θ_p w_p`, row-major `[azim][polar]`.
    pub polar_weights: &'a [f64],
    pub sigma_t: ArrayView2<'a, f64>,
    pub reduced_source: ArrayView2<'a, f64>,
    /// Incoming angular flux from the previous sweep.
    pub incoming: ArrayView3<'a, f64>,
    /// 0 disables surface current tallies.
    pub num_surfaces: usize,
}

/// Per-worker partial sums of one sweep.
#[derive(Debug, Clone)]
pub(crate) struct SweepTally {
    pub scalar_flux: Array2<f64>,
    pub surface_currents: Array2<f64>,
}

impl SweepTally {
    fn zeros(num_fsrs: usize, num_groups: usize, num_surfaces: usize) -> Self {
        SweepTally {
            scalar_flux: Array2::zeros((num_fsrs, num_groups)),
            surface_currents: Array2::zeros((num_surfaces, num_groups)),
        }
    }

    fn merge(mut self, other: SweepTally) -> Self {
        self.scalar_flux += &other.scalar_flux;
        self.surface_currents += &other.surface_currents;
        self
    }
}

impl<K: AttenuationKernel> SweepContext<'_, K> {
    fn num_groups(&self) -> usize {
        self.reduced_source.ncols()
    }

    fn weights(&self, azim: usize) -> &[f64] {
        &self.polar_weights[azim * self.num_polar..(azim + 1) * self.num_polar]
    }

    /// Sweep every track; outgoing fluxes land in `outgoing`.
    pub(crate) fn transport_sweep(&self, outgoing: &mut Array3<f64>) -> SweepTally {
        let num_fsrs = self.reduced_source.nrows();
        let num_groups = self.num_groups();
        let num_surfaces = self.num_surfaces;
        outgoing
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .fold(
                || SweepTally::zeros(num_fsrs, num_groups, num_surfaces),
                |mut tally, (uid, mut ends)| {
                    for direction in [Direction::Forward, Direction::Reverse] {
                        let slot = direction.slot();
                        self.sweep_direction(uid, direction, ends.row_mut(slot), &mut tally);
                    }
                    tally
                },
            )
            .reduce(
                || SweepTally::zeros(num_fsrs, num_groups, num_surfaces),
                SweepTally::merge,
            )
    }

    fn sweep_direction(
        &self,
        uid: usize,
        direction: Direction,
        mut psi: ArrayViewMut1<'_, f64>,
        tally: &mut SweepTally,
    ) {
        let id = self.flat.id(uid);
        let track = self.tracks.track(id.azim, id.index);
        let weights = self.weights(id.azim);
        psi.assign(&self.incoming.slice(s![uid, direction.slot(), ..]));

        match direction {
            Direction::Forward => {
                for segment in &track.segments {
                    self.attenuate(segment, &mut psi, weights, tally);
                    if let Some(surface) = segment.mesh_surface_fwd {
                        self.tally_current(surface, &psi, weights, tally);
                    }
                }
            }
            Direction::Reverse => {
                for segment in track.segments.iter().rev() {
                    self.attenuate(segment, &mut psi, weights, tally);
                    if let Some(surface) = segment.mesh_surface_bwd {
                        self.tally_current(surface, &psi, weights, tally);
                    }
                }
            }
        }
    }

    #[inline]
    fn attenuate(
        &self,
        segment: &Segment,
        psi: &mut ArrayViewMut1<'_, f64>,
        weights: &[f64],
        tally: &mut SweepTally,
    ) {
        let r = segment.region;
        let num_groups = self.num_groups();
        for g in 0..num_groups {
            let tau = self.sigma_t[[r, g]] * segment.length;
            let q = self.reduced_source[[r, g]];
            let mut phi = 0.0;
            for (p, &w) in weights.iter().enumerate() {
                let i = p * num_groups + g;
                let delta = (psi[i] - q) * self.kernel.attenuation(tau, p);
                phi += delta * w;
                psi[i] -= delta;
            }
            tally.scalar_flux[[r, g]] += phi;
        }
    }

    fn tally_current(
        &self,
        surface: usize,
        psi: &ArrayViewMut1<'_, f64>,
        weights: &[f64],
        tally: &mut SweepTally,
    ) {
        if self.num_surfaces == 0 {
            return;
        }
        let num_groups = self.num_groups();
        for g in 0..num_groups {
            let current: f64 = weights
                .iter()
                .enumerate()
                .map(|(p, &w)| psi[p * num_groups + g] * w)
                .sum();
            tally.surface_currents[[surface, g]] += 0.5 * current;
        }
    }

    /// Flux lost through vacuum exits during the last sweep.
    pub(crate) fn leakage(&self, outgoing: &Array3<f64>) -> f64 {
        let num_groups = self.num_groups();
        let per_track: Vec<f64> = (0..self.flat.len())
            .into_par_iter()
            .map(|uid| {
                let weights = self.weights(self.flat.id(uid).azim);
                [Direction::Forward, Direction::Reverse]
                    .iter()
                    .filter(|d| self.flat.is_vacuum_exit(2 * uid + d.slot()))
                    .map(|d| {
                        let psi = outgoing.slice(s![uid, d.slot(), ..]);
                        psi.iter()
                            .enumerate()
                            .map(|(i, v)| v * weights[i / num_groups])
                            .sum::<f64>()
                    })
                    .sum::<f64>()
            })
            .collect();
        pairwise_sum(&per_track)
    }
}

/// Outgoing flux becomes the incoming flux of the linked track end.
pub(crate) fn transfer_boundary_flux(
    flat: &FlatTracks,
    outgoing: &Array3<f64>,
    incoming: &mut Array3<f64>,
) {
    let feeds = flat.feeds();
    incoming
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(uid, mut ends)| {
            for slot in 0..2 {
                let mut row = ends.row_mut(slot);
                match feeds[2 * uid + slot] {
                    Some(source) => row.assign(&outgoing.slice(s![source / 2, source % 2, ..])),
                    None => row.fill(0.0),
                }
            }
        });
}
