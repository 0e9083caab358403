// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Characteristic Tracks
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Characteristic tracks, their segments and boundary links.
//!
//! Tracks are produced upstream by a track generator and grouped by
//! azimuthal half-angle. Every track is swept twice per iteration, once in
//! each direction, and each direction has its own incoming boundary slot.

use fusion_types::error::{FusionError, FusionResult};

/// Portion of a track inside one flat source region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub region: usize,
    /// Path length in the 2D plane [cm].
    pub length: f64,
    /// Coarse mesh surface crossed at the segment end when sweeping forward.
    pub mesh_surface_fwd: Option<usize>,
    /// Coarse mesh surface crossed at the segment start when sweeping in reverse.
    pub mesh_surface_bwd: Option<usize>,
}

impl Segment {
    pub fn new(region: usize, length: f64) -> Self {
        Segment {
            region,
            length,
            mesh_surface_fwd: None,
            mesh_surface_bwd: None,
        }
    }
}

/// Sweep direction along a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Boundary flux slot of this direction (0 forward, 1 reverse).
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

/// Track address: azimuthal index and index within that angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId {
    pub azim: usize,
    pub index: usize,
}

impl TrackId {
    pub fn new(azim: usize, index: usize) -> Self {
        TrackId { azim, index }
    }
}

/// Where the angular flux goes when it leaves a track end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackLink {
    /// Lost through a vacuum boundary and tallied as leakage.
    #[default]
    Vacuum,
    /// Re-enters the domain as the incoming flux of `target` swept in `entry`.
    Reflective { target: TrackId, entry: Direction },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub azim_index: usize,
    pub segments: Vec<Segment>,
    /// Exit at the end of a forward sweep.
    pub forward_exit: TrackLink,
    /// Exit at the start of the track, reached by a reverse sweep.
    pub reverse_exit: TrackLink,
}

impl Track {
    pub fn exit(&self, direction: Direction) -> TrackLink {
        match direction {
            Direction::Forward => self.forward_exit,
            Direction::Reverse => self.reverse_exit,
        }
    }
}

/// Read-only track model consumed by the solver.
pub trait TrackSource: Send + Sync {
    /// Number of azimuthal half-angles.
    fn num_azim(&self) -> usize;
    fn num_tracks(&self, azim: usize) -> usize;
    /// Azimuthal quadrature weight, including track spacing.
    fn azim_weight(&self, azim: usize) -> f64;
    fn track(&self, azim: usize, index: usize) -> &Track;

    fn total_num_tracks(&self) -> usize {
        (0..self.num_azim()).map(|a| self.num_tracks(a)).sum()
    }

    fn num_segments(&self) -> usize {
        (0..self.num_azim())
            .flat_map(|a| (0..self.num_tracks(a)).map(move |i| (a, i)))
            .map(|(a, i)| self.track(a, i).segments.len())
            .sum()
    }

    /// True once the generator has produced at least one segment.
    fn contains_tracks(&self) -> bool {
        self.total_num_tracks() > 0 && self.num_segments() > 0
    }
}

/// In-memory track model.
#[derive(Debug, Clone)]
pub struct TrackSet {
    tracks: Vec<Vec<Track>>,
    azim_weights: Vec<f64>,
    num_segments: usize,
}

impl TrackSet {
    /// Validate and build from per-angle track lists and weights.
    pub fn new(tracks: Vec<Vec<Track>>, azim_weights: Vec<f64>) -> FusionResult<Self> {
        if tracks.len() != azim_weights.len() {
            return Err(FusionError::ConfigError(format!(
                "{} azimuthal track lists but {} weights",
                tracks.len(),
                azim_weights.len()
            )));
        }
        if let Some(a) = azim_weights
            .iter()
            .position(|w| !w.is_finite() || *w <= 0.0)
        {
            return Err(FusionError::ConfigError(format!(
                "Azimuthal weight {a} must be finite and > 0"
            )));
        }
        for (a, list) in tracks.iter().enumerate() {
            for (i, track) in list.iter().enumerate() {
                if track.azim_index != a {
                    return Err(FusionError::ConfigError(format!(
                        "Track ({a}, {i}) reports azimuthal index {}",
                        track.azim_index
                    )));
                }
                if let Some(s) = track
                    .segments
                    .iter()
                    .position(|s| !s.length.is_finite() || s.length <= 0.0)
                {
                    return Err(FusionError::ConfigError(format!(
                        "Segment {s} of track ({a}, {i}) has non-positive length"
                    )));
                }
            }
        }

        let num_segments = tracks.iter().flatten().map(|t| t.segments.len()).sum();
        let set = TrackSet {
            tracks,
            azim_weights,
            num_segments,
        };
        FlatTracks::build(&set)?;
        Ok(set)
    }
}

impl TrackSource for TrackSet {
    fn num_azim(&self) -> usize {
        self.tracks.len()
    }

    fn num_tracks(&self, azim: usize) -> usize {
        self.tracks[azim].len()
    }

    fn azim_weight(&self, azim: usize) -> f64 {
        self.azim_weights[azim]
    }

    fn track(&self, azim: usize, index: usize) -> &Track {
        &self.tracks[azim][index]
    }

    fn num_segments(&self) -> usize {
        self.num_segments
    }
}

/// Tracks in global order (outer azimuth, inner index) with resolved links.
///
/// Boundary slots are addressed as `2 * uid + direction.slot()`.
#[derive(Debug, Clone)]
pub(crate) struct FlatTracks {
    ids: Vec<TrackId>,
    azim_weights: Vec<f64>,
    /// Incoming slot fed by each outgoing slot; `None` for vacuum exits.
    exits: Vec<Option<usize>>,
    /// Outgoing slot feeding each incoming slot; `None` if nothing enters.
    feeds: Vec<Option<usize>>,
}

impl FlatTracks {
    pub(crate) fn build(source: &dyn TrackSource) -> FusionResult<Self> {
        let num_azim = source.num_azim();
        let mut offsets = Vec::with_capacity(num_azim + 1);
        offsets.push(0usize);
        for a in 0..num_azim {
            offsets.push(offsets[a] + source.num_tracks(a));
        }
        let ids: Vec<TrackId> = (0..num_azim)
            .flat_map(|a| (0..source.num_tracks(a)).map(move |i| TrackId::new(a, i)))
            .collect();
        let azim_weights = (0..num_azim).map(|a| source.azim_weight(a)).collect();

        let mut exits = vec![None; 2 * ids.len()];
        let mut feeds = vec![None; 2 * ids.len()];
        for (uid, id) in ids.iter().enumerate() {
            let track = source.track(id.azim, id.index);
            for direction in [Direction::Forward, Direction::Reverse] {
                let TrackLink::Reflective { target, entry } = track.exit(direction) else {
                    continue;
                };
                if target.azim >= num_azim || target.index >= source.num_tracks(target.azim) {
                    return Err(FusionError::ConfigError(format!(
                        "Track ({}, {}) links to missing track ({}, {})",
                        id.azim, id.index, target.azim, target.index
                    )));
                }
                let outgoing = 2 * uid + direction.slot();
                let incoming = 2 * (offsets[target.azim] + target.index) + entry.slot();
                if feeds[incoming].is_some() {
                    return Err(FusionError::ConfigError(format!(
                        "Track ({}, {}) entry {:?} is fed by more than one exit",
                        target.azim, target.index, entry
                    )));
                }
                exits[outgoing] = Some(incoming);
                feeds[incoming] = Some(outgoing);
            }
        }

        Ok(FlatTracks {
            ids,
            azim_weights,
            exits,
            feeds,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn id(&self, uid: usize) -> TrackId {
        self.ids[uid]
    }

    pub(crate) fn azim_weight(&self, azim: usize) -> f64 {
        self.azim_weights[azim]
    }

    pub(crate) fn azim_weights(&self) -> &[f64] {
        &self.azim_weights
    }

    /// True if the outgoing slot leaves the domain.
    pub(crate) fn is_vacuum_exit(&self, outgoing: usize) -> bool {
        self.exits[outgoing].is_none()
    }

    pub(crate) fn has_vacuum_exit(&self) -> bool {
        self.exits.iter().any(Option::is_none)
    }

    pub(crate) fn feeds(&self) -> &[Option<usize>] {
        &self.feeds
    }
}
