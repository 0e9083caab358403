// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Slab Track Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Layered 1D slab with one cyclic track per azimuthal angle.
//!
//! Layers run left to right along x; y is infinite (top and bottom are
//! reflective). Each layer is one coarse mesh cell and is split into equal
//! flat source regions. A track at angle φ crosses a sub-region of width
//! `w` in `w / cos φ`, so the weight `cos φ / n` makes track volumes exact.

use crate::accelerator::MeshSurface;
use crate::geometry::{BoundaryKind, RegionGeometry, Side};
use crate::material::Material;
use crate::track::{Direction, Segment, Track, TrackId, TrackLink, TrackSet};
use fusion_types::config::MocConfig;
use fusion_types::error::{FusionError, FusionResult};
use std::f64::consts::PI;

/// One material layer of the slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabLayer {
    /// Thickness [cm].
    pub width: f64,
    /// Index into the material list.
    pub material: usize,
    /// Flat source regions in this layer.
    pub subdivisions: usize,
}

impl SlabLayer {
    pub fn new(width: f64, material: usize, subdivisions: usize) -> Self {
        SlabLayer {
            width,
            material,
            subdivisions,
        }
    }
}

/// Geometry and tracks for a layered slab.
///
/// A zero-flux side is recorded on the geometry and tracked as vacuum.
pub fn build_slab(
    materials: Vec<Material>,
    layers: &[SlabLayer],
    left: BoundaryKind,
    right: BoundaryKind,
    num_azim: usize,
) -> FusionResult<(RegionGeometry, TrackSet)> {
    if layers.is_empty() {
        return Err(FusionError::ConfigError("Slab has no layers".to_string()));
    }
    if num_azim == 0 {
        return Err(FusionError::ConfigError(
            "Slab needs at least one azimuthal angle".to_string(),
        ));
    }
    if let Some((i, layer)) = layers
        .iter()
        .enumerate()
        .find(|(_, l)| !l.width.is_finite() || l.width <= 0.0 || l.subdivisions == 0)
    {
        return Err(FusionError::ConfigError(format!(
            "Layer {i} needs width > 0 and at least one region, got {layer:?}"
        )));
    }

    let region_materials: Vec<usize> = layers
        .iter()
        .flat_map(|l| std::iter::repeat(l.material).take(l.subdivisions))
        .collect();
    let geometry = RegionGeometry::new(materials, region_materials)?
        .with_boundary(Side::Left, left)
        .with_boundary(Side::Right, right)
        .with_mesh_cells(layers.len());

    let mut tracks = Vec::with_capacity(num_azim);
    let mut weights = Vec::with_capacity(num_azim);
    for a in 0..num_azim {
        let phi = (a as f64 + 0.5) * PI / (2.0 * num_azim as f64);
        let cos_phi = phi.cos();
        let this = TrackId::new(a, 0);

        let mut segments = Vec::with_capacity(total_regions(layers));
        let mut region = 0;
        for (cell, layer) in layers.iter().enumerate() {
            let length = layer.width / layer.subdivisions as f64 / cos_phi;
            for k in 0..layer.subdivisions {
                let mut segment = Segment::new(region, length);
                if k == 0 {
                    segment.mesh_surface_bwd = Some(MeshSurface::XMin.id(cell));
                }
                if k + 1 == layer.subdivisions {
                    segment.mesh_surface_fwd = Some(MeshSurface::XMax.id(cell));
                }
                segments.push(segment);
                region += 1;
            }
        }

        tracks.push(vec![Track {
            azim_index: a,
            segments,
            forward_exit: end_link(right, this, Direction::Reverse),
            reverse_exit: end_link(left, this, Direction::Forward),
        }]);
        weights.push(cos_phi / num_azim as f64);
    }

    Ok((geometry, TrackSet::new(tracks, weights)?))
}

/// Slab tracked with the azimuthal angle count of a run configuration.
pub fn build_slab_from_config(
    materials: Vec<Material>,
    layers: &[SlabLayer],
    left: BoundaryKind,
    right: BoundaryKind,
    config: &MocConfig,
) -> FusionResult<(RegionGeometry, TrackSet)> {
    config.validate()?;
    build_slab(materials, layers, left, right, config.num_azim)
}

fn total_regions(layers: &[SlabLayer]) -> usize {
    layers.iter().map(|l| l.subdivisions).sum()
}

/// A reflective end turns the track back onto itself.
fn end_link(kind: BoundaryKind, track: TrackId, entry: Direction) -> TrackLink {
    match kind {
        BoundaryKind::Reflective => TrackLink::Reflective {
            target: track,
            entry,
        },
        BoundaryKind::Vacuum | BoundaryKind::ZeroFlux => TrackLink::Vacuum,
    }
}
