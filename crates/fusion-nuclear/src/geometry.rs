// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flat source region geometry as seen by the transport solver.
//!
//! The solver only needs region count, group count, the material of each
//! region and the boundary condition on each side. Constructive geometry
//! and ray tracing live upstream.

use crate::material::Material;
use fusion_types::error::{FusionError, FusionResult};

/// Boundary condition on one side of the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryKind {
    /// Outgoing angular flux re-enters along the mirrored track.
    #[default]
    Reflective,
    /// Outgoing angular flux is lost and tallied as leakage.
    Vacuum,
    /// Flux pinned to zero. Not supported by this solver.
    ZeroFlux,
}

/// Sides of the rectangular domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Top => 3,
        }
    }
}

/// Read-only geometry queries used by the solver.
pub trait Geometry: Send + Sync {
    fn num_regions(&self) -> usize;
    fn num_energy_groups(&self) -> usize;
    fn num_materials(&self) -> usize;
    fn boundary(&self, side: Side) -> BoundaryKind;
    /// Coarse mesh cells for an attached accelerator; 0 when there is no mesh.
    fn num_mesh_cells(&self) -> usize;
    /// Material index of a flat source region.
    fn region_material(&self, region: usize) -> usize;
    fn material(&self, id: usize) -> &Material;

    /// True if any side has a vacuum boundary.
    fn has_vacuum_boundary(&self) -> bool {
        Side::ALL
            .iter()
            .any(|&s| self.boundary(s) == BoundaryKind::Vacuum)
    }
}

/// Table-backed geometry: a list of materials and one material index per
/// flat source region.
#[derive(Debug, Clone)]
pub struct RegionGeometry {
    materials: Vec<Material>,
    region_materials: Vec<usize>,
    boundaries: [BoundaryKind; 4],
    num_groups: usize,
    num_mesh_cells: usize,
}

impl RegionGeometry {
    /// Build from materials and the per-region material map.
    ///
    /// All materials must share one group count and every region must
    /// reference an existing material. An empty region list is accepted
    /// here; the solver rejects it when the geometry is attached.
    pub fn new(materials: Vec<Material>, region_materials: Vec<usize>) -> FusionResult<Self> {
        let num_groups = materials.first().map_or(0, Material::num_groups);
        if let Some(m) = materials.iter().find(|m| m.num_groups() != num_groups) {
            return Err(FusionError::ConfigError(format!(
                "Material '{}' has {} groups, expected {num_groups}",
                m.name(),
                m.num_groups()
            )));
        }
        if let Some((region, &id)) = region_materials
            .iter()
            .enumerate()
            .find(|&(_, &id)| id >= materials.len())
        {
            return Err(FusionError::ConfigError(format!(
                "Region {region} references material {id}, only {} defined",
                materials.len()
            )));
        }
        Ok(RegionGeometry {
            materials,
            region_materials,
            boundaries: [BoundaryKind::Reflective; 4],
            num_groups,
            num_mesh_cells: 0,
        })
    }

    pub fn with_boundary(mut self, side: Side, kind: BoundaryKind) -> Self {
        self.boundaries[side.index()] = kind;
        self
    }

    pub fn with_mesh_cells(mut self, cells: usize) -> Self {
        self.num_mesh_cells = cells;
        self
    }
}

impl Geometry for RegionGeometry {
    fn num_regions(&self) -> usize {
        self.region_materials.len()
    }

    fn num_energy_groups(&self) -> usize {
        self.num_groups
    }

    fn num_materials(&self) -> usize {
        self.materials.len()
    }

    fn boundary(&self, side: Side) -> BoundaryKind {
        self.boundaries[side.index()]
    }

    fn num_mesh_cells(&self) -> usize {
        self.num_mesh_cells
    }

    fn region_material(&self, region: usize) -> usize {
        self.region_materials[region]
    }

    fn material(&self, id: usize) -> &Material {
        &self.materials[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuel() -> Material {
        Material::one_group("fuel", 1.0, 0.3, 0.36, 0.7).unwrap()
    }

    #[test]
    fn test_defaults_are_reflective() {
        let g = RegionGeometry::new(vec![fuel()], vec![0, 0, 0]).unwrap();
        assert_eq!(g.num_regions(), 3);
        assert_eq!(g.num_energy_groups(), 1);
        assert_eq!(g.num_mesh_cells(), 0);
        for side in Side::ALL {
            assert_eq!(g.boundary(side), BoundaryKind::Reflective);
        }
        assert!(!g.has_vacuum_boundary());
    }

    #[test]
    fn test_single_side_boundary() {
        let g = RegionGeometry::new(vec![fuel()], vec![0])
            .unwrap()
            .with_boundary(Side::Right, BoundaryKind::Vacuum);
        assert_eq!(g.boundary(Side::Left), BoundaryKind::Reflective);
        assert_eq!(g.boundary(Side::Right), BoundaryKind::Vacuum);
        assert!(g.has_vacuum_boundary());
    }

    #[test]
    fn test_rejects_dangling_material() {
        let err = RegionGeometry::new(vec![fuel()], vec![0, 1]).unwrap_err();
        assert!(err.to_string().contains("Region 1"));
    }

    #[test]
    fn test_rejects_mixed_group_counts() {
        let two = Material::new(
            "two",
            ndarray::array![1.0, 1.0],
            ndarray::array![0.5, 0.5],
            ndarray::array![0.0, 0.0],
            ndarray::array![1.0, 0.0],
            ndarray::Array2::zeros((2, 2)),
        )
        .unwrap();
        assert!(RegionGeometry::new(vec![fuel(), two], vec![0]).is_err());
    }

    #[test]
    fn test_empty_geometry_allowed_at_construction() {
        let g = RegionGeometry::new(vec![], vec![]).unwrap();
        assert_eq!(g.num_regions(), 0);
        assert_eq!(g.num_energy_groups(), 0);
    }
}
