// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Polar Quadrature
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Polar angle quadrature for 2D MOC.
//!
//! Tabuchi–Yamamoto and Leonard optimal sets integrate the Bickley
//! function kernel with 1–3 angles per half-space. Weights sum to one.

use fusion_types::config::PolarQuadratureType;
use fusion_types::constants::{FOUR_PI, MAX_NUM_POLAR};
use fusion_types::error::{FusionError, FusionResult};

/// Tabuchi–Yamamoto sin θ and weights for 1, 2 and 3 angles.
const TABUCHI_SIN: [&[f64]; 3] = [
    &[0.798184],
    &[0.363900, 0.899900],
    &[0.166648, 0.537707, 0.932954],
];
const TABUCHI_WEIGHT: [&[f64]; 3] = [
    &[1.0],
    &[0.212854, 0.787146],
    &[0.046233, 0.283619, 0.670148],
];

/// Leonard sin θ and weights for 2 and 3 angles.
const LEONARD_SIN: [&[f64]; 2] = [&[0.273658, 0.865714], &[0.099812, 0.395534, 0.891439]];
const LEONARD_WEIGHT: [&[f64]; 2] = [&[0.139473, 0.860527], &[0.017620, 0.188561, 0.793819]];

#[derive(Debug, Clone, PartialEq)]
pub struct PolarQuadrature {
    kind: PolarQuadratureType,
    sin_theta: Vec<f64>,
    inverse_sin_theta: Vec<f64>,
    weight: Vec<f64>,
    /// sin θ_p · w_p
    multiple: Vec<f64>,
}

impl PolarQuadrature {
    pub fn new(kind: PolarQuadratureType, num_polar: usize) -> FusionResult<Self> {
        if num_polar == 0 || num_polar > MAX_NUM_POLAR {
            return Err(FusionError::ConfigError(format!(
                "Unable to use {num_polar} polar angles; only 1, 2 or 3 are supported"
            )));
        }
        let (sin_theta, weight) = match kind {
            PolarQuadratureType::Tabuchi => (
                TABUCHI_SIN[num_polar - 1].to_vec(),
                TABUCHI_WEIGHT[num_polar - 1].to_vec(),
            ),
            PolarQuadratureType::Leonard => {
                if num_polar == 1 {
                    return Err(FusionError::ConfigError(
                        "Leonard polar quadrature requires 2 or 3 angles".to_string(),
                    ));
                }
                (
                    LEONARD_SIN[num_polar - 2].to_vec(),
                    LEONARD_WEIGHT[num_polar - 2].to_vec(),
                )
            }
        };
        let inverse_sin_theta = sin_theta.iter().map(|s| 1.0 / s).collect();
        let multiple = sin_theta.iter().zip(&weight).map(|(s, w)| s * w).collect();
        Ok(PolarQuadrature {
            kind,
            sin_theta,
            inverse_sin_theta,
            weight,
            multiple,
        })
    }

    pub fn kind(&self) -> PolarQuadratureType {
        self.kind
    }

    pub fn num_polar(&self) -> usize {
        self.sin_theta.len()
    }

    pub fn sin_theta(&self) -> &[f64] {
        &self.sin_theta
    }

    pub fn inverse_sin_theta(&self) -> &[f64] {
        &self.inverse_sin_theta
    }

    pub fn weight(&self) -> &[f64] {
        &self.weight
    }

    pub fn multiple(&self) -> &[f64] {
        &self.multiple
    }

    /// Sweep weights `4π · ω_a · sin θ_p · w_p`, row-major `[azim][polar]`.
    pub fn polar_weights(&self, azim_weights: &[f64]) -> Vec<f64> {
        azim_weights
            .iter()
            .flat_map(|wa| self.multiple.iter().map(move |m| FOUR_PI * wa * m))
            .collect()
    }
}
