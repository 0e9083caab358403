// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Material Cross Sections
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Multi-group macroscopic cross sections of a homogeneous material.

use fusion_types::error::{FusionError, FusionResult};
use ndarray::{Array1, Array2};

/// Macroscopic cross sections [1/cm] for `G` energy groups.
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    sigma_t: Array1<f64>,
    sigma_a: Array1<f64>,
    nu_sigma_f: Array1<f64>,
    chi: Array1<f64>,
    /// Scattering matrix, `sigma_s[[to, from]]`.
    sigma_s: Array2<f64>,
}

impl Material {
    /// Validate and build a material.
    ///
    /// All vectors must have the same length `G`, `sigma_s` must be `G×G`,
    /// every entry finite and non-negative, and `sigma_t > 0` in each group.
    pub fn new(
        name: impl Into<String>,
        sigma_t: Array1<f64>,
        sigma_a: Array1<f64>,
        nu_sigma_f: Array1<f64>,
        chi: Array1<f64>,
        sigma_s: Array2<f64>,
    ) -> FusionResult<Self> {
        let name = name.into();
        let groups = sigma_t.len();
        if groups == 0 {
            return Err(FusionError::ConfigError(format!(
                "Material '{name}' has no energy groups"
            )));
        }
        for (label, xs) in [
            ("sigma_a", &sigma_a),
            ("nu_sigma_f", &nu_sigma_f),
            ("chi", &chi),
        ] {
            if xs.len() != groups {
                return Err(FusionError::ConfigError(format!(
                    "Material '{name}': {label} has {} groups, expected {groups}",
                    xs.len()
                )));
            }
        }
        if sigma_s.dim() != (groups, groups) {
            return Err(FusionError::ConfigError(format!(
                "Material '{name}': sigma_s shape {:?}, expected ({groups}, {groups})",
                sigma_s.dim()
            )));
        }
        let all = sigma_t
            .iter()
            .chain(sigma_a.iter())
            .chain(nu_sigma_f.iter())
            .chain(chi.iter())
            .chain(sigma_s.iter());
        if all.clone().any(|v| !v.is_finite()) {
            return Err(FusionError::ConfigError(format!(
                "Material '{name}' contains non-finite cross sections"
            )));
        }
        if all.clone().any(|&v| v < 0.0) {
            return Err(FusionError::ConfigError(format!(
                "Material '{name}' contains negative cross sections"
            )));
        }
        if let Some(g) = sigma_t.iter().position(|&v| v <= 0.0) {
            return Err(FusionError::ConfigError(format!(
                "Material '{name}': sigma_t must be > 0 (group {g})"
            )));
        }

        Ok(Material {
            name,
            sigma_t,
            sigma_a,
            nu_sigma_f,
            chi,
            sigma_s,
        })
    }

    /// One-group material with all fission neutrons born in the group.
    pub fn one_group(
        name: impl Into<String>,
        sigma_t: f64,
        sigma_a: f64,
        nu_sigma_f: f64,
        sigma_s: f64,
    ) -> FusionResult<Self> {
        Self::new(
            name,
            Array1::from_elem(1, sigma_t),
            Array1::from_elem(1, sigma_a),
            Array1::from_elem(1, nu_sigma_f),
            Array1::from_elem(1, 1.0),
            Array2::from_elem((1, 1), sigma_s),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_groups(&self) -> usize {
        self.sigma_t.len()
    }

    pub fn sigma_t(&self) -> &Array1<f64> {
        &self.sigma_t
    }

    pub fn sigma_a(&self) -> &Array1<f64> {
        &self.sigma_a
    }

    pub fn nu_sigma_f(&self) -> &Array1<f64> {
        &self.nu_sigma_f
    }

    pub fn chi(&self) -> &Array1<f64> {
        &self.chi
    }

    pub fn sigma_s(&self) -> &Array2<f64> {
        &self.sigma_s
    }

    /// True if any group produces fission neutrons.
    pub fn is_fissile(&self) -> bool {
        self.nu_sigma_f.iter().any(|&v| v > 0.0)
    }

    /// Infinite-medium multiplication factor `νΣf/Σa` (one-group only).
    pub fn k_infinity_one_group(&self) -> Option<f64> {
        (self.num_groups() == 1 && self.sigma_a[0] > 0.0)
            .then(|| self.nu_sigma_f[0] / self.sigma_a[0])
    }
}
