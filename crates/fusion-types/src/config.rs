// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_NUM_POLAR, DEFAULT_SOURCE_CONVERGENCE_THRESHOLD, MAX_NUM_POLAR,
};
use crate::error::{FusionError, FusionResult};
use serde::{Deserialize, Serialize};

/// Polar angle quadrature family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolarQuadratureType {
    /// Tabuchi–Yamamoto optimal set (1, 2 or 3 angles).
    #[default]
    Tabuchi,
    /// Leonard optimal set (2 or 3 angles).
    Leonard,
}

/// Run options for an MOC eigenvalue calculation.
/// Mirrors the command-line options of the sample input decks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MocConfig {
    pub case_name: String,
    /// Worker threads; `None` uses the global rayon pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
    /// Azimuthal angles handed to the track generator.
    #[serde(default = "default_num_azim")]
    pub num_azim: usize,
    /// Source convergence threshold.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_num_polar")]
    pub num_polar: usize,
    #[serde(default)]
    pub quadrature: PolarQuadratureType,
    /// Linear interpolation table for exp() instead of the intrinsic.
    #[serde(default = "default_interpolate_exponential")]
    pub interpolate_exponential: bool,
}

fn default_num_azim() -> usize {
    4
}
fn default_tolerance() -> f64 {
    DEFAULT_SOURCE_CONVERGENCE_THRESHOLD
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_num_polar() -> usize {
    DEFAULT_NUM_POLAR
}
fn default_interpolate_exponential() -> bool {
    true
}

impl Default for MocConfig {
    fn default() -> Self {
        MocConfig {
            case_name: "moc".to_string(),
            num_threads: None,
            num_azim: default_num_azim(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            num_polar: default_num_polar(),
            quadrature: PolarQuadratureType::default(),
            interpolate_exponential: default_interpolate_exponential(),
        }
    }
}

impl MocConfig {
    /// Load from JSON file and validate.
    pub fn from_file(path: &str) -> FusionResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject option values no solver run can use.
    pub fn validate(&self) -> FusionResult<()> {
        if self.num_threads == Some(0) {
            return Err(FusionError::ConfigError(
                "num_threads must be at least 1".to_string(),
            ));
        }
        if self.num_azim == 0 {
            return Err(FusionError::ConfigError(
                "num_azim must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "tolerance must be finite and > 0, got {}",
                self.tolerance
            )));
        }
        if self.num_polar == 0 || self.num_polar > MAX_NUM_POLAR {
            return Err(FusionError::ConfigError(format!(
                "num_polar must be 1, 2 or 3, got {}",
                self.num_polar
            )));
        }
        if self.quadrature == PolarQuadratureType::Leonard && self.num_polar == 1 {
            return Err(FusionError::ConfigError(
                "Leonard quadrature supports 2 or 3 polar angles".to_string(),
            ));
        }
        Ok(())
    }
}
