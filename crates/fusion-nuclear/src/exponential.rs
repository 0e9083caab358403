// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Exponential Attenuation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Segment attenuation factor `1 − exp(−τ / sin θ_p)`.
//!
//! Two interchangeable kernels: direct evaluation, or a tangent-line table
//! whose spacing is tied to the source convergence threshold so that the
//! interpolation error stays two orders below it.

use crate::quadrature::PolarQuadrature;
use fusion_math::interp::TangentTable;
use fusion_types::constants::{
    EXP_TABLE_ERROR_FACTOR, EXP_TABLE_MAX_POINTS, EXP_TABLE_MAX_TAU, EXP_TABLE_MIN_POINTS,
};
use fusion_types::error::{FusionError, FusionResult};

/// Attenuation of angular flux across one segment.
pub trait AttenuationKernel: Sync {
    /// `1 − exp(−tau / sin θ_polar)` for optical length `tau = Σt · l`.
    fn attenuation(&self, tau: f64, polar: usize) -> f64;
}

/// Direct `exp` evaluation.
#[derive(Debug, Clone)]
pub struct IntrinsicExponential {
    inverse_sin_theta: Vec<f64>,
}

impl IntrinsicExponential {
    pub fn new(quadrature: &PolarQuadrature) -> Self {
        IntrinsicExponential {
            inverse_sin_theta: quadrature.inverse_sin_theta().to_vec(),
        }
    }
}

impl AttenuationKernel for IntrinsicExponential {
    #[inline]
    fn attenuation(&self, tau: f64, polar: usize) -> f64 {
        1.0 - (-tau * self.inverse_sin_theta[polar]).exp()
    }
}

/// Tangent-line table per polar angle over `τ ∈ [0, 10]`.
#[derive(Debug, Clone)]
pub struct ExpInterpTable {
    tables: Vec<TangentTable>,
    inverse_sin_theta: Vec<f64>,
}

/// Node count for a table accurate to `threshold · 1e-2`.
pub fn table_size(threshold: f64) -> usize {
    let n = EXP_TABLE_MAX_TAU * (1.0 / (8.0 * threshold * EXP_TABLE_ERROR_FACTOR)).sqrt();
    if n.is_finite() {
        (n.ceil() as usize).clamp(EXP_TABLE_MIN_POINTS, EXP_TABLE_MAX_POINTS)
    } else {
        EXP_TABLE_MAX_POINTS
    }
}

impl ExpInterpTable {
    pub fn new(quadrature: &PolarQuadrature, threshold: f64) -> FusionResult<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "Exponential table threshold must be finite and > 0, got {threshold}"
            )));
        }
        let num_points = table_size(threshold);
        let tables = quadrature
            .inverse_sin_theta()
            .iter()
            .map(|&inv| {
                TangentTable::build(num_points, EXP_TABLE_MAX_TAU, |tau| {
                    let e = (-tau * inv).exp();
                    (1.0 - e, e * inv)
                })
            })
            .collect::<FusionResult<Vec<_>>>()?;
        Ok(ExpInterpTable {
            tables,
            inverse_sin_theta: quadrature.inverse_sin_theta().to_vec(),
        })
    }

    pub fn num_points(&self) -> usize {
        self.tables.first().map_or(0, TangentTable::len)
    }

    pub fn spacing(&self) -> f64 {
        self.tables.first().map_or(0.0, TangentTable::spacing)
    }
}

impl AttenuationKernel for ExpInterpTable {
    #[inline]
    fn attenuation(&self, tau: f64, polar: usize) -> f64 {
        // Beyond the table the flux is fully attenuated to round-off anyway.
        self.tables[polar]
            .eval(tau)
            .unwrap_or_else(|| 1.0 - (-tau * self.inverse_sin_theta[polar]).exp())
    }
}

/// Kernel selected by the solver configuration.
#[derive(Debug, Clone)]
pub enum ExponentialKernel {
    Intrinsic(IntrinsicExponential),
    Interpolated(ExpInterpTable),
}

impl ExponentialKernel {
    pub fn build(
        quadrature: &PolarQuadrature,
        interpolate: bool,
        threshold: f64,
    ) -> FusionResult<Self> {
        if interpolate {
            Ok(ExponentialKernel::Interpolated(ExpInterpTable::new(
                quadrature, threshold,
            )?))
        } else {
            Ok(ExponentialKernel::Intrinsic(IntrinsicExponential::new(
                quadrature,
            )))
        }
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, ExponentialKernel::Interpolated(_))
    }
}

impl AttenuationKernel for ExponentialKernel {
    #[inline]
    fn attenuation(&self, tau: f64, polar: usize) -> f64 {
        match self {
            ExponentialKernel::Intrinsic(k) => k.attenuation(tau, polar),
            ExponentialKernel::Interpolated(k) => k.attenuation(tau, polar),
        }
    }
}
