// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::f64::consts::PI;

/// Full solid angle [sr].
pub const FOUR_PI: f64 = 4.0 * PI;

/// 1/(4π), isotropic emission density per steradian.
pub const ONE_OVER_FOUR_PI: f64 = 1.0 / FOUR_PI;

/// Default source convergence threshold.
pub const DEFAULT_SOURCE_CONVERGENCE_THRESHOLD: f64 = 1e-3;

/// Default number of polar angles (3 recommended).
pub const DEFAULT_NUM_POLAR: usize = 3;

/// Largest supported polar angle count.
pub const MAX_NUM_POLAR: usize = 3;

/// Flat initial guess for scalar flux and source in every region/group.
pub const FLAT_INITIAL_VALUE: f64 = 1.0;

/// Initial eigenvalue guess.
pub const INITIAL_KEFF: f64 = 1.0;

/// Sources at or below this magnitude do not enter the residual.
pub const SOURCE_RESIDUAL_FLOOR: f64 = 1e-10;

/// Optical thickness covered by the exponential interpolation table.
pub const EXP_TABLE_MAX_TAU: f64 = 10.0;

/// Scale between source threshold and tolerated interpolation error.
pub const EXP_TABLE_ERROR_FACTOR: f64 = 1e-2;

/// Node count bounds for the exponential interpolation table.
pub const EXP_TABLE_MIN_POINTS: usize = 100;
pub const EXP_TABLE_MAX_POINTS: usize = 1 << 20;

/// Default iteration budget used by configuration files.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
