// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

/// Lifecycle of one source-iteration solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveState {
    #[default]
    Uninitialized,
    Initializing,
    Iterating,
    /// Residual dropped below threshold after at least two iterations.
    Converged,
    /// Iteration budget consumed without meeting the threshold.
    Exhausted,
}

impl SolveState {
    /// True once a solve has returned (converged or not).
    pub fn is_finished(self) -> bool {
        matches!(self, SolveState::Converged | SolveState::Exhausted)
    }
}

/// Floating-point width used for flux and source arithmetic. Only `f64`
/// storage is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Double,
}

/// Eigenvalue solve result.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenvalueResult {
    pub k_eff: f64,
    pub iterations: usize,
    /// Source residual of the last iteration.
    pub residual: f64,
    pub converged: bool,
    pub solve_time_s: f64,
    /// Source residual per iteration, in order.
    pub residual_history: Vec<f64>,
}

impl EigenvalueResult {
    /// Reactivity ρ = (k − 1)/k.
    pub fn reactivity(&self) -> f64 {
        (self.k_eff - 1.0) / self.k_eff
    }
}
