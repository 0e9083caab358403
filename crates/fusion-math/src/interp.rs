//! Tangent-line interpolation tables.
//!
//! A function is tabulated on uniform nodes `x_i = i·h` as (slope, intercept)
//! pairs of its tangent at each node. Lookup rounds to the nearest node and
//! evaluates `slope·x + intercept`, so the error is bounded by
//! `max|f''|·h²/8`.

use fusion_types::error::{FusionError, FusionResult};

/// Uniform tangent-line table over `[0, x_max]`.
#[derive(Debug, Clone)]
pub struct TangentTable {
    spacing: f64,
    inverse_spacing: f64,
    x_max: f64,
    /// (slope, intercept) per node.
    lines: Vec<[f64; 2]>,
}

impl TangentTable {
    /// Tabulate `f` over `[0, x_max]` with `num_points` nodes.
    ///
    /// `f` returns `(value, derivative)` at a node.
    pub fn build<F>(num_points: usize, x_max: f64, f: F) -> FusionResult<Self>
    where
        F: Fn(f64) -> (f64, f64),
    {
        if num_points < 2 {
            return Err(FusionError::ConfigError(format!(
                "Tangent table needs at least 2 points, got {num_points}"
            )));
        }
        if !x_max.is_finite() || x_max <= 0.0 {
            return Err(FusionError::ConfigError(format!(
                "Tangent table range must be finite > 0, got {x_max}"
            )));
        }

        let spacing = x_max / (num_points - 1) as f64;
        let lines = (0..num_points)
            .map(|i| {
                let x = i as f64 * spacing;
                let (value, slope) = f(x);
                [slope, value - slope * x]
            })
            .collect::<Vec<_>>();

        if lines.iter().flatten().any(|v| !v.is_finite()) {
            return Err(FusionError::ConfigError(
                "Tangent table contains non-finite entries".to_string(),
            ));
        }

        Ok(TangentTable {
            spacing,
            inverse_spacing: 1.0 / spacing,
            x_max,
            lines,
        })
    }

    /// Evaluate at `x`; `None` outside `[0, x_max]`.
    #[inline]
    pub fn eval(&self, x: f64) -> Option<f64> {
        if !(0.0..=self.x_max).contains(&x) {
            return None;
        }
        let index = ((x * self.inverse_spacing).round() as usize).min(self.lines.len() - 1);
        let [slope, intercept] = self.lines[index];
        Some(slope * x + intercept)
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
