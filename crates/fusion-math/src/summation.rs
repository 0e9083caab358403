// ─────────────────────────────────────────────────────────────────────
// SCPN Fusion Core — Summation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Pairwise (cascade) summation.
//!
//! Round-off grows as O(ε log n) instead of O(ε n) for naive accumulation.
//! Used for every global reduction in the MOC eigenvalue loop (fission and
//! absorption totals, leakage, source residual).

use ndarray::{ArrayView1, Axis};

/// Below this length blocks are summed sequentially.
const PAIRWISE_BLOCK: usize = 16;

/// Pairwise sum of a slice.
pub fn pairwise_sum(values: &[f64]) -> f64 {
    if values.len() <= PAIRWISE_BLOCK {
        return values.iter().sum();
    }
    let (lo, hi) = values.split_at(values.len() / 2);
    pairwise_sum(lo) + pairwise_sum(hi)
}

/// Pairwise sum of a 1D array view (any stride).
pub fn pairwise_sum_view(values: ArrayView1<'_, f64>) -> f64 {
    if let Some(slice) = values.as_slice() {
        return pairwise_sum(slice);
    }
    if values.len() <= PAIRWISE_BLOCK {
        return values.iter().sum();
    }
    let mid = values.len() / 2;
    let (lo, hi) = values.split_at(Axis(0), mid);
    pairwise_sum_view(lo) + pairwise_sum_view(hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array1, Array2};

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(pairwise_sum(&[]), 0.0);
    }

    #[test]
    fn test_matches_gauss_sum() {
        let values: Vec<f64> = (1..=1000).map(|i| i as f64).collect();
        assert_eq!(pairwise_sum(&values), 500_500.0);
    }

    #[test]
    fn test_beats_naive_on_many_small_terms() {
        let n = 1_000_000;
        let values = vec![0.1; n];
        let naive: f64 = values.iter().sum();
        let pairwise = pairwise_sum(&values);
        let exact = 100_000.0;
        assert!(
            (pairwise - exact).abs() <= (naive - exact).abs(),
            "pairwise={pairwise}, naive={naive}"
        );
        assert!((pairwise - exact).abs() < 1e-8);
    }

    #[test]
    fn test_strided_view_matches_contiguous() {
        let grid = Array2::from_shape_fn((50, 3), |(i, j)| (i * 3 + j) as f64 * 0.5);
        let column = grid.slice(s![.., 1]);
        assert!(column.as_slice().is_none());
        let expected: f64 = column.iter().sum();
        assert!((pairwise_sum_view(column) - expected).abs() < 1e-12);

        let flat = Array1::linspace(0.0, 1.0, 33);
        assert!((pairwise_sum_view(flat.view()) - 16.5).abs() < 1e-12);
    }
}
