//! Matrix-global scaling: every cell divided by the grand total.
//!
//! Unlike per-sample total sum scaling, the denominator is the sum over *all*
//! cells, so after scaling the whole matrix sums to the scale factor while
//! individual rows and columns generally do not.

use crate::data::CountMatrix;
use crate::error::{ProfileError, Result};

/// Scale every cell by `scale_factor / grand_total`.
///
/// # Formula
/// y_ij = x_ij / Σ_kl x_kl * scale_factor
///
/// # Errors
/// Empty matrices, non-positive scale factors and a zero grand total are
/// rejected.
pub fn norm_global(counts: &CountMatrix, scale_factor: f64) -> Result<CountMatrix> {
    if counts.is_empty() {
        return Err(ProfileError::EmptyData(format!(
            "Cannot normalize empty {} matrix",
            counts.row_label()
        )));
    }

    if scale_factor <= 0.0 {
        return Err(ProfileError::InvalidParameter(
            "Scale factor must be positive".to_string(),
        ));
    }

    let total = counts.grand_total();
    if total <= 0.0 {
        return Err(ProfileError::Numerical(format!(
            "{} matrix has zero total count, cannot normalize",
            counts.row_label()
        )));
    }

    counts.with_data(counts.data() * (scale_factor / total))
}

/// Percent of grand total (the whole matrix sums to 100).
pub fn norm_percent(counts: &CountMatrix) -> Result<CountMatrix> {
    norm_global(counts, scale::PERCENT)
}

/// Common scale factors.
pub mod scale {
    /// Proportions (matrix sums to 1.0).
    pub const PROPORTION: f64 = 1.0;
    /// Percentages (matrix sums to 100).
    pub const PERCENT: f64 = 100.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_counts() -> CountMatrix {
        // 3 rows × 2 samples, grand total = 200
        CountMatrix::from_triplets(
            "Lv4",
            vec!["A".into(), "B".into(), "C".into()],
            vec!["S1".into(), "S2".into()],
            vec![(0, 0, 50.0), (1, 0, 30.0), (2, 0, 20.0), (0, 1, 90.0), (2, 1, 10.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_percent_sums_to_100() {
        let norm = norm_percent(&create_test_counts()).unwrap();
        assert_relative_eq!(norm.grand_total(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_shape_and_labels_preserved() {
        let counts = create_test_counts();
        let norm = norm_percent(&counts).unwrap();
        assert_eq!(norm.n_rows(), counts.n_rows());
        assert_eq!(norm.n_samples(), counts.n_samples());
        assert_eq!(norm.row_ids(), counts.row_ids());
        assert_eq!(norm.row_label(), "Lv4");
    }

    #[test]
    fn test_not_per_column() {
        let norm = norm_percent(&create_test_counts()).unwrap();
        let col_sums = norm.col_sums();
        assert_relative_eq!(col_sums[0], 50.0, epsilon = 1e-9);
        assert_relative_eq!(col_sums[1], 50.0, epsilon = 1e-9);
        assert_relative_eq!(norm.row_sums()[0], 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cell_roundtrip() {
        let counts = create_test_counts();
        let norm = norm_percent(&counts).unwrap();
        let total = counts.grand_total();
        for r in 0..counts.n_rows() {
            for c in 0..counts.n_samples() {
                assert_relative_eq!(
                    counts.get(r, c) / total * 100.0,
                    norm.get(r, c),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_proportion_scale() {
        let norm = norm_global(&create_test_counts(), scale::PROPORTION).unwrap();
        assert_relative_eq!(norm.get(0, 0), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        assert!(matches!(
            norm_percent(&CountMatrix::empty("Lv3")),
            Err(ProfileError::EmptyData(_))
        ));

        let no_cells: Vec<(usize, usize, f64)> = Vec::new();
        let zeros =
            CountMatrix::from_triplets("Lv3", vec!["A".into()], vec!["S1".into()], no_cells).unwrap();
        assert!(matches!(norm_percent(&zeros), Err(ProfileError::Numerical(_))));

        assert!(norm_global(&create_test_counts(), 0.0).is_err());
    }
}
