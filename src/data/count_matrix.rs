//! Dense labelled count matrix for category × sample tables.

use crate::error::{ProfileError, Result};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A dense matrix of summed counts (or percentages) across samples.
///
/// Rows represent category values (pathway level labels, gene IDs or summary
/// groups), columns represent samples. Every (row, sample) cell is present;
/// combinations never observed in the source table hold `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    /// Cell values (rows × samples).
    data: DMatrix<f64>,
    /// Header of the row-label column (e.g. `Lv3`, `ID`, `LV_SUM`).
    row_label: String,
    /// Row identifiers, in first-appearance order.
    row_ids: Vec<String>,
    /// Sample identifiers (column names).
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new CountMatrix from dense data and identifiers.
    pub fn new(
        data: DMatrix<f64>,
        row_label: impl Into<String>,
        row_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != row_ids.len() {
            return Err(ProfileError::DimensionMismatch {
                expected: nrows,
                actual: row_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(ProfileError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            row_label: row_label.into(),
            row_ids,
            sample_ids,
        })
    }

    /// An empty matrix with no rows and no samples.
    pub fn empty(row_label: impl Into<String>) -> Self {
        Self {
            data: DMatrix::zeros(0, 0),
            row_label: row_label.into(),
            row_ids: Vec::new(),
            sample_ids: Vec::new(),
        }
    }

    /// Build a matrix by summing `(row, col, value)` triplets into a zero-filled grid.
    pub fn from_triplets(
        row_label: impl Into<String>,
        row_ids: Vec<String>,
        sample_ids: Vec<String>,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let mut data = DMatrix::zeros(row_ids.len(), sample_ids.len());
        for (row, col, value) in triplets {
            if row >= row_ids.len() || col >= sample_ids.len() {
                return Err(ProfileError::InvalidParameter(format!(
                    "Cell ({}, {}) out of bounds for {}x{} matrix",
                    row,
                    col,
                    row_ids.len(),
                    sample_ids.len()
                )));
            }
            data[(row, col)] += value;
        }
        Self::new(data, row_label, row_ids, sample_ids)
    }

    /// Load a count matrix from a TSV file.
    ///
    /// Expected format:
    /// - First row: header, first column names the row label, the rest are sample IDs
    /// - Subsequent rows: row ID followed by one value per sample
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| ProfileError::EmptyData(format!("Empty TSV file {:?}", path)))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        let row_label = header[0].to_string();
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.to_string()).collect();
        let n_samples = sample_ids.len();

        let mut row_ids = Vec::new();
        let mut values = Vec::new();
        for (idx, line_result) in lines.enumerate() {
            let line = line_result?;
            let line_no = idx + 2;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != n_samples + 1 {
                return Err(ProfileError::parse(
                    path,
                    line_no,
                    format!("expected {} fields, found {}", n_samples + 1, fields.len()),
                ));
            }
            row_ids.push(fields[0].to_string());
            for value in &fields[1..] {
                values.push(super::parse_count(value, path, line_no)?);
            }
        }

        let data = DMatrix::from_row_slice(row_ids.len(), n_samples, &values);
        Self::new(data, row_label, row_ids, sample_ids)
    }

    /// Write the matrix to a TSV file, row label column first.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "{}", self.row_label)?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row_idx, row_id) in self.row_ids.iter().enumerate() {
            write!(writer, "{}", row_id)?;
            for col_idx in 0..self.n_samples() {
                write!(writer, "\t{}", self.get(row_idx, col_idx))?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// True when the matrix has no rows or no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Header of the row label column.
    #[inline]
    pub fn row_label(&self) -> &str {
        &self.row_label
    }

    /// Row identifiers.
    #[inline]
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Position of a row by identifier.
    pub fn row_index(&self, row_id: &str) -> Option<usize> {
        self.row_ids.iter().position(|r| r == row_id)
    }

    /// Position of a sample by identifier.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|s| s == sample_id)
    }

    /// Get a row as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    /// Compute row sums.
    pub fn row_sums(&self) -> Vec<f64> {
        self.data.row_iter().map(|r| r.sum()).collect()
    }

    /// Compute column sums (per-sample totals).
    pub fn col_sums(&self) -> Vec<f64> {
        self.data.column_iter().map(|c| c.sum()).collect()
    }

    /// Sum over every cell.
    pub fn grand_total(&self) -> f64 {
        self.data.sum()
    }

    /// A new matrix with the same labels and `data` replaced.
    pub fn with_data(&self, data: DMatrix<f64>) -> Result<Self> {
        Self::new(
            data,
            self.row_label.clone(),
            self.row_ids.clone(),
            self.sample_ids.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> CountMatrix {
        // 3 rows × 2 samples
        CountMatrix::from_triplets(
            "Lv3",
            vec!["nitrogen".into(), "iron".into(), "phosphate".into()],
            vec!["S1".into(), "S2".into()],
            vec![(0, 0, 10.0), (0, 1, 20.0), (1, 0, 5.0), (2, 1, 1.0), (0, 0, 2.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let mat = create_test_matrix();
        assert_eq!(mat.n_rows(), 3);
        assert_eq!(mat.n_samples(), 2);
        assert!(!mat.is_empty());
    }

    #[test]
    fn test_triplets_are_summed_and_zero_filled() {
        let mat = create_test_matrix();
        assert_eq!(mat.get(0, 0), 12.0);
        assert_eq!(mat.get(1, 1), 0.0);
        assert_eq!(mat.get(2, 0), 0.0);
    }

    #[test]
    fn test_sums() {
        let mat = create_test_matrix();
        assert_eq!(mat.row_sums(), vec![32.0, 5.0, 1.0]);
        assert_eq!(mat.col_sums(), vec![17.0, 21.0]);
        assert_eq!(mat.grand_total(), 38.0);
    }

    #[test]
    fn test_out_of_bounds_triplet() {
        let result = CountMatrix::from_triplets("ID", vec!["a".into()], vec!["S1".into()], vec![(1, 0, 1.0)]);
        assert!(matches!(result, Err(ProfileError::InvalidParameter(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = CountMatrix::new(DMatrix::zeros(2, 1), "ID", vec!["a".into()], vec!["S1".into()]);
        assert!(matches!(
            result,
            Err(ProfileError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_empty() {
        let mat = CountMatrix::empty("Lv4");
        assert!(mat.is_empty());
        assert_eq!(mat.grand_total(), 0.0);
    }

    #[test]
    fn test_tsv_roundtrip_keeps_row_order() {
        let mat = create_test_matrix();
        let temp_file = NamedTempFile::new().unwrap();
        mat.to_tsv(temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("Lv3\tS1\tS2\nnitrogen\t12\t20\n"));

        let loaded = CountMatrix::from_tsv(temp_file.path()).unwrap();
        assert_eq!(loaded, mat);
    }

    #[test]
    fn test_from_tsv_rejects_short_row() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Lv3\tS1\tS2").unwrap();
        writeln!(file, "iron\t1").unwrap();
        file.flush().unwrap();

        let err = CountMatrix::from_tsv(file.path()).unwrap_err();
        assert!(matches!(err, ProfileError::Parse { line: 2, .. }));
    }
}
