//! Data structures and flat-file loaders for annotation profiling.

mod abundance;
mod count_matrix;
mod gene_counts;
mod hits;
mod pathway;
mod summary_class;

pub use abundance::{sample_id_from_path, AbundanceRecord, AbundanceTable};
pub use count_matrix::CountMatrix;
pub use gene_counts::{GeneCount, GeneCountTable};
pub(crate) use gene_counts::GENE_COUNTS_HEADER;
pub use hits::{diamond_sample_name, AnnotationHit, AnnotationHits, HIT_TABLE_HEADER};
pub use pathway::{Level, PathwayRecord, PathwayTable, LEAF_CODE_COLUMN};
pub use summary_class::{SummaryClass, SummaryClassification, SUMMARY_GROUP_COLUMN};

use crate::error::{ProfileError, Result};
use std::path::Path;

/// Parse a non-negative, finite count from a text field.
pub(crate) fn parse_count(value: &str, path: &Path, line: usize) -> Result<f64> {
    let invalid = || ProfileError::InvalidCount {
        value: value.to_string(),
        path: path.to_path_buf(),
        line,
    };
    let parsed: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Index of each `names` column in a header record.
pub(crate) fn header_columns<const N: usize>(
    headers: &csv::StringRecord,
    names: &[&str; N],
    path: &Path,
) -> Result<[usize; N]> {
    let mut cols = [0usize; N];
    for (slot, name) in cols.iter_mut().zip(names) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == *name)
            .ok_or_else(|| ProfileError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })?;
    }
    Ok(cols)
}

/// Reject a record whose field count differs from the header's, returning it
/// with its 1-based line number.
pub(crate) fn checked_record(
    record: csv::StringRecord,
    headers: &csv::StringRecord,
    path: &Path,
) -> Result<(csv::StringRecord, usize)> {
    let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
    if record.len() != headers.len() {
        return Err(ProfileError::parse(
            path,
            line,
            format!("expected {} fields, found {}", headers.len(), record.len()),
        ));
    }
    Ok((record, line))
}

/// Treat empty cells as missing values.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count() {
        let path = Path::new("x.tsv");
        assert_eq!(parse_count("5", path, 1).unwrap(), 5.0);
        assert_eq!(parse_count(" 2.5 ", path, 1).unwrap(), 2.5);
        assert!(parse_count("-1", path, 3).is_err());
        assert!(parse_count("NaN", path, 3).is_err());
        assert!(matches!(
            parse_count("abc", path, 7),
            Err(ProfileError::InvalidCount { line: 7, .. })
        ));
    }

    #[test]
    fn test_header_columns() {
        let headers = csv::StringRecord::from(vec!["Lv1", " ID ", "extra"]);
        let path = Path::new("x.tsv");
        assert_eq!(header_columns(&headers, &["ID", "Lv1"], path).unwrap(), [1, 0]);
        assert!(matches!(
            header_columns(&headers, &["LV_SUM"], path),
            Err(ProfileError::MissingColumn { ref column, .. }) if column == "LV_SUM"
        ));
    }

    #[test]
    fn test_checked_record_rejects_short_rows() {
        let headers = csv::StringRecord::from(vec!["ID", "LV_SUM"]);
        let path = Path::new("x.tsv");
        let short = csv::StringRecord::from(vec!["K1"]);
        assert!(matches!(
            checked_record(short, &headers, path),
            Err(ProfileError::Parse { .. })
        ));
        let full = csv::StringRecord::from(vec!["K1", "A"]);
        assert_eq!(checked_record(full, &headers, path).unwrap().0.len(), 2);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" Lv "), Some("Lv".to_string()));
    }
}
