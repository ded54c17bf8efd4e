//! Long-format (sample, id, count) table produced by the annotation merger.

use crate::error::Result;
use log::warn;
use std::path::Path;

/// Header line of a merged gene-count table.
pub(crate) const GENE_COUNTS_HEADER: [&str; 3] = ["Sample", "ID", "Count"];

/// Separator after which an ID carries a per-gene suffix (`K00001_3` → `K00001`).
const ID_SUFFIX_SEPARATOR: char = '_';

/// Summed count of one accession in one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneCount {
    pub sample_id: String,
    pub id: String,
    pub count: f64,
}

impl GeneCount {
    pub fn new(sample_id: impl Into<String>, id: impl Into<String>, count: f64) -> Self {
        Self {
            sample_id: sample_id.into(),
            id: id.into(),
            count,
        }
    }

    /// Sample of this count; `None` when the cell is blank.
    pub fn sample(&self) -> Option<&str> {
        present(&self.sample_id)
    }

    /// Accession of this count; `None` when the cell is blank.
    pub fn key(&self) -> Option<&str> {
        present(&self.id)
    }
}

fn present(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// All merged gene counts, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneCountTable {
    rows: Vec<GeneCount>,
}

impl GeneCountTable {
    pub fn new(rows: Vec<GeneCount>) -> Self {
        Self { rows }
    }

    /// Load a merged table with header `Sample`, `ID`, `Count`.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let cols = super::header_columns(&headers, &GENE_COUNTS_HEADER, path)?;

        let mut rows = Vec::new();
        let mut blank_keys = 0usize;
        for result in reader.records() {
            let (record, line) = super::checked_record(result?, &headers, path)?;
            let (Some(sample_id), Some(id)) = (
                super::non_empty(&record[cols[0]]),
                super::non_empty(&record[cols[1]]),
            ) else {
                blank_keys += 1;
                continue;
            };
            rows.push(GeneCount {
                sample_id,
                id,
                count: super::parse_count(&record[cols[2]], path, line)?,
            });
        }
        if blank_keys > 0 {
            warn!(
                "{:?}: dropped {} row(s) with an empty Sample or ID",
                path, blank_keys
            );
        }

        Ok(Self { rows })
    }

    /// Truncate every ID at its first `_`, so per-gene suffixed accessions
    /// collapse onto the pathway table's family IDs.
    pub fn strip_id_suffixes(mut self) -> Self {
        for row in &mut self.rows {
            if let Some((family, _)) = row.id.split_once(ID_SUFFIX_SEPARATOR) {
                row.id = family.to_string();
            }
        }
        self
    }

    pub fn rows(&self) -> &[GeneCount] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<GeneCount> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

impl FromIterator<GeneCount> for GeneCountTable {
    fn from_iter<I: IntoIterator<Item = GeneCount>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Sample\tID\tCount").unwrap();
        writeln!(file, "S1\tK001_1\t5").unwrap();
        writeln!(file, "S2\tK002\t2.5").unwrap();
        file.flush().unwrap();

        let table = GeneCountTable::from_tsv(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], GeneCount::new("S1", "K001_1", 5.0));
        assert_eq!(table.total(), 7.5);
    }

    #[test]
    fn test_from_tsv_drops_blank_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Sample\tID\tCount").unwrap();
        writeln!(file, "S1\tK1\t5").unwrap();
        writeln!(file, "\tK1\t7").unwrap();
        writeln!(file, "S2\t \t3").unwrap();
        file.flush().unwrap();

        let table = GeneCountTable::from_tsv(file.path()).unwrap();
        assert_eq!(table.rows(), &[GeneCount::new("S1", "K1", 5.0)]);
        assert_eq!(table.total(), 5.0);
    }

    #[test]
    fn test_blank_sample_and_key() {
        let row = GeneCount::new(" ", "", 1.0);
        assert_eq!(row.sample(), None);
        assert_eq!(row.key(), None);
        assert_eq!(GeneCount::new("S1", "K1", 1.0).sample(), Some("S1"));
    }

    #[test]
    fn test_from_tsv_missing_count_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Sample\tID").unwrap();
        file.flush().unwrap();

        let err = GeneCountTable::from_tsv(file.path()).unwrap_err();
        assert!(matches!(err, ProfileError::MissingColumn { ref column, .. } if column == "Count"));
    }

    #[test]
    fn test_strip_id_suffixes() {
        let table = GeneCountTable::new(vec![
            GeneCount::new("S1", "K001_1_2", 1.0),
            GeneCount::new("S1", "K002", 1.0),
        ])
        .strip_id_suffixes();
        let ids: Vec<&str> = table.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["K001", "K002"]);
    }
}
