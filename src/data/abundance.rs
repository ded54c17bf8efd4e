//! Per-sample gene abundance tables.

use crate::error::{ProfileError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Placeholder gene ID used by some abundance tools for a repeated header.
const HEADER_GENE_ID: &str = "#ID";

/// One gene count within a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceRecord {
    pub sample_id: String,
    pub gene_id: String,
    pub count: f64,
}

/// All gene counts read from a single sample file.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    sample_id: String,
    records: Vec<AbundanceRecord>,
}

/// Sample name of an abundance file: the file name minus its final extension.
///
/// `reads/S1.filtered.tsv` becomes `S1.filtered`; a name without any `.` is
/// returned unchanged.
pub fn sample_id_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name,
    }
}

impl AbundanceTable {
    /// Build a table directly from records for one sample.
    pub fn new(sample_id: impl Into<String>, records: Vec<(String, f64)>) -> Self {
        let sample_id = sample_id.into();
        let records = records
            .into_iter()
            .map(|(gene_id, count)| AbundanceRecord {
                sample_id: sample_id.clone(),
                gene_id,
                count,
            })
            .collect();
        Self { sample_id, records }
    }

    /// Load an abundance file.
    ///
    /// Expected format: two tab-separated columns `gene_id`, `count`. The
    /// first line is a header and is skipped; blank lines are ignored. Any
    /// other line without exactly two fields is fatal.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let sample_id = sample_id_from_path(path);
        if sample_id.trim().is_empty() {
            return Err(ProfileError::parse(path, 0, "file name yields an empty sample name"));
        }
        let reader = BufReader::new(File::open(path)?);

        let mut records = Vec::new();
        for (idx, line_result) in reader.lines().enumerate().skip(1) {
            let line = line_result?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 2 {
                return Err(ProfileError::parse(
                    path,
                    line_no,
                    format!("expected 2 tab-separated fields, found {}", fields.len()),
                ));
            }
            let gene_id = fields[0];
            if gene_id == HEADER_GENE_ID {
                continue;
            }
            records.push(AbundanceRecord {
                sample_id: sample_id.clone(),
                gene_id: gene_id.to_string(),
                count: super::parse_count(fields[1], path, line_no)?,
            });
        }

        Ok(Self { sample_id, records })
    }

    /// Sample this table belongs to.
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    /// All records, in file order.
    pub fn records(&self) -> &[AbundanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
