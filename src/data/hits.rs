//! Homology-search hit tables.

use crate::error::{ProfileError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Header written at the top of a collected hit table.
pub const HIT_TABLE_HEADER: &str = "#sample\tgene_id\taccession";

/// Marker separating the sample name from the rest of a search output file name.
const DIAMOND_MARKER: &str = "_diamond";

/// One search hit: a sample's gene matched to a reference accession.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnnotationHit {
    pub sample_id: String,
    pub gene_id: String,
    pub accession: String,
}

/// A collection of search hits across samples.
#[derive(Debug, Clone, Default)]
pub struct AnnotationHits {
    hits: Vec<AnnotationHit>,
}

/// Sample name of a search output file: the file name up to `_diamond`.
pub fn diamond_sample_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file_name.split_once(DIAMOND_MARKER) {
        Some((sample, _)) => sample.to_string(),
        None => file_name,
    }
}

impl AnnotationHits {
    pub fn new(hits: Vec<AnnotationHit>) -> Self {
        Self { hits }
    }

    /// Load a collected hit table.
    ///
    /// Lines starting with `#` are comments. Every other non-blank line is
    /// split on whitespace and must carry at least three fields: sample,
    /// gene ID and accession. Extra fields are ignored.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut hits = Vec::new();
        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(ProfileError::parse(
                    path,
                    idx + 1,
                    format!("expected at least 3 fields, found {}", fields.len()),
                ));
            }
            hits.push(AnnotationHit {
                sample_id: fields[0].to_string(),
                gene_id: fields[1].to_string(),
                accession: fields[2].to_string(),
            });
        }

        Ok(Self { hits })
    }

    /// Load one raw search output (query in column 1, subject accession in column 2).
    ///
    /// The sample name comes from the file name, see [`diamond_sample_name`].
    pub fn from_diamond<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let sample_id = diamond_sample_name(path);
        let reader = BufReader::new(File::open(path)?);

        let mut hits = Vec::new();
        for (idx, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(ProfileError::parse(
                    path,
                    idx + 1,
                    format!("expected at least 2 fields, found {}", fields.len()),
                ));
            }
            hits.push(AnnotationHit {
                sample_id: sample_id.clone(),
                gene_id: fields[0].to_string(),
                accession: fields[1].to_string(),
            });
        }

        Ok(Self { hits })
    }

    /// Append all hits of `other`.
    pub fn extend(&mut self, other: AnnotationHits) {
        self.hits.extend(other.hits);
    }

    /// Hits in ascending (sample, gene, accession) order.
    pub fn sorted(&self) -> Vec<&AnnotationHit> {
        let mut sorted: Vec<&AnnotationHit> = self.hits.iter().collect();
        sorted.sort();
        sorted
    }

    /// Write the hits as a collected hit table, header first.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", HIT_TABLE_HEADER)?;
        for hit in &self.hits {
            writeln!(writer, "{}\t{}\t{}", hit.sample_id, hit.gene_id, hit.accession)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn hits(&self) -> &[AnnotationHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
