//! Join of search hits with per-sample gene abundances.

use crate::data::{
    AbundanceTable, AnnotationHit, AnnotationHits, GeneCount, GeneCountTable, GENE_COUNTS_HEADER,
};
use crate::error::{ProfileError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// How the merger treats an output path that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Refuse to touch an existing file.
    #[default]
    FailIfExists,
    /// Append rows; the header is written only when the file is new.
    /// Re-running against the same file duplicates every row.
    Append,
    /// Replace any existing file.
    Truncate,
}

/// Result of merging hits with abundances.
///
/// Hits whose (sample, gene) pair has no abundance entry are not an error;
/// they are returned in `dropped` so callers can report the loss.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Emitted rows, in sorted hit order.
    pub matched: Vec<GeneCount>,
    /// Hits without a matching abundance entry.
    pub dropped: Vec<AnnotationHit>,
}

impl MergeOutcome {
    /// Matched rows as a gene-count table.
    pub fn into_table(self) -> GeneCountTable {
        GeneCountTable::new(self.matched)
    }
}

/// Join `hits` against the abundance tables.
///
/// Hits are visited in ascending (sample, gene, accession) order, not file
/// order. For each hit whose (sample, gene) pair appears in the abundance
/// tables, one `(sample, accession, count)` row is emitted. When a sample file
/// lists the same gene twice, the later count wins.
pub fn merge_annotations(abundances: &[AbundanceTable], hits: &AnnotationHits) -> MergeOutcome {
    let mut counts: HashMap<(&str, &str), f64> = HashMap::new();
    for table in abundances {
        for record in table.records() {
            counts.insert((record.sample_id.as_str(), record.gene_id.as_str()), record.count);
        }
    }

    let mut outcome = MergeOutcome::default();
    for hit in hits.sorted() {
        match counts.get(&(hit.sample_id.as_str(), hit.gene_id.as_str())) {
            Some(&count) => outcome
                .matched
                .push(GeneCount::new(hit.sample_id.clone(), hit.accession.clone(), count)),
            None => outcome.dropped.push(hit.clone()),
        }
    }

    info!(
        "Merged {} hits with abundances from {} sample file(s)",
        outcome.matched.len(),
        abundances.len()
    );
    if !outcome.dropped.is_empty() {
        warn!(
            "{} hit(s) had no abundance entry and were dropped",
            outcome.dropped.len()
        );
    }

    outcome
}

/// Write merged rows to `path` as `Sample\tID\tCount`.
///
/// Returns the number of data rows written.
pub fn write_gene_counts<P: AsRef<Path>>(
    rows: &[GeneCount],
    path: P,
    mode: OutputMode,
) -> Result<usize> {
    let path = path.as_ref();
    let exists = path.exists();

    let (file, write_header) = match mode {
        OutputMode::FailIfExists => {
            if exists {
                return Err(ProfileError::OutputExists(path.to_path_buf()));
            }
            (File::create(path)?, true)
        }
        OutputMode::Truncate => (File::create(path)?, true),
        OutputMode::Append => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (file, !exists)
        }
    };

    let mut writer = BufWriter::new(file);
    if write_header {
        writeln!(writer, "{}", GENE_COUNTS_HEADER.join("\t"))?;
    }
    for row in rows {
        writeln!(writer, "{}\t{}\t{}", row.sample_id, row.id, row.count)?;
    }
    writer.flush()?;

    Ok(rows.len())
}
