//! OTU table construction and writing.

use crate::aggregate::aggregate_ids;
use crate::data::{CountMatrix, Level, PathwayRecord, PathwayTable, LEAF_CODE_COLUMN};
use crate::error::{ProfileError, Result};
use crate::join::JoinedTable;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header of the ID column in the exported table.
pub const OTU_ID_HEADER: &str = "#OTU ID";
/// Header of the taxonomy column in the exported table.
pub const TAXONOMY_HEADER: &str = "taxonomy";
/// Leading comment line expected by the converter.
pub const OTU_COMMENT: &str = "# Constructed from biom file";

/// ID × sample counts with the pathway lineage of every ID.
#[derive(Debug, Clone)]
pub struct OtuTable {
    counts: CountMatrix,
    /// One entry per row of `counts`; `None` when the ID has no pathway record.
    lineages: Vec<Option<PathwayRecord>>,
}

/// Pivot the joined table to ID × sample and left-join lineages back on.
///
/// When an ID has several pathway records the first one in table order
/// supplies its taxonomy.
pub fn build_otu_table(joined: &JoinedTable<'_>, pathways: &PathwayTable) -> Result<OtuTable> {
    let counts = aggregate_ids(joined)?;
    let lineages = counts
        .row_ids()
        .iter()
        .map(|id| pathways.get(id).cloned())
        .collect();
    Ok(OtuTable { counts, lineages })
}

impl OtuTable {
    pub fn new(counts: CountMatrix, lineages: Vec<Option<PathwayRecord>>) -> Result<Self> {
        if lineages.len() != counts.n_rows() {
            return Err(ProfileError::DimensionMismatch {
                expected: counts.n_rows(),
                actual: lineages.len(),
            });
        }
        Ok(Self { counts, lineages })
    }

    pub fn counts(&self) -> &CountMatrix {
        &self.counts
    }

    pub fn lineages(&self) -> &[Option<PathwayRecord>] {
        &self.lineages
    }

    /// Taxonomy string of row `row`; all fields read `nan` without a lineage.
    pub fn taxonomy(&self, row: usize) -> String {
        match &self.lineages[row] {
            Some(record) => record.taxonomy_string(),
            None => PathwayRecord {
                id: self.counts.row_ids()[row].clone(),
                levels: Default::default(),
                leaf_code: None,
            }
            .taxonomy_string(),
        }
    }

    /// Write the sum table with separate lineage columns:
    /// `ID, Lv1..Lv5, <leaf code>, <samples...>`.
    pub fn write_pathway_sums<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path.as_ref())?;

        let mut header = vec![self.counts.row_label().to_string()];
        header.extend(Level::ALL.iter().map(|l| l.name().to_string()));
        header.push(LEAF_CODE_COLUMN.to_string());
        header.extend(self.counts.sample_ids().iter().cloned());
        writer.write_record(&header)?;

        for (row, id) in self.counts.row_ids().iter().enumerate() {
            let lineage = self.lineages[row].as_ref();
            let mut record = vec![id.clone()];
            for level in Level::ALL {
                record.push(
                    lineage
                        .and_then(|r| r.level(level))
                        .unwrap_or_default()
                        .to_string(),
                );
            }
            record.push(
                lineage
                    .and_then(|r| r.leaf_code.clone())
                    .unwrap_or_default(),
            );
            record.extend(self.counts.row(row).iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the converter input: comment line, then `#OTU ID`, samples and
    /// `taxonomy` last.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", OTU_COMMENT)?;
        write!(writer, "{}", OTU_ID_HEADER)?;
        for sample in self.counts.sample_ids() {
            write!(writer, "\t{}", sample)?;
        }
        writeln!(writer, "\t{}", TAXONOMY_HEADER)?;

        for (row, id) in self.counts.row_ids().iter().enumerate() {
            write!(writer, "{}", id)?;
            for value in self.counts.row(row) {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer, "\t{}", self.taxonomy(row))?;
        }

        writer.flush()?;
        debug!(
            "Wrote OTU table with {} IDs to {:?}",
            self.counts.n_rows(),
            path.as_ref()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeneCount, GeneCountTable};
    use crate::join::join_pathways;
    use crate::join::tests::pathway;
    use std::fs;
    use tempfile::NamedTempFile;

    fn create_test_tables() -> (GeneCountTable, PathwayTable) {
        let counts = GeneCountTable::new(vec![
            GeneCount::new("S2", "G1", 4.0),
            GeneCount::new("S1", "G1", 1.0),
            GeneCount::new("S1", "G2", 2.0),
            GeneCount::new("S1", "G1", 3.0),
        ]);
        let pathways = PathwayTable::new(vec![
            pathway("G1", ["A", "B", "C", "D", "E"], "X1"),
            pathway("G3", ["A", "B", "C", "D", "F"], "X3"),
        ]);
        (counts, pathways)
    }

    #[test]
    fn test_taxonomy_string() {
        let (counts, pathways) = create_test_tables();
        let (joined, _) = join_pathways(&counts, &pathways);
        let otu = build_otu_table(&joined, &pathways).unwrap();

        assert_eq!(otu.counts().row_ids(), &["G1", "G2"]);
        assert_eq!(otu.taxonomy(0), "A;B;C;D;E;X1");
        assert_eq!(otu.taxonomy(1), "nan;nan;nan;nan;nan;nan");
        assert_eq!(otu.counts().get(0, 0), 4.0);
    }

    #[test]
    fn test_otu_file_layout() {
        let (counts, pathways) = create_test_tables();
        let (joined, _) = join_pathways(&counts, &pathways);
        let otu = build_otu_table(&joined, &pathways).unwrap();

        let file = NamedTempFile::new().unwrap();
        otu.to_tsv(file.path()).unwrap();
        let text = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# Constructed from biom file");
        assert_eq!(lines[1], "#OTU ID\tS1\tS2\ttaxonomy");
        assert_eq!(lines[2], "G1\t4\t4\tA;B;C;D;E;X1");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_pathway_sums_layout() {
        let (counts, pathways) = create_test_tables();
        let (joined, _) = join_pathways(&counts, &pathways);
        let otu = build_otu_table(&joined, &pathways).unwrap();

        let file = NamedTempFile::new().unwrap();
        otu.write_pathway_sums(file.path()).unwrap();
        let text = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ID\tLv1\tLv2\tLv3\tLv4\tLv5\tPGPT_ID\tS1\tS2");
        assert_eq!(lines[1], "G1\tA\tB\tC\tD\tE\tX1\t4\t4");
        assert_eq!(lines[2], "G2\t\t\t\t\t\t\t2\t0");
    }

    #[test]
    fn test_lineage_count_must_match() {
        let (counts, pathways) = create_test_tables();
        let (joined, _) = join_pathways(&counts, &pathways);
        let otu = build_otu_table(&joined, &pathways).unwrap();
        assert!(OtuTable::new(otu.counts().clone(), vec![]).is_err());
    }
}
