//! Full outer join of gene counts against the pathway table.

use crate::data::{GeneCount, GeneCountTable, Level, PathwayRecord, PathwayTable};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One row of the joined table.
///
/// Either side may be absent: a gene count whose ID has no pathway record
/// keeps `pathway == None`, a pathway record never observed in any sample
/// keeps `gene == None`.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub id: &'a str,
    pub gene: Option<&'a GeneCount>,
    pub pathway: Option<&'a PathwayRecord>,
}

impl<'a> JoinedRow<'a> {
    /// Sample of the gene count; `None` for pathway-only rows and blank samples.
    pub fn sample(&self) -> Option<&'a str> {
        self.gene.and_then(GeneCount::sample)
    }

    /// Join key; `None` when blank.
    pub fn key(&self) -> Option<&'a str> {
        Some(self.id).filter(|id| !id.trim().is_empty())
    }

    /// Count of the gene side; `0.0` for pathway-only rows.
    pub fn count(&self) -> f64 {
        self.gene.map(|g| g.count).unwrap_or(0.0)
    }

    /// Pathway label at `level`, if the row has one.
    pub fn level(&self, level: Level) -> Option<&'a str> {
        self.pathway.and_then(|p| p.level(level))
    }
}

/// How many rows matched on each side of the join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    /// Rows carrying both a gene count and a pathway record.
    pub matched_rows: usize,
    /// Distinct gene-count IDs with no pathway record, sorted.
    pub unmatched_ids: Vec<String>,
    /// Pathway records never observed in the gene counts.
    pub pathway_only: usize,
}

/// The joined table, ordered by ID.
#[derive(Debug, Clone, Default)]
pub struct JoinedTable<'a> {
    rows: Vec<JoinedRow<'a>>,
}

impl<'a> JoinedTable<'a> {
    pub fn new(rows: Vec<JoinedRow<'a>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[JoinedRow<'a>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose label at `level` equals `value`.
    pub fn filter_level(&self, level: Level, value: &str) -> JoinedTable<'a> {
        self.rows
            .iter()
            .filter(|r| r.level(level) == Some(value))
            .copied()
            .collect()
    }

    /// Distinct labels at `level`, in order of first appearance.
    pub fn distinct_levels(&self, level: Level) -> Vec<&'a str> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.level(level))
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

impl<'a> FromIterator<JoinedRow<'a>> for JoinedTable<'a> {
    fn from_iter<I: IntoIterator<Item = JoinedRow<'a>>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Full outer join of `counts` and `pathways` on ID.
///
/// Keys are emitted in ascending lexicographic order. Within a key, every
/// gene-count row is paired with every pathway record for that ID, gene rows
/// in table order. Keys present on one side only produce a half-empty row.
/// Nothing is dropped here; the pivot step discards rows lacking a label.
pub fn join_pathways<'a>(
    counts: &'a GeneCountTable,
    pathways: &'a PathwayTable,
) -> (JoinedTable<'a>, JoinReport) {
    let mut genes_by_id: HashMap<&str, Vec<&GeneCount>> = HashMap::new();
    for row in counts.rows() {
        genes_by_id.entry(row.id.as_str()).or_default().push(row);
    }

    let keys: BTreeSet<&str> = genes_by_id
        .keys()
        .copied()
        .chain(pathways.records().iter().map(|r| r.id.as_str()))
        .collect();

    let mut rows = Vec::new();
    let mut report = JoinReport::default();
    for id in keys {
        let genes = genes_by_id.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let records: Vec<&PathwayRecord> = pathways.lookup(id).collect();

        match (genes.is_empty(), records.is_empty()) {
            (false, false) => {
                for &gene in genes {
                    for &record in &records {
                        rows.push(JoinedRow {
                            id,
                            gene: Some(gene),
                            pathway: Some(record),
                        });
                        report.matched_rows += 1;
                    }
                }
            }
            (false, true) => {
                report.unmatched_ids.push(id.to_string());
                rows.extend(genes.iter().map(|&gene| JoinedRow {
                    id,
                    gene: Some(gene),
                    pathway: None,
                }));
            }
            (true, _) => {
                report.pathway_only += records.len();
                rows.extend(records.iter().map(|&record| JoinedRow {
                    id,
                    gene: None,
                    pathway: Some(record),
                }));
            }
        }
    }

    info!(
        "Joined {} gene-count rows against {} pathway records ({} matched)",
        counts.len(),
        pathways.len(),
        report.matched_rows
    );
    if !report.unmatched_ids.is_empty() {
        warn!(
            "{} ID(s) have no pathway record and are excluded from level tables",
            report.unmatched_ids.len()
        );
    }

    (JoinedTable::new(rows), report)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn pathway(id: &str, levels: [&str; 5], leaf: &str) -> PathwayRecord {
        PathwayRecord {
            id: id.into(),
            levels: levels.map(|l| Some(l.to_string())),
            leaf_code: Some(leaf.into()),
        }
    }

    fn fixture() -> (GeneCountTable, PathwayTable) {
        let counts = GeneCountTable::new(vec![
            GeneCount::new("S1", "K2", 4.0),
            GeneCount::new("S1", "K1", 1.0),
            GeneCount::new("S2", "K2", 2.0),
            GeneCount::new("S2", "K9", 7.0),
        ]);
        let pathways = PathwayTable::new(vec![
            pathway("K1", ["A", "B", "C", "D", "E"], "X1"),
            pathway("K2", ["A", "B", "F", "G", "H"], "X2"),
            pathway("K3", ["A", "Z", "C", "D", "E"], "X3"),
        ]);
        (counts, pathways)
    }

    #[test]
    fn test_outer_join_sorted_by_id() {
        let (counts, pathways) = fixture();
        let (joined, _) = join_pathways(&counts, &pathways);

        let ids: Vec<&str> = joined.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["K1", "K2", "K2", "K3", "K9"]);
        assert_eq!(joined.rows()[1].sample(), Some("S1"));
        assert_eq!(joined.rows()[2].sample(), Some("S2"));
    }

    #[test]
    fn test_join_report_distinguishes_unmatched() {
        let (counts, pathways) = fixture();
        let (joined, report) = join_pathways(&counts, &pathways);

        assert_eq!(report.matched_rows, 3);
        assert_eq!(report.unmatched_ids, vec!["K9".to_string()]);
        assert_eq!(report.pathway_only, 1);

        let k3 = joined.rows().iter().find(|r| r.id == "K3").unwrap();
        assert!(k3.gene.is_none());
        assert_eq!(k3.count(), 0.0);
        let k9 = joined.rows().iter().find(|r| r.id == "K9").unwrap();
        assert!(k9.level(Level::Lv1).is_none());
    }

    #[test]
    fn test_filter_and_distinct_levels() {
        let (counts, pathways) = fixture();
        let (joined, _) = join_pathways(&counts, &pathways);

        assert_eq!(joined.distinct_levels(Level::Lv2), vec!["B", "Z"]);
        assert_eq!(joined.distinct_levels(Level::Lv3), vec!["C", "F"]);

        let facet = joined.filter_level(Level::Lv2, "B");
        assert_eq!(facet.len(), 3);
        assert!(facet.rows().iter().all(|r| r.level(Level::Lv2) == Some("B")));
    }
}
