//! Summary rollup: gene counts regrouped by an independent coarse classification.
//!
//! The rollup outer-joins the merged gene counts with a [`SummaryClassification`]
//! on ID, discards every row without a group label, normalizes the surviving
//! counts according to an explicit [`NormalizationPolicy`] and pivots the
//! normalized values into a group × sample matrix.

use crate::aggregate::pivot_sum;
use crate::data::{CountMatrix, GeneCountTable, SummaryClassification, SUMMARY_GROUP_COLUMN};
use crate::error::{ProfileError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Denominator used when converting rollup counts to percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationPolicy {
    /// Divide by the grand total of the whole rollup table.
    #[default]
    Global,
    /// Divide by the total of the row's own group.
    PerGroup,
}

impl std::fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::PerGroup => write!(f, "per-group"),
        }
    }
}

/// One classified row of the rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    /// `None` for classification entries never observed in a sample.
    pub sample_id: Option<String>,
    pub id: String,
    pub group_label: String,
    pub count: f64,
    pub normalized_count: f64,
}

/// Output of [`summary_rollup`].
#[derive(Debug, Clone)]
pub struct SummaryRollup {
    /// Classified rows in join order.
    pub records: Vec<SummaryRecord>,
    /// Group × sample matrix of normalized counts.
    pub matrix: CountMatrix,
    pub policy: NormalizationPolicy,
    /// Distinct gene-count IDs discarded for lacking a group label, sorted.
    pub unclassified: Vec<String>,
}

/// Build the summary rollup.
///
/// # Errors
/// Returns [`ProfileError::EmptyData`] when no row carries a group label and
/// [`ProfileError::Numerical`] when a denominator required by `policy` is zero.
pub fn summary_rollup(
    counts: &GeneCountTable,
    classes: &SummaryClassification,
    policy: NormalizationPolicy,
) -> Result<SummaryRollup> {
    let mut genes_by_id: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, row) in counts.rows().iter().enumerate() {
        if let (Some(id), Some(_)) = (row.key(), row.sample()) {
            genes_by_id.entry(id).or_default().push(idx);
        }
    }

    let keys: BTreeSet<&str> = genes_by_id
        .keys()
        .copied()
        .chain(classes.entries().iter().map(|c| c.id.as_str()))
        .collect();

    let mut records = Vec::new();
    let mut unclassified = Vec::new();
    for id in keys {
        let genes = genes_by_id.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let groups: Vec<&str> = classes
            .lookup(id)
            .filter_map(|c| c.group.as_deref())
            .collect();

        if groups.is_empty() {
            if !genes.is_empty() {
                unclassified.push(id.to_string());
            }
            continue;
        }

        for group in groups {
            if genes.is_empty() {
                records.push(SummaryRecord {
                    sample_id: None,
                    id: id.to_string(),
                    group_label: group.to_string(),
                    count: 0.0,
                    normalized_count: 0.0,
                });
            }
            for &idx in genes {
                let gene = &counts.rows()[idx];
                records.push(SummaryRecord {
                    sample_id: Some(gene.sample_id.clone()),
                    id: id.to_string(),
                    group_label: group.to_string(),
                    count: gene.count,
                    normalized_count: 0.0,
                });
            }
        }
    }

    if records.is_empty() {
        return Err(ProfileError::EmptyData(format!(
            "no gene counts carry a {} label",
            SUMMARY_GROUP_COLUMN
        )));
    }
    if !unclassified.is_empty() {
        warn!(
            "{} ID(s) have no {} label and are excluded from the summary",
            unclassified.len(),
            SUMMARY_GROUP_COLUMN
        );
    }

    normalize_records(&mut records, policy)?;

    let matrix = pivot_sum(
        SUMMARY_GROUP_COLUMN,
        records.iter().map(|r| {
            (
                Some(r.group_label.as_str()),
                r.sample_id.as_deref(),
                r.normalized_count,
            )
        }),
    )?;
    info!(
        "Summary rollup: {} groups x {} samples ({} normalization)",
        matrix.n_rows(),
        matrix.n_samples(),
        policy
    );

    Ok(SummaryRollup {
        records,
        matrix,
        policy,
        unclassified,
    })
}

fn normalize_records(records: &mut [SummaryRecord], policy: NormalizationPolicy) -> Result<()> {
    match policy {
        NormalizationPolicy::Global => {
            let total: f64 = records.iter().map(|r| r.count).sum();
            if total <= 0.0 {
                return Err(ProfileError::Numerical(
                    "summary table has zero total count".to_string(),
                ));
            }
            for record in records.iter_mut() {
                record.normalized_count = record.count / total * 100.0;
            }
        }
        NormalizationPolicy::PerGroup => {
            // Groups seen only in the classification never reach the matrix.
            let mut totals: BTreeMap<String, f64> = BTreeMap::new();
            for record in records.iter().filter(|r| r.sample_id.is_some()) {
                *totals.entry(record.group_label.clone()).or_insert(0.0) += record.count;
            }
            if let Some((group, _)) = totals.iter().find(|(_, &t)| t <= 0.0) {
                return Err(ProfileError::Numerical(format!(
                    "summary group '{}' has zero total count",
                    group
                )));
            }
            for record in records.iter_mut() {
                if let Some(total) = totals.get(&record.group_label) {
                    record.normalized_count = record.count / total * 100.0;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeneCount, SummaryClass};
    use approx::assert_relative_eq;

    fn create_test_inputs() -> (GeneCountTable, SummaryClassification) {
        let counts = GeneCountTable::new(vec![
            GeneCount::new("S1", "K1", 30.0),
            GeneCount::new("S2", "K1", 10.0),
            GeneCount::new("S1", "K2", 10.0),
            GeneCount::new("S2", "K3", 50.0),
            GeneCount::new("S1", "K4", 1000.0),
        ]);
        let class = |id: &str, group: Option<&str>| SummaryClass {
            id: id.into(),
            group: group.map(String::from),
        };
        let classes = SummaryClassification::new(vec![
            class("K1", Some("NUTRIENT")),
            class("K2", Some("NUTRIENT")),
            class("K3", Some("STRESS")),
            class("K4", None),
            class("K8", Some("COLONIZATION")),
        ]);
        (counts, classes)
    }

    #[test]
    fn test_global_policy() {
        let (counts, classes) = create_test_inputs();
        let rollup = summary_rollup(&counts, &classes, NormalizationPolicy::Global).unwrap();

        assert_eq!(rollup.unclassified, vec!["K4".to_string()]);
        assert_relative_eq!(rollup.matrix.grand_total(), 100.0, epsilon = 1e-9);
        assert_eq!(rollup.matrix.row_label(), "LV_SUM");
        assert_eq!(rollup.matrix.row_ids(), &["NUTRIENT", "STRESS"]);
        assert_eq!(rollup.matrix.sample_ids(), &["S1", "S2"]);
        assert_relative_eq!(rollup.matrix.get(0, 0), 40.0, epsilon = 1e-9);
        assert_relative_eq!(rollup.matrix.get(1, 1), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_per_group_policy() {
        let (counts, classes) = create_test_inputs();
        let rollup = summary_rollup(&counts, &classes, NormalizationPolicy::PerGroup).unwrap();

        let sums = rollup.matrix.row_sums();
        assert_relative_eq!(sums[0], 100.0, epsilon = 1e-9);
        assert_relative_eq!(sums[1], 100.0, epsilon = 1e-9);
        assert_relative_eq!(rollup.matrix.get(0, 0), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_class_only_rows_do_not_reach_matrix() {
        let (counts, classes) = create_test_inputs();
        let rollup = summary_rollup(&counts, &classes, NormalizationPolicy::Global).unwrap();

        let k8 = rollup.records.iter().find(|r| r.id == "K8").unwrap();
        assert!(k8.sample_id.is_none());
        assert!(rollup.matrix.row_index("COLONIZATION").is_none());
    }

    #[test]
    fn test_blank_sample_is_not_counted() {
        let (counts, classes) = create_test_inputs();
        let mut rows = counts.into_rows();
        rows.push(GeneCount::new("", "K3", 400.0));
        let counts = GeneCountTable::new(rows);

        let rollup = summary_rollup(&counts, &classes, NormalizationPolicy::Global).unwrap();
        assert_eq!(rollup.matrix.sample_ids(), &["S1", "S2"]);
        assert_relative_eq!(rollup.matrix.grand_total(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(rollup.matrix.get(1, 1), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_labels_is_empty_data() {
        let counts = GeneCountTable::new(vec![GeneCount::new("S1", "K1", 1.0)]);
        let classes = SummaryClassification::new(vec![]);
        assert!(matches!(
            summary_rollup(&counts, &classes, NormalizationPolicy::Global),
            Err(ProfileError::EmptyData(_))
        ));
    }

    #[test]
    fn test_zero_group_total_is_numerical_error() {
        let counts = GeneCountTable::new(vec![
            GeneCount::new("S1", "K1", 5.0),
            GeneCount::new("S1", "K2", 0.0),
        ]);
        let classes = SummaryClassification::new(vec![
            SummaryClass {
                id: "K1".into(),
                group: Some("A".into()),
            },
            SummaryClass {
                id: "K2".into(),
                group: Some("B".into()),
            },
        ]);

        assert!(summary_rollup(&counts, &classes, NormalizationPolicy::Global).is_ok());
        assert!(matches!(
            summary_rollup(&counts, &classes, NormalizationPolicy::PerGroup),
            Err(ProfileError::Numerical(_))
        ));
    }
}
