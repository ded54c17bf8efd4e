//! Hierarchical aggregation: pivoting the joined table into count matrices.

use crate::data::{CountMatrix, Level};
use crate::error::Result;
use crate::join::JoinedTable;
use std::collections::{BTreeSet, HashMap};

/// Row-label header of the ID × sample matrix.
pub const ID_ROW_LABEL: &str = "ID";

/// Sum `(row, sample, value)` entries into a dense matrix.
///
/// Entries with no row label or no sample are dropped: a pivot cannot place
/// them. Rows keep the order in which each label first appears among the
/// kept entries; sample columns are sorted. Unobserved cells are zero.
pub fn pivot_sum<'a, I>(row_label: &str, entries: I) -> Result<CountMatrix>
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>, f64)>,
{
    let kept: Vec<(&str, &str, f64)> = entries
        .into_iter()
        .filter_map(|(row, sample, value)| Some((row?, sample?, value)))
        .collect();

    let mut row_ids: Vec<String> = Vec::new();
    let mut row_index: HashMap<&str, usize> = HashMap::new();
    for &(row, _, _) in &kept {
        row_index.entry(row).or_insert_with(|| {
            row_ids.push(row.to_string());
            row_ids.len() - 1
        });
    }

    let samples: BTreeSet<&str> = kept.iter().map(|&(_, sample, _)| sample).collect();
    let sample_index: HashMap<&str, usize> = samples
        .iter()
        .enumerate()
        .map(|(idx, &sample)| (sample, idx))
        .collect();
    let sample_ids: Vec<String> = samples.into_iter().map(String::from).collect();

    let triplets = kept
        .iter()
        .map(|&(row, sample, value)| (row_index[row], sample_index[sample], value));

    CountMatrix::from_triplets(row_label, row_ids, sample_ids, triplets)
}

/// Level-label × sample matrix of summed counts.
pub fn aggregate_level(table: &JoinedTable<'_>, level: Level) -> Result<CountMatrix> {
    pivot_sum(
        level.name(),
        table
            .rows()
            .iter()
            .map(|r| (r.level(level), r.sample(), r.count())),
    )
}

/// ID × sample matrix of summed counts, IDs in table order.
pub fn aggregate_ids(table: &JoinedTable<'_>) -> Result<CountMatrix> {
    pivot_sum(
        ID_ROW_LABEL,
        table
            .rows()
            .iter()
            .map(|r| (r.key(), r.sample(), r.count())),
    )
}
