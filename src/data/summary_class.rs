//! Independent coarse classification used by the summary rollup.

use super::pathway::ID_COLUMN;
use crate::error::{ProfileError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Column holding the summary group label.
pub const SUMMARY_GROUP_COLUMN: &str = "LV_SUM";

/// One ID → group assignment; `group` is `None` for an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryClass {
    pub id: String,
    pub group: Option<String>,
}

/// The summary classification table, indexed by ID.
#[derive(Debug, Clone, Default)]
pub struct SummaryClassification {
    entries: Vec<SummaryClass>,
    by_id: HashMap<String, Vec<usize>>,
}

impl SummaryClassification {
    pub fn new(entries: Vec<SummaryClass>) -> Self {
        let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_id.entry(entry.id.clone()).or_default().push(idx);
        }
        Self { entries, by_id }
    }

    /// Load a tab-separated table with columns `ID` and [`SUMMARY_GROUP_COLUMN`].
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let [id_col, group_col] =
            super::header_columns(&headers, &[ID_COLUMN, SUMMARY_GROUP_COLUMN], path)?;

        let mut entries = Vec::new();
        for result in reader.records() {
            let (record, line) = super::checked_record(result?, &headers, path)?;
            let Some(id) = super::non_empty(&record[id_col]) else {
                return Err(ProfileError::parse(path, line, "empty ID"));
            };
            entries.push(SummaryClass {
                id,
                group: super::non_empty(&record[group_col]),
            });
        }

        Ok(Self::new(entries))
    }

    /// All entries matching `id`, in table order.
    pub fn lookup(&self, id: &str) -> impl Iterator<Item = &SummaryClass> + '_ {
        self.by_id
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.entries[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn entries(&self) -> &[SummaryClass] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
