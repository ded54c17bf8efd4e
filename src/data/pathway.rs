//! Static hierarchical pathway taxonomy (Lv1..Lv5 plus leaf code).

use crate::error::{ProfileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Column holding the finest-grain trait identifier in the pathway table.
pub const LEAF_CODE_COLUMN: &str = "PGPT_ID";

/// Column holding the accession / gene family identifier.
pub(crate) const ID_COLUMN: &str = "ID";

/// Placeholder for a missing pathway field in rendered taxonomy strings.
pub(crate) const MISSING_FIELD: &str = "nan";

/// Pathway hierarchy level, coarsest (`Lv1`) to finest (`Lv5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Lv1,
    Lv2,
    Lv3,
    Lv4,
    Lv5,
}

impl Level {
    /// All levels, coarsest first.
    pub const ALL: [Level; 5] = [Level::Lv1, Level::Lv2, Level::Lv3, Level::Lv4, Level::Lv5];

    /// Column name in the pathway table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lv1 => "Lv1",
            Self::Lv2 => "Lv2",
            Self::Lv3 => "Lv3",
            Self::Lv4 => "Lv4",
            Self::Lv5 => "Lv5",
        }
    }

    /// Zero-based depth.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        Level::ALL
            .iter()
            .copied()
            .find(|l| l.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProfileError::InvalidParameter(format!("Unknown pathway level '{}'", s)))
    }
}

/// One row of the pathway table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayRecord {
    pub id: String,
    /// Level labels indexed by [`Level::index`]; `None` for empty cells.
    pub levels: [Option<String>; 5],
    pub leaf_code: Option<String>,
}

impl PathwayRecord {
    /// Label at `level`, if present.
    pub fn level(&self, level: Level) -> Option<&str> {
        self.levels[level.index()].as_deref()
    }

    /// `Lv1;Lv2;Lv3;Lv4;Lv5;leaf_code`, with `nan` for missing fields.
    pub fn taxonomy_string(&self) -> String {
        self.levels
            .iter()
            .chain(std::iter::once(&self.leaf_code))
            .map(|field| field.as_deref().unwrap_or(MISSING_FIELD))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// The pathway table, indexed by ID.
#[derive(Debug, Clone, Default)]
pub struct PathwayTable {
    records: Vec<PathwayRecord>,
    by_id: HashMap<String, Vec<usize>>,
}

impl PathwayTable {
    pub fn new(records: Vec<PathwayRecord>) -> Self {
        let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_id.entry(record.id.clone()).or_default().push(idx);
        }
        Self { records, by_id }
    }

    /// Load a tab-separated pathway table with columns `ID`, `Lv1`..`Lv5` and
    /// [`LEAF_CODE_COLUMN`]. Other columns are ignored; column order is free.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let [id_col, lv1, lv2, lv3, lv4, lv5, leaf_col] = super::header_columns(
            &headers,
            &[ID_COLUMN, "Lv1", "Lv2", "Lv3", "Lv4", "Lv5", LEAF_CODE_COLUMN],
            path,
        )?;
        let level_cols = [lv1, lv2, lv3, lv4, lv5];

        let mut records = Vec::new();
        for result in reader.records() {
            let (record, line) = super::checked_record(result?, &headers, path)?;
            let Some(id) = super::non_empty(&record[id_col]) else {
                return Err(ProfileError::parse(path, line, "empty ID"));
            };
            records.push(PathwayRecord {
                id,
                levels: level_cols.map(|c| super::non_empty(&record[c])),
                leaf_code: super::non_empty(&record[leaf_col]),
            });
        }

        Ok(Self::new(records))
    }

    /// All records matching `id`, in table order.
    pub fn lookup(&self, id: &str) -> impl Iterator<Item = &PathwayRecord> + '_ {
        self.by_id
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }

    /// First record matching `id`.
    pub fn get(&self, id: &str) -> Option<&PathwayRecord> {
        self.lookup(id).next()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn records(&self) -> &[PathwayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
