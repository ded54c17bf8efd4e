//! Output directory layout of a run.

use crate::data::Level;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

const NORMALIZED: &str = "normalized";
const NON_NORMALIZED: &str = "non-normalized";
const SUMMARY: &str = "summary";

/// Paths of every file a run writes, rooted at one output directory.
///
/// ```text
/// <out>/tables/{normalized,non-normalized,summary}/
/// <out>/figures/{normalized,non-normalized,summary}/
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`; nothing is created.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create every directory of the layout.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let layout = Self::new(root);
        for dir in [
            layout.tables_dir(NORMALIZED),
            layout.tables_dir(NON_NORMALIZED),
            layout.tables_dir(SUMMARY),
            layout.figures_dir(NORMALIZED),
            layout.figures_dir(NON_NORMALIZED),
            layout.figures_dir(SUMMARY),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tables(&self) -> PathBuf {
        self.root.join("tables")
    }

    pub fn figures(&self) -> PathBuf {
        self.root.join("figures")
    }

    fn tables_dir(&self, kind: &str) -> PathBuf {
        self.tables().join(kind)
    }

    fn figures_dir(&self, kind: &str) -> PathBuf {
        self.figures().join(kind)
    }

    fn kind(normalized: bool) -> &'static str {
        if normalized {
            NORMALIZED
        } else {
            NON_NORMALIZED
        }
    }

    pub fn level_table(&self, level: Level, normalized: bool) -> PathBuf {
        let name = if normalized {
            format!("normalized_gene_counts_{}.txt", level)
        } else {
            format!("gene_counts_{}.txt", level)
        };
        self.tables_dir(Self::kind(normalized)).join(name)
    }

    pub fn level_heatmap(&self, level: Level, normalized: bool) -> PathBuf {
        self.figures_dir(Self::kind(normalized))
            .join(format!("{}_heatmap.svg", level))
    }

    pub fn facet_heatmap(&self, level: Level, value: &str, normalized: bool) -> PathBuf {
        self.figures_dir(Self::kind(normalized)).join(format!(
            "{}_heatmap_facet_{}.svg",
            level,
            file_component(value)
        ))
    }

    pub fn summary_table(&self) -> PathBuf {
        self.tables_dir(SUMMARY).join("normalized_summary_table.txt")
    }

    pub fn summary_heatmap(&self) -> PathBuf {
        self.figures_dir(SUMMARY).join("normalized_summary_heatmap.svg")
    }

    pub fn pathway_sums(&self) -> PathBuf {
        self.tables().join("gene_counts_sum_with_pathways.txt")
    }

    pub fn otu_table(&self) -> PathBuf {
        self.tables().join("gene_counts_sum_with_combined_pathways.txt")
    }

    pub fn biom(&self) -> PathBuf {
        self.tables().join("table.json.biom")
    }
}

/// Make a category label safe to embed in a file name.
///
/// Path separators, `:` and NUL are percent-escaped, as is `%` itself, so
/// distinct labels always map to distinct file names.
pub(crate) fn file_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' | '/' | '\\' | ':' | '\0' => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
