//! Plant-Growth-Promotion Gene (PGPG) Profiling Library
//!
//! This library turns per-sample gene annotations into functional profiles
//! over the hierarchical PGPT pathway classification.
//!
//! # Overview
//!
//! The library is organized into composable modules, leaves first:
//!
//! - **data**: Core data structures (abundances, hits, pathways, CountMatrix)
//! - **merge**: Annotation merging (hits × abundances → gene counts)
//! - **join**: Outer join of gene counts with the pathway table
//! - **aggregate**: Pivoting the joined table into level × sample matrices
//! - **normalize**: Matrix-global percent normalization
//! - **facet**: Per-category breakdown within a coarse level
//! - **summary**: Rollup over an independent coarse classification
//! - **export**: OTU table writing and BIOM conversion
//! - **render**: Heatmap rendering
//! - **pipeline**: Configuration, output layout and execution
//!
//! # Example
//!
//! ```no_run
//! use pgpg_profile::prelude::*;
//!
//! // Load data
//! let counts = GeneCountTable::from_tsv("gene_counts.txt").unwrap();
//! let pathways = PathwayTable::from_tsv("pathways.tsv").unwrap();
//!
//! // Run the profiling pipeline
//! let report = Pipeline::new()
//!     .summary_policy(NormalizationPolicy::Global)
//!     .without_converter()
//!     .run(counts, &pathways, None, "results")
//!     .unwrap();
//! ```

pub mod aggregate;
pub mod data;
pub mod error;
pub mod export;
pub mod facet;
pub mod join;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod summary;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aggregate::{aggregate_ids, aggregate_level, pivot_sum};
    pub use crate::data::{
        AbundanceTable, AnnotationHit, AnnotationHits, CountMatrix, GeneCount, GeneCountTable,
        Level, PathwayRecord, PathwayTable, SummaryClass, SummaryClassification,
    };
    pub use crate::error::{ProfileError, Result};
    pub use crate::export::{build_otu_table, BiomConvert, OtuTable, TableConverter};
    pub use crate::facet::{facet_breakdown, FacetOutcome};
    pub use crate::join::{join_pathways, JoinReport, JoinedRow, JoinedTable};
    pub use crate::merge::{collect_hits, merge_annotations, write_gene_counts, MergeOutcome, OutputMode};
    pub use crate::normalize::{norm_global, norm_percent};
    pub use crate::pipeline::{OutputLayout, Pipeline, PipelineConfig, RunReport};
    pub use crate::render::{HeatmapStyle, MatrixRenderer, Palette, SvgHeatmap};
    pub use crate::summary::{summary_rollup, NormalizationPolicy, SummaryRollup};
}
