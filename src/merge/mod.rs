//! Annotation merging: search hits joined with per-sample abundances.
//!
//! The merger turns a collected hit table and a set of per-sample abundance
//! files into the long `(Sample, ID, Count)` table every later stage reads.
//!
//! - **annotations**: the hit × abundance join and its output contract
//! - **collect**: concatenation of raw per-sample search outputs

mod annotations;
mod collect;

pub use annotations::{merge_annotations, write_gene_counts, MergeOutcome, OutputMode};
pub use collect::collect_hits;
