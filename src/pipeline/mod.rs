//! Pipeline configuration, output layout and execution.

mod config;
mod layout;
mod runner;

pub use config::{ConverterConfig, PipelineConfig};
pub use layout::OutputLayout;
pub use runner::{ExportReport, FacetReport, LevelReport, Pipeline, RunReport, SummaryReport};
