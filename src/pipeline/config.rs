//! Serializable run configuration.

use crate::data::Level;
use crate::error::{ProfileError, Result};
use crate::export::BiomConvert;
use crate::render::HeatmapStyle;
use crate::summary::NormalizationPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// External converter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Program name or path; `biom` by default.
    pub program: String,
    /// Arguments appended after the fixed conversion flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "biom".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    pub fn build(&self) -> BiomConvert {
        BiomConvert::new(self.program.clone()).with_extra_args(self.extra_args.clone())
    }
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Levels pivoted into per-level tables, processed in this order.
    pub levels: Vec<Level>,
    /// Levels that also get a whole-table heatmap.
    pub global_heatmap_levels: Vec<Level>,
    /// Coarse level whose values define facets.
    pub facet_level: Level,
    pub summary_policy: NormalizationPolicy,
    /// Cut gene-count IDs at the first `_` before joining.
    pub strip_id_suffix: bool,
    /// Style of level and facet heatmaps.
    pub heatmap: HeatmapStyle,
    /// Style of the summary heatmap.
    pub summary_heatmap: HeatmapStyle,
    /// `None` writes the OTU table without converting it.
    pub converter: Option<ConverterConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pgpg-profile".to_string(),
            description: None,
            levels: vec![Level::Lv5, Level::Lv4, Level::Lv3],
            global_heatmap_levels: vec![Level::Lv4, Level::Lv3],
            facet_level: Level::Lv2,
            summary_policy: NormalizationPolicy::Global,
            strip_id_suffix: true,
            heatmap: HeatmapStyle::default(),
            summary_heatmap: HeatmapStyle::annotated(),
            converter: Some(ConverterConfig::default()),
        }
    }
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(ProfileError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Reject configurations the runner cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(ProfileError::InvalidParameter(
                "at least one level must be configured".to_string(),
            ));
        }
        if let Some(level) = self
            .global_heatmap_levels
            .iter()
            .find(|l| !self.levels.contains(l))
        {
            return Err(ProfileError::InvalidParameter(format!(
                "heatmap level {} is not among the processed levels",
                level
            )));
        }
        if self.levels.contains(&self.facet_level) {
            return Err(ProfileError::InvalidParameter(format!(
                "facet level {} cannot also be a pivot level",
                self.facet_level
            )));
        }
        if self.heatmap.font_size == 0 || self.summary_heatmap.font_size == 0 {
            return Err(ProfileError::InvalidParameter(
                "font size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
