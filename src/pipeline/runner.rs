//! Pipeline runner: join, per-level tables and heatmaps, facets, summary
//! rollup and export, in that order.

use super::config::PipelineConfig;
use super::layout::OutputLayout;
use crate::aggregate::aggregate_level;
use crate::data::{CountMatrix, GeneCountTable, Level, PathwayTable, SummaryClassification};
use crate::error::{ProfileError, Result};
use crate::export::{build_otu_table, TableConverter};
use crate::facet::{facet_breakdown, FacetOutcome};
use crate::join::{join_pathways, JoinReport, JoinedTable};
use crate::normalize::norm_percent;
use crate::render::{MatrixRenderer, SvgHeatmap};
use crate::summary::{summary_rollup, NormalizationPolicy};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const SUMMARY_TITLE: &str = "Normalized Summary Heatmap";

/// Stage of a run, used to give failures context.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Level(Level),
    Facets(Level),
    Summary,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Level(level) => write!(f, "{} tables", level),
            Stage::Facets(level) => write!(f, "{} facets", level),
            Stage::Summary => write!(f, "summary rollup"),
            Stage::Export => write!(f, "OTU export"),
        }
    }
}

impl Stage {
    /// Attach stage context to I/O and rendering failures.
    ///
    /// Data errors and converter failures keep their own variant so callers
    /// can match on them; the stage is logged instead.
    fn wrap<T>(self, result: Result<T>) -> Result<T> {
        result.map_err(|e| match e {
            e @ (ProfileError::ExportFailed { .. }
            | ProfileError::EmptyData(_)
            | ProfileError::Numerical(_)
            | ProfileError::DimensionMismatch { .. }
            | ProfileError::InvalidParameter(_)) => {
                error!("{} failed: {}", self, e);
                e
            }
            e => ProfileError::Pipeline(format!("{} failed: {}", self, e)),
        })
    }
}

fn title(normalized: bool, level: Level) -> String {
    format!(
        "{} gene counts by sample and {}",
        if normalized { "Normalized" } else { "Non-normalized" },
        level
    )
}

/// What was written for one pivot level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReport {
    pub level: Level,
    pub rows: usize,
    pub samples: usize,
    pub table: Option<PathBuf>,
    pub normalized_table: Option<PathBuf>,
    pub heatmaps: Vec<PathBuf>,
    /// Set when the level produced nothing to write.
    pub skipped: Option<String>,
}

/// One facet of one level, normalized or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetReport {
    pub level: Level,
    pub value: String,
    pub normalized: bool,
    pub heatmap: Option<PathBuf>,
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub policy: NormalizationPolicy,
    pub groups: usize,
    pub samples: usize,
    pub unclassified_ids: usize,
    pub table: PathBuf,
    pub heatmap: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub ids: usize,
    pub pathway_sums: PathBuf,
    pub otu_table: PathBuf,
    /// `None` when no converter is configured.
    pub biom: Option<PathBuf>,
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub output_dir: PathBuf,
    pub gene_count_rows: usize,
    pub join: JoinReport,
    pub levels: Vec<LevelReport>,
    pub facets: Vec<FacetReport>,
    pub summary: Option<SummaryReport>,
    pub export: ExportReport,
}

impl RunReport {
    pub fn facets_rendered(&self) -> usize {
        self.facets.iter().filter(|f| f.heatmap.is_some()).count()
    }

    pub fn facets_skipped(&self) -> usize {
        self.facets.iter().filter(|f| f.skipped.is_some()).count()
    }
}

/// Builder for configuring and running the profiling pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    renderer: Box<dyn MatrixRenderer>,
    summary_renderer: Box<dyn MatrixRenderer>,
    converter: Option<Box<dyn TableConverter>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pipeline with the default configuration.
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    /// Create from a config, with SVG renderers and the configured converter.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            renderer: Box::new(SvgHeatmap::new(config.heatmap.clone())),
            summary_renderer: Box::new(SvgHeatmap::new(config.summary_heatmap.clone())),
            converter: config
                .converter
                .as_ref()
                .map(|c| Box::new(c.build()) as Box<dyn TableConverter>),
            config: config.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    pub fn summary_policy(mut self, policy: NormalizationPolicy) -> Self {
        self.config.summary_policy = policy;
        self
    }

    /// Renderer for level and facet heatmaps.
    pub fn renderer<R: MatrixRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Renderer for the summary heatmap.
    pub fn summary_renderer<R: MatrixRenderer + 'static>(mut self, renderer: R) -> Self {
        self.summary_renderer = Box::new(renderer);
        self
    }

    pub fn converter<C: TableConverter + 'static>(mut self, converter: C) -> Self {
        self.converter = Some(Box::new(converter));
        self
    }

    /// Write the OTU table but skip conversion.
    pub fn without_converter(mut self) -> Self {
        self.converter = None;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage and write all outputs below `out_dir`.
    ///
    /// The summary rollup only runs when `classes` is given.
    pub fn run<P: AsRef<Path>>(
        &self,
        counts: GeneCountTable,
        pathways: &PathwayTable,
        classes: Option<&SummaryClassification>,
        out_dir: P,
    ) -> Result<RunReport> {
        self.config.validate()?;
        if counts.is_empty() {
            return Err(ProfileError::EmptyData("gene-count table has no rows".to_string()));
        }

        let counts = if self.config.strip_id_suffix {
            counts.strip_id_suffixes()
        } else {
            counts
        };
        let layout = OutputLayout::create(out_dir.as_ref())?;
        let (joined, join) = join_pathways(&counts, pathways);

        let mut levels = Vec::new();
        let mut facets = Vec::new();
        for &level in &self.config.levels {
            levels.push(Stage::Level(level).wrap(self.write_level(&joined, level, &layout))?);
            for normalized in [true, false] {
                facets.extend(
                    Stage::Facets(level).wrap(self.write_facets(&joined, level, normalized, &layout))?,
                );
            }
        }

        let summary = match classes {
            Some(classes) => Some(Stage::Summary.wrap(self.write_summary(&counts, classes, &layout))?),
            None => {
                info!("No summary classification given; skipping summary rollup");
                None
            }
        };

        let export = Stage::Export.wrap(self.write_export(&joined, pathways, &layout))?;

        Ok(RunReport {
            name: self.config.name.clone(),
            output_dir: layout.root().to_path_buf(),
            gene_count_rows: counts.len(),
            join,
            levels,
            facets,
            summary,
            export,
        })
    }

    fn write_level(
        &self,
        joined: &JoinedTable<'_>,
        level: Level,
        layout: &OutputLayout,
    ) -> Result<LevelReport> {
        let counts = aggregate_level(joined, level)?;
        let mut report = LevelReport {
            level,
            rows: counts.n_rows(),
            samples: counts.n_samples(),
            table: None,
            normalized_table: None,
            heatmaps: Vec::new(),
            skipped: None,
        };
        if counts.is_empty() {
            let reason = format!("No data for {}", level);
            warn!("{}. Skipping tables.", reason);
            report.skipped = Some(reason);
            return Ok(report);
        }

        let table = layout.level_table(level, false);
        counts.to_tsv(&table)?;
        report.table = Some(table);

        let normalized = match norm_percent(&counts) {
            Ok(m) => Some(m),
            Err(ProfileError::Numerical(msg)) => {
                warn!("{}: {}. Skipping normalized outputs.", level, msg);
                report.skipped = Some(msg);
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(normalized) = &normalized {
            let table = layout.level_table(level, true);
            normalized.to_tsv(&table)?;
            report.normalized_table = Some(table);
        }
        info!(
            "{}: {} categories x {} samples",
            level,
            counts.n_rows(),
            counts.n_samples()
        );

        if self.config.global_heatmap_levels.contains(&level) {
            let mut views: Vec<(&CountMatrix, bool)> = vec![(&counts, false)];
            if let Some(normalized) = &normalized {
                views.push((normalized, true));
            }
            for (matrix, is_normalized) in views {
                let path = layout.level_heatmap(level, is_normalized);
                self.renderer
                    .render(matrix, &path, &title(is_normalized, level))?;
                report.heatmaps.push(path);
            }
        }

        Ok(report)
    }

    fn write_facets(
        &self,
        joined: &JoinedTable<'_>,
        level: Level,
        normalized: bool,
        layout: &OutputLayout,
    ) -> Result<Vec<FacetReport>> {
        let facet_level = self.config.facet_level;
        let outcomes = facet_breakdown(joined, facet_level, level, normalized)?;

        let mut reports = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let report = match outcome {
                FacetOutcome::Built { value, matrix } => {
                    let path = layout.facet_heatmap(level, &value, normalized);
                    let title = format!(
                        "{} with {}={}",
                        title(normalized, level),
                        facet_level,
                        value
                    );
                    self.renderer.render(&matrix, &path, &title)?;
                    FacetReport {
                        level,
                        value,
                        normalized,
                        heatmap: Some(path),
                        skipped: None,
                    }
                }
                FacetOutcome::Skipped { value, reason } => FacetReport {
                    level,
                    value,
                    normalized,
                    heatmap: None,
                    skipped: Some(reason),
                },
            };
            reports.push(report);
        }
        Ok(reports)
    }

    fn write_summary(
        &self,
        counts: &GeneCountTable,
        classes: &SummaryClassification,
        layout: &OutputLayout,
    ) -> Result<SummaryReport> {
        let rollup = summary_rollup(counts, classes, self.config.summary_policy)?;

        let table = layout.summary_table();
        rollup.matrix.to_tsv(&table)?;
        let heatmap = layout.summary_heatmap();
        self.summary_renderer
            .render(&rollup.matrix, &heatmap, SUMMARY_TITLE)?;

        Ok(SummaryReport {
            policy: rollup.policy,
            groups: rollup.matrix.n_rows(),
            samples: rollup.matrix.n_samples(),
            unclassified_ids: rollup.unclassified.len(),
            table,
            heatmap,
        })
    }

    fn write_export(
        &self,
        joined: &JoinedTable<'_>,
        pathways: &PathwayTable,
        layout: &OutputLayout,
    ) -> Result<ExportReport> {
        let otu = build_otu_table(joined, pathways)?;

        let pathway_sums = layout.pathway_sums();
        otu.write_pathway_sums(&pathway_sums)?;
        let otu_table = layout.otu_table();
        otu.to_tsv(&otu_table)?;

        let biom = match &self.converter {
            Some(converter) => {
                let biom = layout.biom();
                converter.convert(&otu_table, &biom)?;
                Some(biom)
            }
            None => None,
        };
        info!("Exported {} IDs to {:?}", otu.counts().n_rows(), otu_table);

        Ok(ExportReport {
            ids: otu.counts().n_rows(),
            pathway_sums,
            otu_table,
            biom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GeneCount;
    use crate::join::tests::pathway;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct Recorder {
        titles: Rc<RefCell<Vec<String>>>,
    }

    impl MatrixRenderer for Recorder {
        fn render(&self, _matrix: &CountMatrix, path: &Path, title: &str) -> Result<()> {
            std::fs::write(path, title)?;
            self.titles.borrow_mut().push(title.to_string());
            Ok(())
        }
    }

    struct FailingRenderer;

    impl MatrixRenderer for FailingRenderer {
        fn render(&self, _matrix: &CountMatrix, _path: &Path, _title: &str) -> Result<()> {
            Err(ProfileError::Render("no backend".to_string()))
        }
    }

    struct FailingConverter;

    impl TableConverter for FailingConverter {
        fn convert(&self, _input: &Path, _output: &Path) -> Result<()> {
            Err(ProfileError::ExportFailed {
                command: "biom convert".to_string(),
                reason: "exit status: 1".to_string(),
            })
        }
    }

    fn create_test_inputs() -> (GeneCountTable, PathwayTable) {
        let counts = GeneCountTable::new(vec![
            GeneCount::new("S1", "K1_1", 10.0),
            GeneCount::new("S2", "K1_2", 30.0),
            GeneCount::new("S1", "K2", 5.0),
        ]);
        let pathways = PathwayTable::new(vec![
            pathway("K1", ["DIRECT", "NUTRIENT", "nitrogen", "fix", "nifH"], "P1"),
            pathway("K2", ["DIRECT", "NUTRIENT", "iron", "sid", "entA"], "P2"),
            pathway("K3", ["INDIRECT", "STRESS", "salt", "osm", "betA"], "P3"),
        ]);
        (counts, pathways)
    }

    #[test]
    fn test_pipeline_builder() {
        let pipeline = Pipeline::new()
            .name("builder")
            .summary_policy(NormalizationPolicy::PerGroup)
            .without_converter();
        assert_eq!(pipeline.config().name, "builder");
        assert_eq!(pipeline.config().summary_policy, NormalizationPolicy::PerGroup);
        assert!(pipeline.converter.is_none());
    }

    #[test]
    fn test_pipeline_run() {
        let dir = tempdir().unwrap();
        let (counts, pathways) = create_test_inputs();
        let recorder = Recorder::default();

        let report = Pipeline::new()
            .renderer(recorder.clone())
            .without_converter()
            .run(counts, &pathways, None, dir.path())
            .unwrap();

        assert_eq!(report.levels.len(), 3);
        assert!(report.join.unmatched_ids.is_empty());
        assert!(report.levels.iter().all(|l| l.skipped.is_none()));
        // Lv4 and Lv3 each render two global heatmaps.
        assert_eq!(report.levels[0].heatmaps.len(), 0);
        assert_eq!(report.levels[1].heatmaps.len(), 2);
        // NUTRIENT is built; STRESS has no counts, at every level, both trees.
        assert_eq!(report.facets_rendered(), 6);
        assert_eq!(report.facets_skipped(), 6);
        assert!(report.summary.is_none());
        assert!(report.export.biom.is_none());

        let titles = recorder.titles.borrow();
        assert!(titles.contains(&"Normalized gene counts by sample and Lv3 with Lv2=NUTRIENT".to_string()));
        assert!(dir.path().join("figures/non-normalized/Lv4_heatmap.svg").exists());
        assert!(!dir.path().join("figures/normalized/Lv5_heatmap.svg").exists());
    }

    #[test]
    fn test_export_failure_stays_distinct() {
        let dir = tempdir().unwrap();
        let (counts, pathways) = create_test_inputs();

        let result = Pipeline::new()
            .renderer(Recorder::default())
            .converter(FailingConverter)
            .run(counts, &pathways, None, dir.path());

        assert!(matches!(result, Err(ProfileError::ExportFailed { .. })));
        assert!(dir.path().join("tables/gene_counts_sum_with_combined_pathways.txt").exists());
    }

    #[test]
    fn test_pipeline_error_handling() {
        let dir = tempdir().unwrap();
        let (_, pathways) = create_test_inputs();

        let result = Pipeline::new()
            .renderer(Recorder::default())
            .without_converter()
            .run(GeneCountTable::default(), &pathways, None, dir.path());
        assert!(matches!(result, Err(ProfileError::EmptyData(_))));
    }

    #[test]
    fn test_summary_errors_keep_their_variant() {
        let dir = tempdir().unwrap();
        let (counts, pathways) = create_test_inputs();
        let unlabeled = SummaryClassification::new(vec![]);

        let result = Pipeline::new()
            .renderer(Recorder::default())
            .summary_renderer(Recorder::default())
            .without_converter()
            .run(counts, &pathways, Some(&unlabeled), dir.path());
        assert!(matches!(result, Err(ProfileError::EmptyData(_))));
    }

    #[test]
    fn test_render_failure_gets_stage_context() {
        let dir = tempdir().unwrap();
        let (counts, pathways) = create_test_inputs();

        let result = Pipeline::new()
            .renderer(FailingRenderer)
            .without_converter()
            .run(counts, &pathways, None, dir.path());
        match result {
            Err(ProfileError::Pipeline(msg)) => {
                assert!(msg.starts_with("Lv5 facets failed"), "{}", msg);
                assert!(msg.contains("no backend"));
            }
            other => panic!("expected a pipeline error, got {:?}", other.map(|_| ())),
        }
    }
}
