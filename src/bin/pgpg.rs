//! PGPG - plant-growth-promotion gene profiling CLI
//!
//! Command-line interface for merging annotation hits with gene abundances
//! and profiling the result against the PGPT pathway hierarchy.

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use pgpg_profile::data::{AbundanceTable, AnnotationHits, GeneCountTable, PathwayTable, SummaryClassification};
use pgpg_profile::error::Result;
use pgpg_profile::merge::{collect_hits, merge_annotations, write_gene_counts, OutputMode};
use pgpg_profile::pipeline::{Pipeline, PipelineConfig, RunReport};
use std::path::PathBuf;

/// Output format of the run report.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
    Yaml,
}

/// Plant-growth-promotion gene profiling
#[derive(Parser)]
#[command(name = "pgpg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate per-sample DIAMOND outputs into one hit table
    CollectHits {
        /// DIAMOND output files named <sample>_diamond*.txt
        #[arg(short = 'b', long = "blast", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output hit table
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Merge annotation hits with per-sample abundance files
    #[command(group(ArgGroup::new("mode").args(["append", "truncate"])))]
    Merge {
        /// Abundance files (gene_id, count), one per sample
        #[arg(short, long, required = true, num_args = 1..)]
        abundance: Vec<PathBuf>,

        /// Hit table (#sample, gene_id, accession)
        #[arg(short = 'b', long)]
        hits: PathBuf,

        /// Output gene-count table
        #[arg(short, long)]
        output: PathBuf,

        /// Append to an existing output file (duplicates rows on re-run)
        #[arg(long)]
        append: bool,

        /// Overwrite an existing output file
        #[arg(long)]
        truncate: bool,
    },

    /// Join gene counts with pathways and write tables, heatmaps and the OTU export
    Run {
        /// Merged gene-count table
        #[arg(short, long)]
        gene_counts: PathBuf,

        /// Pathway table (ID, Lv1..Lv5, PGPT_ID)
        #[arg(short, long)]
        pathways: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Summary classification table (ID, LV_SUM)
        #[arg(short, long)]
        summary: Option<PathBuf>,

        /// Pipeline configuration YAML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip the BIOM conversion
        #[arg(long)]
        no_convert: bool,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Generate an example pipeline configuration
    Example {
        /// Output path for the YAML file
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CollectHits { inputs, output } => cmd_collect_hits(&inputs, &output),

        Commands::Merge {
            abundance,
            hits,
            output,
            append,
            truncate,
        } => {
            let mode = match (append, truncate) {
                (true, _) => OutputMode::Append,
                (_, true) => OutputMode::Truncate,
                _ => OutputMode::FailIfExists,
            };
            cmd_merge(&abundance, &hits, &output, mode)
        }

        Commands::Run {
            gene_counts,
            pathways,
            output,
            summary,
            config,
            no_convert,
            format,
        } => cmd_run(
            &gene_counts,
            &pathways,
            &output,
            summary.as_ref(),
            config.as_ref(),
            no_convert,
            format,
        ),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Collect DIAMOND outputs into a hit table
fn cmd_collect_hits(inputs: &[PathBuf], output: &PathBuf) -> Result<()> {
    eprintln!("Collecting hits from {} file(s)...", inputs.len());
    let hits = collect_hits(inputs)?;
    hits.to_tsv(output)?;
    eprintln!("Wrote {} hits to {:?}", hits.len(), output);
    Ok(())
}

/// Merge hits with abundances
fn cmd_merge(
    abundance_paths: &[PathBuf],
    hits_path: &PathBuf,
    output_path: &PathBuf,
    mode: OutputMode,
) -> Result<()> {
    eprintln!("Loading {} abundance file(s)...", abundance_paths.len());
    let abundances = abundance_paths
        .iter()
        .map(AbundanceTable::from_tsv)
        .collect::<Result<Vec<_>>>()?;
    let hits = AnnotationHits::from_tsv(hits_path)?;
    eprintln!("Loaded {} hits", hits.len());

    let outcome = merge_annotations(&abundances, &hits);
    let written = write_gene_counts(&outcome.matched, output_path, mode)?;

    eprintln!("Wrote {} rows to {:?}", written, output_path);
    if !outcome.dropped.is_empty() {
        eprintln!("  {} hits had no abundance entry and were dropped", outcome.dropped.len());
    }
    Ok(())
}

/// Run the profiling pipeline
fn cmd_run(
    gene_counts_path: &PathBuf,
    pathways_path: &PathBuf,
    output_dir: &PathBuf,
    summary_path: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    no_convert: bool,
    format: ReportFormat,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            eprintln!("Loading pipeline configuration from {:?}...", path);
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };

    eprintln!("Loading data...");
    let counts = GeneCountTable::from_tsv(gene_counts_path)?;
    let pathways = PathwayTable::from_tsv(pathways_path)?;
    let classes = summary_path
        .map(SummaryClassification::from_tsv)
        .transpose()?;
    eprintln!(
        "Loaded {} gene counts and {} pathway records",
        counts.len(),
        pathways.len()
    );

    eprintln!("Running pipeline '{}'...", config.name);
    let mut pipeline = Pipeline::from_config(&config);
    if no_convert {
        pipeline = pipeline.without_converter();
    }
    let report = pipeline.run(counts, &pathways, classes.as_ref(), output_dir)?;

    print_report(&report, format)
}

fn print_report(report: &RunReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        ReportFormat::Yaml => println!("{}", serde_yaml::to_string(report)?),
        ReportFormat::Text => {
            println!("Run Report: {}", report.name);
            println!("===========");
            println!();
            println!("Join:");
            println!("  Gene-count rows:  {}", report.gene_count_rows);
            println!("  Matched rows:     {}", report.join.matched_rows);
            println!("  Unmatched IDs:    {}", report.join.unmatched_ids.len());
            println!("  Pathway-only IDs: {}", report.join.pathway_only);
            println!();
            println!("Levels:");
            for level in &report.levels {
                match &level.skipped {
                    Some(reason) => println!("  {}: skipped ({})", level.level, reason),
                    None => println!(
                        "  {}: {} categories x {} samples, {} heatmap(s)",
                        level.level,
                        level.rows,
                        level.samples,
                        level.heatmaps.len()
                    ),
                }
            }
            println!();
            println!("Facets:");
            println!("  Rendered: {}", report.facets_rendered());
            println!("  Skipped:  {}", report.facets_skipped());
            if let Some(summary) = &report.summary {
                println!();
                println!("Summary ({:?} normalization):", summary.policy);
                println!("  Groups:  {}", summary.groups);
                println!("  Samples: {}", summary.samples);
                println!("  Unclassified IDs: {}", summary.unclassified_ids);
            }
            println!();
            println!("Export:");
            println!("  IDs:       {}", report.export.ids);
            println!("  OTU table: {:?}", report.export.otu_table);
            match &report.export.biom {
                Some(biom) => println!("  BIOM:      {:?}", biom),
                None => println!("  BIOM:      not converted"),
            }
        }
    }
    Ok(())
}

/// Write the default configuration
fn cmd_example(output_path: &PathBuf) -> Result<()> {
    let config = PipelineConfig {
        name: "example-pgpg".to_string(),
        description: Some("Default PGPT profiling pipeline".to_string()),
        ..PipelineConfig::default()
    };
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example pipeline to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
