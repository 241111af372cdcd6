#![deny(missing_docs)]
#![doc = "Confidence interval summaries of repeated LCC simulation runs."]

use lcc_core::errors::LccError;
use log::info;

/// Per-run metric reduction.
pub mod aggregate;
/// Analysis configuration and YAML loading.
pub mod config;
/// Run boundary detection.
pub mod partition;
/// Result file schema and CSV loading.
pub mod record;
/// Cross-run statistics and rendering.
pub mod report;
/// Canonical JSON and YAML helpers.
pub mod serde;
/// Student's t distribution.
pub mod student_t;

pub use aggregate::{aggregate_run, aggregate_runs, ScenarioMetrics};
pub use config::{load_config, AnalysisConfig};
pub use partition::{partition_runs, PartitionOpts, RunGroup, RunLayout};
pub use record::{load_records, load_records_from_reader, Record, FIELD_NAMES};
pub use report::{
    build_report, render_per_run, render_text, summarize_metric, Metric, Report, ReportEntry,
    RunSummary, Spread,
};
pub use student_t::{t_cdf, t_quantile};

/// Runs the full pipeline: load, partition, aggregate, report.
pub fn summarize(config: &AnalysisConfig) -> Result<Report, LccError> {
    config.validate()?;
    let records = load_records(&config.input_path)?;
    summarize_records(&records, config)
}

/// Runs partition, aggregation and reporting over already loaded records.
pub fn summarize_records(records: &[Record], config: &AnalysisConfig) -> Result<Report, LccError> {
    config.validate()?;
    let opts = PartitionOpts {
        require_uniform_runs: config.require_uniform_runs,
    };
    let layout = partition_runs(records, &opts)?;
    let per_run = aggregate_runs(records, &layout)?;
    let report = build_report(
        &config.scenario_label,
        config.input_path.clone(),
        &layout,
        &per_run,
        config.confidence_level,
    )?;
    info!(
        "summarised {} run(s) for scenario '{}'",
        report.run_count, report.scenario
    );
    Ok(report)
}
