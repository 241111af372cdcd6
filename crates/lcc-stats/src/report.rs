use std::path::PathBuf;

use lcc_core::errors::{ErrorInfo, LccError};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::aggregate::ScenarioMetrics;
use crate::partition::RunLayout;
use crate::student_t::t_quantile;

const BANNER_WIDTH: usize = 60;
const LABEL_WIDTH: usize = 25;

/// Scenario metrics in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Delivered share of sent packets, percent.
    #[serde(rename = "Global_PDR")]
    GlobalPdr,
    /// Receive-weighted delay, milliseconds.
    #[serde(rename = "Avg_Delay")]
    AvgDelay,
    /// Summed throughput, bits per second.
    #[serde(rename = "Total_Throughput")]
    TotalThroughput,
    /// Summed beacon count.
    #[serde(rename = "Total_Overhead")]
    TotalOverhead,
    /// Mean role changes per node.
    #[serde(rename = "Avg_Stability")]
    AvgStability,
}

impl Metric {
    /// All metrics in the order they are printed.
    pub const ALL: [Metric; 5] = [
        Metric::GlobalPdr,
        Metric::AvgDelay,
        Metric::TotalThroughput,
        Metric::TotalOverhead,
        Metric::AvgStability,
    ];

    /// Human readable label with unit.
    pub fn label(self) -> &'static str {
        match self {
            Metric::GlobalPdr => "PDR (%)",
            Metric::AvgDelay => "Delay (ms)",
            Metric::TotalThroughput => "Throughput (bps)",
            Metric::TotalOverhead => "Overhead (packets)",
            Metric::AvgStability => "Stability (role changes)",
        }
    }

    /// Extracts this metric from one run's results.
    pub fn value(self, metrics: &ScenarioMetrics) -> f64 {
        match self {
            Metric::GlobalPdr => metrics.global_pdr,
            Metric::AvgDelay => metrics.avg_delay_ms,
            Metric::TotalThroughput => metrics.total_throughput,
            Metric::TotalOverhead => metrics.total_overhead as f64,
            Metric::AvgStability => metrics.avg_stability,
        }
    }
}

/// Spread around a metric mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Spread {
    /// Confidence interval half-width across two or more runs.
    Interval {
        /// Half the width of the two-sided interval.
        half_width: f64,
    },
    /// Only one run exists, so no interval is defined.
    SingleRun,
}

/// Cross-run summary of a single metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Metric being summarised.
    pub metric: Metric,
    /// Arithmetic mean across runs.
    pub mean: f64,
    /// Interval half-width or single-run marker.
    pub spread: Spread,
}

/// Metrics of a single run together with its position in the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Zero-based run ordinal.
    pub index: usize,
    /// First record index (inclusive).
    pub start: usize,
    /// One past the last record index.
    pub end: usize,
    /// Reduced metrics for the run.
    pub metrics: ScenarioMetrics,
}

/// Final artefact of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Title printed in the banner.
    pub scenario: String,
    /// Input file the records were read from.
    pub input: PathBuf,
    /// Number of records read.
    pub total_records: usize,
    /// Number of runs detected.
    pub run_count: usize,
    /// Nodes per run as inferred by the partitioner.
    pub node_count: usize,
    /// Whether every run has `node_count` records.
    pub uniform_runs: bool,
    /// Two-sided confidence level of the intervals.
    pub confidence_level: f64,
    /// One entry per metric, in [`Metric::ALL`] order.
    pub entries: Vec<ReportEntry>,
    /// Per-run metrics in file order.
    pub runs: Vec<RunSummary>,
}

/// Mean and spread of one metric's per-run values.
///
/// A single value yields [`Spread::SingleRun`] without touching the t
/// distribution. Otherwise the half-width is the standard error of the mean
/// times the `(1 + level) / 2` quantile of Student's t with `n - 1` degrees
/// of freedom.
pub fn summarize_metric(values: &[f64], confidence_level: f64) -> Result<(f64, Spread), LccError> {
    let n = values.len();
    if n == 0 {
        return Err(LccError::Degenerate(ErrorInfo::new(
            "lcc_stats.no_runs",
            "cannot summarise a metric without runs",
        )));
    }
    let mean = values.iter().mean();
    if n == 1 {
        return Ok((mean, Spread::SingleRun));
    }
    let std_error = values.iter().std_dev() / (n as f64).sqrt();
    let critical = t_quantile((1.0 + confidence_level) / 2.0, n - 1)?;
    Ok((
        mean,
        Spread::Interval {
            half_width: std_error * critical,
        },
    ))
}

/// Builds the report for the runs of `layout` and their metrics.
pub fn build_report(
    scenario: &str,
    input: PathBuf,
    layout: &RunLayout,
    per_run: &[ScenarioMetrics],
    confidence_level: f64,
) -> Result<Report, LccError> {
    let mut entries = Vec::with_capacity(Metric::ALL.len());
    for metric in Metric::ALL {
        let values: Vec<f64> = per_run.iter().map(|m| metric.value(m)).collect();
        let (mean, spread) = summarize_metric(&values, confidence_level)?;
        entries.push(ReportEntry {
            metric,
            mean,
            spread,
        });
    }
    let runs = layout
        .runs
        .iter()
        .zip(per_run)
        .map(|(run, metrics)| RunSummary {
            index: run.index,
            start: run.start,
            end: run.end,
            metrics: *metrics,
        })
        .collect();
    Ok(Report {
        scenario: scenario.to_string(),
        input,
        total_records: layout.total_records,
        run_count: layout.runs.len(),
        node_count: layout.node_count,
        uniform_runs: layout.uniform,
        confidence_level,
        entries,
        runs,
    })
}

fn banner() -> String {
    "=".repeat(BANNER_WIDTH)
}

fn metric_line(entry: &ReportEntry) -> String {
    let label = entry.metric.label();
    match entry.spread {
        Spread::Interval { half_width } => format!(
            "{label:<width$} : {:.4} ± {:.4}",
            entry.mean,
            half_width,
            width = LABEL_WIDTH
        ),
        Spread::SingleRun => format!(
            "{label:<width$} : {:.4} (single run)",
            entry.mean,
            width = LABEL_WIDTH
        ),
    }
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Renders the summary table exactly as printed on stdout.
pub fn render_text(report: &Report) -> String {
    let mut lines = vec![
        format!("Detected node count: {}", report.node_count),
        format!("Total runs: {}", report.run_count),
        format!("Confidence level: {:.1}%", report.confidence_level * 100.0),
    ];
    if !report.uniform_runs {
        lines.push("Warning: run lengths differ; node count inferred from the first run".into());
    }
    lines.push(String::new());
    lines.push(banner());
    lines.push(format!(" RESULT REPORT: {}", report.scenario));
    lines.push(banner());
    lines.extend(report.entries.iter().map(metric_line));
    lines.push(banner());
    join_lines(lines)
}

/// Renders one line per run with its record range and metrics.
pub fn render_per_run(report: &Report) -> String {
    let mut lines = vec![format!(
        "{:>4} {:>13} {:>10} {:>12} {:>16} {:>10} {:>10}",
        "run", "records", "PDR (%)", "Delay (ms)", "Throughput", "Overhead", "Stability"
    )];
    lines.extend(report.runs.iter().map(|run| {
        let m = &run.metrics;
        format!(
            "{:>4} {:>13} {:>10.4} {:>12.4} {:>16.4} {:>10} {:>10.4}",
            run.index,
            format!("[{}..{})", run.start, run.end),
            m.global_pdr,
            m.avg_delay_ms,
            m.total_throughput,
            m.total_overhead,
            m.avg_stability
        )
    }));
    join_lines(lines)
}
