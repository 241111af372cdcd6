use lcc_core::errors::{ErrorInfo, LccError};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::partition::RunLayout;
use crate::record::Record;

/// Scenario level metrics reduced from one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Delivered share of all sent data packets, in percent.
    pub global_pdr: f64,
    /// Receive-weighted mean delay, in milliseconds.
    pub avg_delay_ms: f64,
    /// Sum of per-node throughput, in bits per second.
    pub total_throughput: f64,
    /// Sum of beacon packets sent by every node.
    pub total_overhead: u64,
    /// Mean number of role changes per node.
    pub avg_stability: f64,
}

fn add_counter(total: u64, value: u64, counter: &str) -> Result<u64, LccError> {
    total.checked_add(value).ok_or_else(|| {
        LccError::Format(
            ErrorInfo::new("lcc_stats.counter_overflow", "counter sum exceeds u64 range")
                .with_context("field", counter),
        )
    })
}

fn ensure_finite(value: f64, metric: &str) -> Result<f64, LccError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LccError::Format(
            ErrorInfo::new("lcc_stats.metric_overflow", "run metric is not a finite number")
                .with_context("metric", metric),
        ))
    }
}

/// Reduces the records of a single run to its scenario metrics.
///
/// # Errors
///
/// [`LccError::Format`] when a counter sum overflows `u64` or a floating
/// point metric is not finite.
pub fn aggregate_run(records: &[Record]) -> Result<ScenarioMetrics, LccError> {
    let mut total_sent = 0u64;
    let mut total_received = 0u64;
    let mut weighted_delay = 0.0;
    let mut total_throughput = 0.0;
    let mut total_overhead = 0u64;
    let mut total_role_changes = 0u64;

    for record in records {
        total_sent = add_counter(total_sent, record.sent, "Sent")?;
        total_received = add_counter(total_received, record.received, "Received")?;
        weighted_delay += record.avg_delay * record.received as f64;
        total_throughput += record.throughput;
        total_overhead = add_counter(total_overhead, record.beacons_sent, "BeaconsSent")?;
        total_role_changes = add_counter(total_role_changes, record.role_changes, "RoleChanges")?;
    }

    let global_pdr = if total_sent > 0 {
        total_received as f64 / total_sent as f64 * 100.0
    } else {
        0.0
    };
    let avg_delay_ms = if total_received > 0 {
        weighted_delay / total_received as f64 * 1000.0
    } else {
        0.0
    };
    let avg_stability = if records.is_empty() {
        0.0
    } else {
        total_role_changes as f64 / records.len() as f64
    };

    Ok(ScenarioMetrics {
        global_pdr: ensure_finite(global_pdr, "Global_PDR")?,
        avg_delay_ms: ensure_finite(avg_delay_ms, "Avg_Delay")?,
        total_throughput: ensure_finite(total_throughput, "Total_Throughput")?,
        total_overhead,
        avg_stability,
    })
}

/// Aggregates every run of `layout`, preserving run order.
pub fn aggregate_runs(
    records: &[Record],
    layout: &RunLayout,
) -> Result<Vec<ScenarioMetrics>, LccError> {
    layout
        .runs
        .iter()
        .map(|run| {
            let metrics = aggregate_run(run.records(records)).map_err(|err| match err {
                LccError::Format(info) => {
                    LccError::Format(info.with_context("run", run.index.to_string()))
                }
                other => other,
            })?;
            debug!("run {} [{}..{}): {:?}", run.index, run.start, run.end, metrics);
            Ok(metrics)
        })
        .collect()
}
