use std::ops::Range;

use lcc_core::errors::{ErrorInfo, LccError};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Node identifier that opens a new run.
pub const RUN_SENTINEL: i64 = 0;

/// Contiguous block of records belonging to one simulation repetition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunGroup {
    /// Zero-based ordinal of the run in file order.
    pub index: usize,
    /// First record index (inclusive).
    pub start: usize,
    /// One past the last record index.
    pub end: usize,
}

impl RunGroup {
    /// Number of records in the run.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Runs are never empty once partitioned; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open index range of the run.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Borrows this run's records out of the full table.
    pub fn records<'a>(&self, all: &'a [Record]) -> &'a [Record] {
        &all[self.range()]
    }
}

/// Result of splitting the record table into runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLayout {
    /// Runs in file order; together they cover every record exactly once.
    pub runs: Vec<RunGroup>,
    /// Nodes per run, inferred from the gap between the first two sentinels.
    pub node_count: usize,
    /// Whether every run has exactly `node_count` records.
    pub uniform: bool,
    /// Total number of records partitioned.
    pub total_records: usize,
}

/// Options controlling run detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionOpts {
    /// Fail instead of warning when runs have differing lengths.
    pub require_uniform_runs: bool,
}

/// Splits `records` into runs, one starting at each `NodeID == 0` row.
///
/// With fewer than two sentinel rows the whole table is a single run. Rows
/// that precede the first sentinel are folded into the first run.
pub fn partition_runs(records: &[Record], opts: &PartitionOpts) -> Result<RunLayout, LccError> {
    let total = records.len();
    if total == 0 {
        return Err(LccError::Degenerate(
            ErrorInfo::new("lcc_stats.empty", "input contains no records")
                .with_hint("check that the simulation wrote its result rows"),
        ));
    }

    let sentinels: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.node_id == RUN_SENTINEL)
        .map(|(idx, _)| idx)
        .collect();

    let (runs, node_count) = if sentinels.len() > 1 {
        let mut runs = Vec::with_capacity(sentinels.len());
        for (index, &start) in sentinels.iter().enumerate() {
            let start = if index == 0 { 0 } else { start };
            let end = sentinels.get(index + 1).copied().unwrap_or(total);
            runs.push(RunGroup { index, start, end });
        }
        (runs, sentinels[1] - sentinels[0])
    } else {
        (
            vec![RunGroup {
                index: 0,
                start: 0,
                end: total,
            }],
            total,
        )
    };

    if let Some(&first) = sentinels.first() {
        if first > 0 && sentinels.len() > 1 {
            warn!("{first} record(s) precede the first NodeID 0 row; counted in run 0");
        }
    }

    let mismatch = runs.iter().find(|run| run.len() != node_count).copied();
    if let Some(run) = mismatch {
        if opts.require_uniform_runs {
            return Err(LccError::Partition(
                ErrorInfo::new("lcc_stats.uneven_runs", "run lengths are not uniform")
                    .with_context("run", run.index.to_string())
                    .with_context("length", run.len().to_string())
                    .with_context("expected", node_count.to_string()),
            ));
        }
        warn!(
            "run {} has {} records but node count was inferred as {}; runs are uneven",
            run.index,
            run.len(),
            node_count
        );
    }

    info!(
        "detected {} run(s) of {} node(s) over {} records",
        runs.len(),
        node_count,
        total
    );

    Ok(RunLayout {
        runs,
        node_count,
        uniform: mismatch.is_none(),
        total_records: total,
    })
}
