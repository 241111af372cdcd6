use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use lcc_core::errors::{ErrorInfo, LccError};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Column names of the headerless result file, in file order.
pub const FIELD_NAMES: [&str; 8] = [
    "NodeID",
    "Sent",
    "Received",
    "PDR",
    "AvgDelay",
    "Throughput",
    "BeaconsSent",
    "RoleChanges",
];

/// Per-node counters written by one simulated node at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Node identifier; `0` marks the first node of a run.
    pub node_id: i64,
    /// Data packets transmitted.
    pub sent: u64,
    /// Data packets received.
    pub received: u64,
    /// Per-node delivery ratio in percent. Not used by the aggregator.
    pub pdr: f64,
    /// Mean end-to-end delay in seconds.
    pub avg_delay: f64,
    /// Received throughput in bits per second.
    pub throughput: f64,
    /// Beacon (control) packets transmitted.
    pub beacons_sent: u64,
    /// Cluster role changes; a missing value is recorded as zero.
    pub role_changes: u64,
}

fn format_error(code: &str, message: impl Into<String>, line: u64) -> LccError {
    LccError::Format(ErrorInfo::new(code, message).with_context("line", line.to_string()))
}

/// Loads every record from the CSV file at `path`.
pub fn load_records(path: &Path) -> Result<Vec<Record>, LccError> {
    let file = File::open(path).map_err(|err| {
        LccError::Io(
            ErrorInfo::new("lcc_stats.open", "failed to open result file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let records = load_records_from_reader(BufReader::new(file))
        .map_err(|err| attach_path(err, path))?;
    info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn attach_path(err: LccError, path: &Path) -> LccError {
    let location = path.display().to_string();
    match err {
        LccError::Io(info) => LccError::Io(info.with_context("path", location)),
        LccError::Format(info) => LccError::Format(info.with_context("path", location)),
        other => other,
    }
}

/// Loads every record from an in-memory or streamed CSV source.
pub fn load_records_from_reader<R: Read>(reader: R) -> Result<Vec<Record>, LccError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut row = StringRecord::new();
    loop {
        let more = csv_reader.read_record(&mut row).map_err(wrap_csv)?;
        if !more {
            break;
        }
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();
        records.push(parse_row(&row, line)?);
    }
    debug!("parsed {} csv rows", records.len());
    Ok(records)
}

fn wrap_csv(err: csv::Error) -> LccError {
    let line = err.position().map(|pos| pos.line());
    let info = if err.is_io_error() {
        ErrorInfo::new("lcc_stats.read", "failed to read result file").with_hint(err.to_string())
    } else {
        ErrorInfo::new("lcc_stats.csv", "malformed CSV input").with_hint(err.to_string())
    };
    let info = match line {
        Some(line) => info.with_context("line", line.to_string()),
        None => info,
    };
    if err.is_io_error() {
        LccError::Io(info)
    } else {
        LccError::Format(info)
    }
}

fn parse_row(row: &StringRecord, line: u64) -> Result<Record, LccError> {
    let extra_non_empty = row.iter().skip(FIELD_NAMES.len()).any(|field| !field.is_empty());
    if row.len() < FIELD_NAMES.len() || extra_non_empty {
        return Err(LccError::Format(
            ErrorInfo::new(
                "lcc_stats.field_count",
                format!(
                    "expected {} comma separated fields, found {}",
                    FIELD_NAMES.len(),
                    row.len()
                ),
            )
            .with_context("line", line.to_string())
            .with_hint(FIELD_NAMES.join(",")),
        ));
    }
    let field = |idx: usize| row.get(idx).unwrap_or_default();
    Ok(Record {
        node_id: parse_signed(field(0), 0, line)?,
        sent: parse_unsigned(field(1), 1, line)?,
        received: parse_unsigned(field(2), 2, line)?,
        pdr: parse_float(field(3), 3, line)?,
        avg_delay: parse_float(field(4), 4, line)?,
        throughput: parse_float(field(5), 5, line)?,
        beacons_sent: parse_unsigned(field(6), 6, line)?,
        role_changes: parse_role_changes(field(7), line)?,
    })
}

fn invalid_value(raw: &str, idx: usize, line: u64, expected: &str) -> LccError {
    LccError::Format(
        ErrorInfo::new(
            "lcc_stats.field_value",
            format!("{} is not a valid {expected}", FIELD_NAMES[idx]),
        )
        .with_context("line", line.to_string())
        .with_context("field", FIELD_NAMES[idx])
        .with_context("value", raw),
    )
}

/// Integral values written as floats (`100.0`) are accepted.
fn integral_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
}

fn parse_signed(raw: &str, idx: usize, line: u64) -> Result<i64, LccError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }
    integral_float(raw)
        .filter(|value| value.abs() <= i64::MAX as f64)
        .map(|value| value as i64)
        .ok_or_else(|| invalid_value(raw, idx, line, "integer"))
}

fn parse_unsigned(raw: &str, idx: usize, line: u64) -> Result<u64, LccError> {
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }
    integral_float(raw)
        .filter(|value| *value >= 0.0 && *value <= u64::MAX as f64)
        .map(|value| value as u64)
        .ok_or_else(|| invalid_value(raw, idx, line, "non-negative integer"))
}

fn parse_float(raw: &str, idx: usize, line: u64) -> Result<f64, LccError> {
    if raw.is_empty() {
        return Err(format_error(
            "lcc_stats.field_missing",
            format!("{} is empty", FIELD_NAMES[idx]),
            line,
        ));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| invalid_value(raw, idx, line, "finite number"))
}

fn parse_role_changes(raw: &str, line: u64) -> Result<u64, LccError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(0);
    }
    parse_unsigned(raw, 7, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(input: &str) -> Result<Vec<Record>, LccError> {
        load_records_from_reader(input.as_bytes())
    }

    #[test]
    fn parses_all_eight_fields() {
        let records = load("0,100,90,90,0.01,1000,10,3\n").expect("load");
        assert_eq!(
            records,
            vec![Record {
                node_id: 0,
                sent: 100,
                received: 90,
                pdr: 90.0,
                avg_delay: 0.01,
                throughput: 1000.0,
                beacons_sent: 10,
                role_changes: 3,
            }]
        );
    }

    #[test]
    fn empty_role_changes_become_zero() {
        let records = load("0,100,90,90,0.01,1000,10,\n1,5,5,100,0.2,10,4,nan\n").expect("load");
        assert_eq!(records[0].role_changes, 0);
        assert_eq!(records[1].role_changes, 0);
    }

    #[test]
    fn accepts_whitespace_scientific_and_integral_floats() {
        let records = load(" 3 , 100.0 , 90 , 90 , 1.5e-05 , 2.4e3 , 10 , 1 \n").expect("load");
        assert_eq!(records[0].node_id, 3);
        assert_eq!(records[0].sent, 100);
        assert!((records[0].avg_delay - 1.5e-5).abs() < 1e-18);
        assert_eq!(records[0].throughput, 2400.0);
    }

    #[test]
    fn skips_blank_lines() {
        let records = load("0,1,1,100,0.1,8,1,0\n\n1,1,0,0,0,0,1,0\n").expect("load");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn short_rows_are_rejected_with_line_number() {
        let err = load("0,1,1,100,0.1,8,1,0\n1,1,0,0\n").expect_err("short row");
        assert!(matches!(err, LccError::Format(_)));
        assert_eq!(err.info().code, "lcc_stats.field_count");
        assert_eq!(err.info().context.get("line").map(String::as_str), Some("2"));
    }

    #[test]
    fn trailing_empty_field_is_tolerated_but_extra_data_is_not() {
        assert!(load("0,1,1,100,0.1,8,1,0,\n").is_ok());
        let err = load("0,1,1,100,0.1,8,1,0,9\n").expect_err("extra column");
        assert_eq!(err.info().code, "lcc_stats.field_count");
    }

    #[test]
    fn non_numeric_values_name_the_field() {
        let err = load("0,abc,1,100,0.1,8,1,0\n").expect_err("bad sent");
        assert_eq!(err.info().code, "lcc_stats.field_value");
        assert_eq!(err.info().context.get("field").map(String::as_str), Some("Sent"));
        assert_eq!(err.info().context.get("value").map(String::as_str), Some("abc"));
    }

    #[test]
    fn negative_counters_are_rejected() {
        let err = load("0,-4,1,100,0.1,8,1,0\n").expect_err("negative sent");
        assert!(matches!(err, LccError::Format(_)));
    }

    #[test]
    fn empty_delay_is_rejected() {
        let err = load("0,1,1,100,,8,1,0\n").expect_err("empty delay");
        assert_eq!(err.info().code, "lcc_stats.field_missing");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_records(Path::new("/definitely/not/here.csv")).expect_err("missing");
        assert!(matches!(err, LccError::Io(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
