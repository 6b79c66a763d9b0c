//! Run metadata recorded in the success marker.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Timestamp rendering used in markers, e.g. `2026-08-07 14:03:21.184522`.
/// Host-local time, matching what operators see on the box that ran the step.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Metadata captured once per successful execution and serialized into the
/// success marker. Diagnostic content only: completion checks look at the
/// marker's existence, never at these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    /// Local wall-clock time when execution started.
    pub start: String,
    /// Local wall-clock time when execution finished.
    pub end: String,
    /// Elapsed seconds, `end - start`, never negative.
    pub elapsed: f64,
    /// Logical CPUs on the host that ran the step.
    pub cpu_count: usize,
    /// Total host memory in GiB, rounded to two decimals.
    #[serde(rename = "mem GiB")]
    pub mem_gib: f64,
}

impl RunInfo {
    /// Builds the record for a run bounded by `start` and `end`, snapshotting
    /// host resources now.
    ///
    /// Elapsed time is derived from the same pair of wall-clock readings
    /// that produce the rendered timestamps, clamped at zero in case the
    /// clock stepped backwards mid-run.
    pub fn capture(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        let elapsed = (end - start)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let (cpu_count, mem_gib) = host_snapshot();
        Self {
            start: start.format(TIMESTAMP_FORMAT).to_string(),
            end: end.format(TIMESTAMP_FORMAT).to_string(),
            elapsed,
            cpu_count,
            mem_gib,
        }
    }
}

/// Logical CPU count and total memory in GiB (2 decimals) of this host.
fn host_snapshot() -> (usize, f64) {
    let sys = System::new_all();
    let cpu_count = sys.cpus().len().max(1);
    let mem_gib = sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
    let mem_gib = (mem_gib * 100.0).round() / 100.0;
    (cpu_count, mem_gib)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serializes_with_marker_field_names() {
        let start = Local.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2026, 8, 7, 10, 0, 2).unwrap();
        let info = RunInfo::capture(start, end);
        let value: serde_json::Value = serde_json::to_value(&info).unwrap();

        let object = value.as_object().unwrap();
        for key in ["start", "end", "elapsed", "cpu_count", "mem GiB"] {
            assert!(object.contains_key(key), "missing marker field '{key}'");
        }
        assert_eq!(object.len(), 5);
        assert!((value["elapsed"].as_f64().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_clamped_when_clock_steps_back() {
        let start = Local.with_ymd_and_hms(2026, 8, 7, 10, 0, 5).unwrap();
        let end = Local.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        let info = RunInfo::capture(start, end);
        assert_eq!(info.elapsed, 0.0);
    }

    #[test]
    fn test_host_snapshot_reports_sane_values() {
        let (cpu_count, mem_gib) = host_snapshot();
        assert!(cpu_count >= 1);
        assert!(mem_gib > 0.0);
        // Rounded to two decimals.
        assert!((mem_gib * 100.0 - (mem_gib * 100.0).round()).abs() < 1e-9);
    }

    #[test]
    fn test_roundtrips_through_json() {
        let start = Local.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2026, 8, 7, 10, 30, 0).unwrap();
        let info = RunInfo::capture(start, end);
        let bytes = serde_json::to_vec(&info).unwrap();
        let back: RunInfo = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.start, info.start);
        assert_eq!(back.end, info.end);
        assert_eq!(back.cpu_count, info.cpu_count);
    }
}
