use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::report::format_timestamp;

pub const EVENTS_FILE: &str = "events.jsonl";

/// One line of `events.jsonl`.
#[derive(Debug, Serialize)]
struct StageEvent<'a> {
    run_id: &'a str,
    step: &'a str,
    data: serde_json::Value,
    ts: String,
}

/// Stage-by-stage audit trail of pipeline runs, appended as JSON lines.
pub struct PipelineLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl PipelineLogger {
    pub fn new(log_dir: impl AsRef<Path>) -> io::Result<Self> {
        fs::create_dir_all(log_dir.as_ref())?;
        let path = log_dir.as_ref().join(EVENTS_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `ts` uses the same RFC 3339 form as report timestamps.
    pub fn log_event(&self, run_id: &str, step: &str, data: serde_json::Value) -> io::Result<()> {
        let event = StageEvent {
            run_id,
            step,
            data,
            ts: format_timestamp(Utc::now()),
        };
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("event log mutex poisoned"))?;
        serde_json::to_writer(&mut *file, &event)?;
        file.write_all(b"\n")?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_events(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn event_line_carries_run_step_data_and_rfc3339_ts() {
        let dir = tempfile::tempdir().unwrap();
        let logger = PipelineLogger::new(dir.path()).unwrap();
        logger
            .log_event(
                "run-1",
                "detect_anomaly",
                serde_json::json!({ "anomaly_detected": false }),
            )
            .unwrap();

        let events = read_events(logger.path());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["run_id"], "run-1");
        assert_eq!(events[0]["step"], "detect_anomaly");
        assert_eq!(events[0]["data"]["anomaly_detected"], false);
        let ts = events[0]["ts"].as_str().unwrap();
        assert!(ts.ends_with('Z'), "{ts}");
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        PipelineLogger::new(dir.path())
            .unwrap()
            .log_event("a", "fetch_cost", serde_json::Value::Null)
            .unwrap();
        let logger = PipelineLogger::new(dir.path().join(".")).unwrap();
        logger
            .log_event("b", "fetch_cost", serde_json::Value::Null)
            .unwrap();

        let runs: Vec<_> = read_events(&dir.path().join(EVENTS_FILE))
            .iter()
            .map(|e| e["run_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(runs, ["a", "b"]);
    }
}
