//! Per-record query profiler
//!
//! Registered as the first pre-record hook and the last post-record hook.
//! The pre hook clears the query log; the post hook drains it and prints
//! one YAML table (QUERY, TIME, TRACE) for the record.

use super::traits::{PostRecordHook, PreRecordHook};
use crate::host::{ExportRecord, QueryLog, QueryTrace};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// Where the profiler is within a record's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilerState {
    Idle,
    Recording,
}

/// One rendered row of the report.
#[derive(Debug, Serialize)]
struct QueryRow<'a> {
    #[serde(rename = "QUERY")]
    query: &'a str,
    /// Seconds
    #[serde(rename = "TIME")]
    time: f64,
    #[serde(rename = "TRACE")]
    trace: &'a str,
}

/// Render captured traces as one YAML document: a sequence of
/// QUERY/TIME/TRACE maps preceded by a `---` marker, so consecutive
/// reports form a multi-document stream.
pub fn render_report(traces: &[QueryTrace]) -> Result<String, serde_yaml::Error> {
    let rows: Vec<QueryRow<'_>> = traces
        .iter()
        .map(|t| QueryRow {
            query: &t.statement,
            time: t.elapsed.as_secs_f64(),
            trace: &t.trace,
        })
        .collect();
    Ok(format!("---\n{}", serde_yaml::to_string(&rows)?))
}

pub struct Profiler {
    log: QueryLog,
    out: Mutex<Box<dyn Write + Send>>,
    state: Mutex<ProfilerState>,
}

impl Profiler {
    /// Create a profiler and switch the log into capture mode.
    pub fn activate(log: QueryLog, out: Box<dyn Write + Send>) -> Self {
        log.enable();
        Self {
            log,
            out: Mutex::new(out),
            state: Mutex::new(ProfilerState::Idle),
        }
    }

    /// Profiler reporting to standard output.
    pub fn to_stdout(log: QueryLog) -> Self {
        Self::activate(log, Box::new(std::io::stdout()))
    }

    pub fn state(&self) -> ProfilerState {
        *self.state.lock().unwrap()
    }

    fn report(&self, traces: &[QueryTrace]) {
        let yaml = match render_report(traces) {
            Ok(yaml) => yaml,
            Err(e) => {
                warn!(error = %e, "failed to render query report");
                return;
            }
        };
        let mut out = self.out.lock().unwrap();
        if let Err(e) = out.write_all(yaml.as_bytes()).and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write query report");
        }
    }
}

impl PreRecordHook for Profiler {
    fn id(&self) -> &str {
        "profiler"
    }

    fn before_record(&self, record: ExportRecord) -> ExportRecord {
        self.log.reset();
        *self.state.lock().unwrap() = ProfilerState::Recording;
        record
    }
}

impl PostRecordHook for Profiler {
    fn id(&self) -> &str {
        "profiler"
    }

    fn after_record(&self, record: ExportRecord) -> ExportRecord {
        let traces = self.log.take();
        self.report(&traces);
        *self.state.lock().unwrap() = ProfilerState::Idle;
        record
    }
}
