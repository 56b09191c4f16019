//! Cumulative timing store shared by every instrumented object.
//!
//! Keys are (type label, operation) pairs. Totals accumulate for the
//! lifetime of the process and are never reset between report writes.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

/// Process-wide store of cumulative durations per profiled operation.
#[derive(Default)]
pub struct ProfilingState {
    records: Mutex<HashMap<(String, String), Duration>>,
}

impl ProfilingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` to the running total for (type, operation).
    pub fn record(&self, type_label: &str, op: &str, elapsed: Duration) {
        let mut records = self.records.lock().unwrap();
        *records
            .entry((type_label.to_string(), op.to_string()))
            .or_insert(Duration::ZERO) += elapsed;
    }

    /// Cumulative duration recorded for one (type, operation) pair, if any.
    pub fn total(&self, type_label: &str, op: &str) -> Option<Duration> {
        let records = self.records.lock().unwrap();
        records
            .get(&(type_label.to_string(), op.to_string()))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Write one line per recorded pair, sorted by key so the output is
    /// stable across runs.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut entries: Vec<((String, String), Duration)> = {
            let records = self.records.lock().unwrap();
            records.iter().map(|(key, total)| (key.clone(), *total)).collect()
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for ((type_label, op), total) in entries {
            writeln!(writer, "  {}#{} took {:?}", type_label, op, total)?;
        }
        Ok(())
    }
}
