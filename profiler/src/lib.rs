//! Wall-clock profiling for designated operations on wrapped objects.
//!
//! A [`Profiler`] hands out [`Instrumented`] decorators that forward every
//! call to the wrapped target while timing the operations the target's
//! [`ProfiledOps`] descriptor declares. Durations accumulate per
//! (type, operation) pair in a process-wide store and can be appended to a
//! text report any number of times during one run.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod instrument;
pub mod state;

pub use instrument::{Instrumented, OpTimer, ProfiledOps};
pub use state::ProfilingState;

#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("{type_label} declares no profiled operations")]
    NothingToProfile { type_label: &'static str },
}

/// Owns the shared timing store and the run timestamp for report headers.
pub struct Profiler {
    state: Arc<ProfilingState>,
    started_at: DateTime<Utc>,
}

impl Profiler {
    /// Create a profiler with an empty store. The construction time becomes
    /// the "Run at" header of every report this profiler writes.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ProfilingState::new()),
            started_at: Utc::now(),
        }
    }

    /// Wrap `target` so that its profiled operations are timed into this
    /// profiler's store.
    ///
    /// Rejected up front when the capability declares nothing to profile;
    /// wrapping such a target could only ever be a configuration mistake.
    pub fn wrap<T: ProfiledOps>(&self, target: T) -> Result<Instrumented<T>, ProfilerError> {
        if T::PROFILED.is_empty() {
            return Err(ProfilerError::NothingToProfile {
                type_label: target.type_label(),
            });
        }
        Ok(Instrumented::new(target, Arc::clone(&self.state)))
    }

    /// Cumulative duration recorded so far for one (type, operation) pair.
    pub fn recorded(&self, type_label: &str, op: &str) -> Option<Duration> {
        self.state.total(type_label, op)
    }

    /// Append the report to `path`, creating the file if needed. Existing
    /// content stays in place above the new section.
    pub fn write_report<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        self.write_report_to(&mut file)
    }

    /// Write the report: a "Run at" header, one line per recorded
    /// (type, operation) pair, and a trailing blank line.
    pub fn write_report_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "Run at {}", self.started_at.to_rfc2822())?;
        self.state.write_to(writer)?;
        writeln!(writer)
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}
