//! Decorator shell for timing designated operations on a wrapped object.

use std::sync::Arc;
use std::time::Instant;

use crate::state::ProfilingState;

/// Capability descriptor: which operations of an implementor are timed.
///
/// The list is a static table, so the set of profiled operations is fixed
/// at compile time and can be validated when the object is wrapped.
pub trait ProfiledOps {
    /// Names of the operations to time. An empty list means there is
    /// nothing to profile and wrapping is rejected.
    const PROFILED: &'static [&'static str];

    /// Label used for the (type, operation) report key.
    fn type_label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A target wrapped together with the shared timing store.
///
/// `Instrumented` only carries the pair; the capability trait impl that
/// forwards each operation lives next to the trait itself (for example the
/// `PageParser` impl in the crawler crate). A forwarding impl times an
/// operation by holding a [`timer`](Instrumented::timer) guard across the
/// inner call.
pub struct Instrumented<T> {
    inner: T,
    state: Arc<ProfilingState>,
}

impl<T: ProfiledOps> Instrumented<T> {
    pub(crate) fn new(inner: T, state: Arc<ProfilingState>) -> Self {
        Self { inner, state }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Start a timer for `op`, or `None` when `op` is not declared as
    /// profiled (the call is then a plain pass-through).
    pub fn timer(&self, op: &'static str) -> Option<OpTimer<'_>> {
        if T::PROFILED.contains(&op) {
            Some(OpTimer {
                state: &self.state,
                type_label: self.inner.type_label(),
                op,
                start: Instant::now(),
            })
        } else {
            None
        }
    }
}

/// Running timer for a single profiled call.
///
/// Recording happens on drop, so the elapsed time lands in the store on
/// the error path as well and the operation's own result passes through
/// untouched.
pub struct OpTimer<'a> {
    state: &'a ProfilingState,
    type_label: &'static str,
    op: &'static str,
    start: Instant,
}

impl Drop for OpTimer<'_> {
    fn drop(&mut self) {
        self.state.record(self.type_label, self.op, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Sleeper;

    impl ProfiledOps for Sleeper {
        const PROFILED: &'static [&'static str] = &["nap"];

        fn type_label(&self) -> &'static str {
            "Sleeper"
        }
    }

    fn wrapped(state: &Arc<ProfilingState>) -> Instrumented<Sleeper> {
        Instrumented::new(Sleeper, Arc::clone(state))
    }

    #[test]
    fn test_timer_only_for_profiled_ops() {
        let state = Arc::new(ProfilingState::new());
        let instrumented = wrapped(&state);

        assert!(instrumented.timer("nap").is_some());
        assert!(instrumented.timer("walk").is_none());
    }

    #[test]
    fn test_timer_records_on_drop() {
        let state = Arc::new(ProfilingState::new());
        let instrumented = wrapped(&state);

        {
            let _timer = instrumented.timer("nap");
            std::thread::sleep(Duration::from_millis(10));
        }

        let total = state.total("Sleeper", "nap").unwrap();
        assert!(total >= Duration::from_millis(10));
    }

    #[test]
    fn test_timer_records_when_the_call_fails() {
        let state = Arc::new(ProfilingState::new());
        let instrumented = wrapped(&state);

        let failing_call = |target: &Instrumented<Sleeper>| -> Result<(), String> {
            let _timer = target.timer("nap");
            Err("boom".to_string())
        };

        assert_eq!(failing_call(&instrumented), Err("boom".to_string()));
        assert!(state.total("Sleeper", "nap").is_some());
    }
}
