//! ReflowGate - defers the host's soft-wrap recomputation.
//!
//! The host calls the gate (through [`ReflowHook`]) every time it wants to
//! recompute wrap columns. While frozen the gate answers [`ReflowDecision::Defer`]
//! and remembers that a flush is owed; [`ReflowGate::unfreeze`] hands that debt
//! back to the caller, who runs the host routine exactly once.
//!
//! The one exception is the view's initial layout: the first request a gate
//! ever sees runs even while frozen. A host that lays the view out before
//! installing the hook reports so through
//! [`ReflowHook::on_installed_after_layout`], which uses that pass up.
//!
//! State lives in `Cell`s so the gate can be shared as `Rc<ReflowGate>` between
//! the host (which consults it) and the session (which freezes and unfreezes
//! it) without a `RefCell` borrow ever being held across a host call.

use crate::host::{ReflowDecision, ReflowHook};
use serde::Serialize;
use std::cell::Cell;
use tracing::trace;

/// Counters of gate decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateStats {
    /// Requests answered with `Run`.
    pub passed: usize,
    /// Requests answered with `Defer`.
    pub deferred: usize,
    /// Owed flushes handed out by `unfreeze`.
    pub flushed: usize,
}

/// Gate in front of one view's recomputation routine.
#[derive(Debug)]
pub struct ReflowGate {
    frozen: Cell<bool>,
    pending_flush: Cell<bool>,
    first_seen: Cell<bool>,
    stats: Cell<GateStats>,
}

impl Default for ReflowGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflowGate {
    /// Creates a frozen gate. The first request still passes unless
    /// [`mark_initial_layout_done`](Self::mark_initial_layout_done) is called.
    pub fn new() -> Self {
        Self {
            frozen: Cell::new(true),
            pending_flush: Cell::new(false),
            first_seen: Cell::new(false),
            stats: Cell::new(GateStats::default()),
        }
    }

    /// Decide a recomputation request.
    ///
    /// - the very first request always runs
    /// - unfrozen: runs, and any owed flush is considered paid
    /// - frozen: deferred, a flush becomes owed
    pub fn invoke(&self) -> ReflowDecision {
        let first = !self.first_seen.replace(true);
        let mut stats = self.stats.get();

        let decision = if first || !self.frozen.get() {
            self.pending_flush.set(false);
            stats.passed += 1;
            ReflowDecision::Run
        } else {
            self.pending_flush.set(true);
            stats.deferred += 1;
            ReflowDecision::Defer
        };

        self.stats.set(stats);
        trace!(?decision, first, "reflow gate");
        decision
    }

    /// Record that the initial layout already ran without the gate, so the
    /// next request is judged like any other.
    pub fn mark_initial_layout_done(&self) {
        if !self.first_seen.replace(true) {
            trace!("initial layout ran before the gate was installed");
        }
    }

    /// Stop recomputations until the next [`unfreeze`](Self::unfreeze).
    pub fn freeze(&self) {
        self.frozen.set(true);
    }

    /// Let recomputations through. Returns true when a request was deferred
    /// since the last flush; the caller must then run the routine once.
    #[must_use = "an owed flush must be run by the caller"]
    pub fn unfreeze(&self) -> bool {
        self.frozen.set(false);
        let owed = self.pending_flush.replace(false);
        if owed {
            let mut stats = self.stats.get();
            stats.flushed += 1;
            self.stats.set(stats);
        }
        owed
    }

    /// Returns true while requests are being deferred.
    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }

    /// Returns true while a flush is owed.
    pub fn has_pending_flush(&self) -> bool {
        self.pending_flush.get()
    }

    /// Decision counters so far.
    pub fn stats(&self) -> GateStats {
        self.stats.get()
    }
}

impl ReflowHook for ReflowGate {
    fn on_reflow_requested(&self) -> ReflowDecision {
        self.invoke()
    }

    fn on_installed_after_layout(&self) {
        self.mark_initial_layout_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_gate_is_frozen() {
        let gate = ReflowGate::new();
        assert!(gate.is_frozen());
        assert!(!gate.has_pending_flush());
    }

    #[test]
    fn first_invoke_passes_even_when_frozen() {
        let gate = ReflowGate::new();
        assert_eq!(gate.invoke(), ReflowDecision::Run);
        assert_eq!(gate.invoke(), ReflowDecision::Defer);
    }

    #[test]
    fn marked_layout_leaves_no_free_pass() {
        let gate = ReflowGate::new();
        gate.mark_initial_layout_done();
        assert_eq!(gate.invoke(), ReflowDecision::Defer);
        assert!(gate.has_pending_flush());
        assert_eq!(gate.stats().passed, 0);
    }

    #[test]
    fn marking_after_first_request_changes_nothing() {
        let gate = ReflowGate::new();
        assert_eq!(gate.invoke(), ReflowDecision::Run);
        gate.mark_initial_layout_done();
        assert_eq!(gate.invoke(), ReflowDecision::Defer);
        assert_eq!(gate.stats().passed, 1);
    }

    #[test]
    fn hook_installed_on_laid_out_view_defers_first_resize() {
        use crate::host::simulated::{SimulatedView, ViewGeometry};
        use crate::host::EditorView;
        use std::rc::Rc;

        let mut view = SimulatedView::new(vec!["x".repeat(150)], ViewGeometry::default());
        let gate = Rc::new(ReflowGate::new());
        view.install_reflow_hook(gate.clone());

        view.set_width(300.0);

        assert_eq!(view.reflow_count(), 0);
        assert_eq!(view.wrap_column(), Some(100));
        assert!(gate.unfreeze());
    }

    #[test]
    fn unfrozen_gate_runs_and_clears_debt() {
        let gate = ReflowGate::new();
        gate.invoke();
        gate.invoke();
        assert!(gate.has_pending_flush());

        gate.frozen.set(false);
        assert_eq!(gate.invoke(), ReflowDecision::Run);
        assert!(!gate.has_pending_flush());
    }

    #[test]
    fn unfreeze_without_deferral_owes_nothing() {
        let gate = ReflowGate::new();
        gate.invoke();
        assert!(!gate.unfreeze());
        assert_eq!(gate.stats().flushed, 0);
    }

    #[test]
    fn debt_is_paid_once() {
        let gate = ReflowGate::new();
        gate.invoke();
        gate.invoke();
        assert!(gate.unfreeze());
        gate.freeze();
        assert!(!gate.unfreeze(), "Second unfreeze must not flush again");
    }

    #[test]
    fn hook_delegates_to_invoke() {
        let gate = ReflowGate::new();
        let hook: &dyn ReflowHook = &gate;
        hook.on_reflow_requested();
        hook.on_reflow_requested();
        assert_eq!(
            gate.stats(),
            GateStats {
                passed: 1,
                deferred: 1,
                flushed: 0
            }
        );
    }

    proptest! {
        /// N frozen requests after the first collapse into exactly one flush.
        #[test]
        fn prop_frozen_requests_flush_exactly_once(n in 1usize..50) {
            let gate = ReflowGate::new();
            gate.invoke();
            for _ in 0..n {
                prop_assert_eq!(gate.invoke(), ReflowDecision::Defer);
            }
            prop_assert!(gate.unfreeze());
            prop_assert_eq!(gate.stats().deferred, n);
            prop_assert_eq!(gate.stats().flushed, 1);
        }
    }
}
