//! ViewSession - per-view wiring of tracker, gate and restorer.
//!
//! A session is created for a view the registry has seen open, becomes
//! `Active` once the view's render component is reachable, and is torn down
//! on the view's destroy signal. Teardown is idempotent and releases every
//! subscription, the reflow hook and all pending timers synchronously.
//!
//! Sampling handlers are throttled (leading edge); restore triggers are
//! debounced (trailing edge) and fired from [`ViewSession::fire_due`].

mod disposables;

pub use disposables::{Disposable, Disposables};

use crate::anchor::AnchorTracker;
use crate::config::Settings;
use crate::host::{HostEvent, Topic, ViewTopic, Workspace};
use crate::model::{Anchor, BufferPosition, PaneId, SampleMode, ViewId};
use crate::rate_limit::{earliest, Debounce, Throttle};
use crate::reflow::{GateStats, ReflowGate};
use crate::restore::{RestoreOutcome, Restorer};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet wired to the host.
    Uninitialized,
    /// Wired; handling events.
    Active,
    /// Torn down. Terminal.
    Destroyed,
}

/// Per-view events that schedule a debounced restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTrigger {
    /// A layout-affecting setting was toggled.
    LayoutToggle,
    /// A collaborator asked for a resync.
    Resync,
    /// The view's element was resized.
    ViewResize,
}

/// Everything the crate keeps for one open view.
#[derive(Debug)]
pub struct ViewSession {
    view: ViewId,
    pane: PaneId,
    state: SessionState,
    tracker: AnchorTracker,
    gate: Rc<ReflowGate>,
    restorer: Restorer,
    wheel: Throttle,
    cursor: Throttle,
    layout_toggle: Debounce,
    resync: Debounce,
    view_resize: Debounce,
    disposables: Disposables,
    watching_destroyed: bool,
    restore_count: usize,
}

impl ViewSession {
    /// Creates an uninitialized session. `inherited` is the anchor of the view
    /// this one was copied from, if any.
    pub fn new(view: ViewId, pane: PaneId, settings: &Settings, inherited: Option<Anchor>) -> Self {
        Self {
            view,
            pane,
            state: SessionState::Uninitialized,
            tracker: AnchorTracker::new(settings.reference),
            gate: Rc::new(ReflowGate::new()),
            restorer: Restorer::with_inherited(inherited),
            wheel: Throttle::new(settings.throttle.clone()),
            cursor: Throttle::new(settings.throttle.clone()),
            layout_toggle: Debounce::new(settings.debounce.clone()),
            resync: Debounce::new(settings.debounce.clone()),
            view_resize: Debounce::new(settings.debounce.clone()),
            disposables: Disposables::new(),
            watching_destroyed: false,
            restore_count: 0,
        }
    }

    /// The view this session belongs to.
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Pane the view was opened in.
    pub fn pane(&self) -> PaneId {
        self.pane
    }

    /// Lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true while handling events.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Latest anchor.
    pub fn anchor(&self) -> Option<Anchor> {
        self.tracker.anchor()
    }

    /// Reflow gate counters.
    pub fn gate_stats(&self) -> GateStats {
        self.gate.stats()
    }

    /// Successful restores so far, first open included.
    pub fn restore_count(&self) -> usize {
        self.restore_count
    }

    /// Registrations still held with the host.
    pub fn registration_count(&self) -> usize {
        self.disposables.len()
    }

    /// Wire the session to the host and take the first-open sample.
    ///
    /// Returns `None` and stays `Uninitialized` while the view's render
    /// component is not reachable; the caller may retry later.
    pub fn activate(&mut self, workspace: &mut dyn Workspace) -> Option<RestoreOutcome> {
        if self.state != SessionState::Uninitialized {
            return None;
        }
        workspace.view_mut(self.view)?;

        for topic in ViewTopic::ALL {
            if topic == ViewTopic::Destroyed && self.watching_destroyed {
                continue;
            }
            let id = workspace.subscribe(Topic::View(self.view, topic));
            self.disposables.push(Disposable::Subscription(id));
        }
        if let Some(host) = workspace.view_mut(self.view) {
            host.install_reflow_hook(self.gate.clone());
            self.disposables.push(Disposable::ReflowHook(self.view));
        }

        self.state = SessionState::Active;
        info!(view = %self.view, pane = %self.pane, "session activated");
        self.restore(workspace)
    }

    /// Listen for the view's destroy signal while activation is still
    /// pending, so a session that never activates is still torn down.
    pub fn watch_destroyed(&mut self, workspace: &mut dyn Workspace) {
        if self.state != SessionState::Uninitialized || self.watching_destroyed {
            return;
        }
        let id = workspace.subscribe(Topic::View(self.view, ViewTopic::Destroyed));
        self.disposables.push(Disposable::Subscription(id));
        self.watching_destroyed = true;
        trace!(view = %self.view, "watching for destroy before activation");
    }

    /// Dispatch a per-view event. Events for other views and global events
    /// are ignored. Until the session is active only the destroy signal is
    /// handled.
    pub fn handle_event(&mut self, workspace: &mut dyn Workspace, event: &HostEvent, now: Instant) {
        if let HostEvent::ViewDestroyed(view) = *event {
            if view == self.view {
                self.destroy(workspace);
            }
            return;
        }
        if !self.is_active() {
            return;
        }
        match *event {
            HostEvent::CursorMoved { view, old, new } if view == self.view => {
                self.on_cursor_moved(workspace, old, new, now);
            }
            HostEvent::Wheel(view) if view == self.view => self.on_wheel(workspace, now),
            HostEvent::ScrollAnimationEnded(view) if view == self.view => {
                self.on_scroll_animation_ended(workspace);
            }
            HostEvent::LayoutSettingToggled(view) if view == self.view => {
                self.schedule_restore(RestoreTrigger::LayoutToggle, now);
            }
            HostEvent::ResyncRequested(view) if view == self.view => {
                self.schedule_restore(RestoreTrigger::Resync, now);
            }
            HostEvent::ViewResized(view) if view == self.view => {
                self.schedule_restore(RestoreTrigger::ViewResize, now);
            }
            _ => {}
        }
    }

    /// Mouse wheel: throttled viewport sample.
    pub fn on_wheel(&mut self, workspace: &mut dyn Workspace, now: Instant) {
        if self.is_active() && self.wheel.admit(now) {
            self.sample(workspace, SampleMode::ViewportReference);
        }
    }

    /// Cursor move: throttled cursor sample. A move to the same position is
    /// not a move.
    pub fn on_cursor_moved(
        &mut self,
        workspace: &mut dyn Workspace,
        old: BufferPosition,
        new: BufferPosition,
        now: Instant,
    ) {
        if old == new || !self.is_active() {
            return;
        }
        if self.cursor.admit(now) {
            self.sample(workspace, SampleMode::Cursor);
        }
    }

    /// End of a smooth scroll: unthrottled viewport sample.
    pub fn on_scroll_animation_ended(&mut self, workspace: &mut dyn Workspace) {
        if self.is_active() {
            self.sample(workspace, SampleMode::ViewportReference);
        }
    }

    /// Restart the quiet period of a restore trigger.
    pub fn schedule_restore(&mut self, trigger: RestoreTrigger, now: Instant) {
        if !self.is_active() {
            return;
        }
        trace!(view = %self.view, ?trigger, "restore scheduled");
        self.debounce_mut(trigger).schedule(now);
    }

    /// Run the restore owed by any trigger whose quiet period has elapsed.
    /// Several triggers due at once share one restore.
    pub fn fire_due(&mut self, workspace: &mut dyn Workspace, now: Instant) -> Option<RestoreOutcome> {
        let layout = self.layout_toggle.fire_if_due(now);
        let resync = self.resync.fire_if_due(now);
        let resize = self.view_resize.fire_if_due(now);
        if layout || resync || resize {
            self.restore(workspace)
        } else {
            None
        }
    }

    /// Earliest pending restore deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest(
            earliest(self.layout_toggle.deadline(), self.resync.deadline()),
            self.view_resize.deadline(),
        )
    }

    /// Restore now. Failures are logged and dropped.
    pub fn restore(&mut self, workspace: &mut dyn Workspace) -> Option<RestoreOutcome> {
        if !self.is_active() {
            return None;
        }
        let host = workspace.view_mut(self.view)?;
        match self.restorer.restore(host, &mut self.tracker, &self.gate) {
            Ok(outcome) => {
                if outcome != RestoreOutcome::Skipped {
                    self.restore_count += 1;
                }
                Some(outcome)
            }
            Err(err) => {
                debug!(view = %self.view, %err, "restore abandoned");
                None
            }
        }
    }

    /// Sample now. Failures keep the previous anchor.
    pub fn sample(&mut self, workspace: &mut dyn Workspace, mode: SampleMode) -> Option<Anchor> {
        if !self.is_active() {
            return None;
        }
        let host = workspace.view_mut(self.view)?;
        let anchor = self.tracker.sample(host, mode).ok()?;
        debug!(view = %self.view, ?mode, row = %anchor.buffer_row, offset = anchor.offset_from_reference, "sampled");
        Some(anchor)
    }

    /// Tear down: unsubscribe, remove the reflow hook if the view still
    /// exists, drop pending timers. Idempotent.
    pub fn destroy(&mut self, workspace: &mut dyn Workspace) {
        if self.state == SessionState::Destroyed {
            return;
        }
        self.disposables.dispose(workspace);
        self.layout_toggle.cancel();
        self.resync.cancel();
        self.view_resize.cancel();
        self.state = SessionState::Destroyed;
        info!(view = %self.view, "session destroyed");
    }

    fn debounce_mut(&mut self, trigger: RestoreTrigger) -> &mut Debounce {
        match trigger {
            RestoreTrigger::LayoutToggle => &mut self.layout_toggle,
            RestoreTrigger::Resync => &mut self.resync,
            RestoreTrigger::ViewResize => &mut self.view_resize,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
