//! SessionRegistry - process-wide coordinator.
//!
//! Owns exactly one [`ViewSession`] per open view and one [`PaneWatcher`] per
//! pane, plus the global font-size listener. The embedding event loop feeds it
//! host events through [`SessionRegistry::handle_event`] and calls
//! [`SessionRegistry::tick`] when [`SessionRegistry::next_deadline`] comes due.

mod pane_watcher;

pub use pane_watcher::PaneWatcher;

use crate::config::Settings;
use crate::host::{HostEvent, Topic, Workspace};
use crate::model::{PaneId, ViewId};
use crate::rate_limit::{earliest, Debounce};
use crate::restore::RestoreOutcome;
use crate::session::{Disposable, Disposables, SessionState, ViewSession};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Root of the scroll-keeping layer.
#[derive(Debug)]
pub struct SessionRegistry {
    settings: Settings,
    sessions: BTreeMap<ViewId, ViewSession>,
    watchers: BTreeMap<PaneId, PaneWatcher>,
    font_size: Debounce,
    disposables: Disposables,
    active: bool,
}

impl SessionRegistry {
    /// Creates an inactive registry.
    pub fn new(settings: Settings) -> Self {
        let font_size = Debounce::new(settings.debounce.clone());
        Self {
            settings,
            sessions: BTreeMap::new(),
            watchers: BTreeMap::new(),
            font_size,
            disposables: Disposables::new(),
            active: false,
        }
    }

    /// Subscribe to view-opened, pane-opened and font-size-changed. Idempotent.
    pub fn activate(&mut self, workspace: &mut dyn Workspace) {
        if self.active {
            return;
        }
        for topic in [Topic::ViewOpened, Topic::PaneOpened, Topic::FontSizeChanged] {
            let id = workspace.subscribe(topic);
            self.disposables.push(Disposable::Subscription(id));
        }
        self.active = true;
        info!(
            debounce = ?self.settings.debounce.get(),
            reference = %self.settings.reference,
            "registry activated"
        );
    }

    /// Tear down every session and watcher and release the global
    /// subscriptions. Idempotent.
    pub fn deactivate(&mut self, workspace: &mut dyn Workspace) {
        if !self.active {
            return;
        }
        for session in self.sessions.values_mut() {
            session.destroy(workspace);
        }
        for watcher in self.watchers.values_mut() {
            watcher.destroy(workspace);
        }
        self.sessions.clear();
        self.watchers.clear();
        self.font_size.cancel();
        self.disposables.dispose(workspace);
        self.active = false;
        info!("registry deactivated");
    }

    /// Returns true between `activate` and `deactivate`.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Change the debounce window of every session, watcher and the font
    /// listener. Takes effect on the next burst.
    pub fn set_debounce(&mut self, window: Duration) {
        self.settings.set_debounce(window);
    }

    /// Session of a view.
    pub fn session(&self, view: ViewId) -> Option<&ViewSession> {
        self.sessions.get(&view)
    }

    /// Watcher of a pane.
    pub fn watcher(&self, pane: PaneId) -> Option<&PaneWatcher> {
        self.watchers.get(&pane)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of live pane watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Dispatch one host event.
    pub fn handle_event(&mut self, workspace: &mut dyn Workspace, event: &HostEvent, now: Instant) {
        if !self.active {
            return;
        }
        match *event {
            HostEvent::ViewOpened {
                view,
                pane,
                copied_from,
            } => self.open_view(workspace, view, pane, copied_from),
            HostEvent::PaneOpened(pane) => self.ensure_watcher(workspace, pane),
            HostEvent::PaneResized {
                pane,
                width,
                height,
            } => {
                if let Some(watcher) = self.watchers.get_mut(&pane) {
                    watcher.on_resize(width, height, now);
                }
            }
            HostEvent::PaneDestroyed(pane) => self.close_pane(workspace, pane),
            HostEvent::FontSizeChanged => {
                trace!("font size change scheduled");
                self.font_size.schedule(now);
            }
            _ => {
                let Some(view) = event.view() else {
                    return;
                };
                let Some(session) = self.sessions.get_mut(&view) else {
                    return;
                };
                session.handle_event(workspace, event, now);
                if session.state() == SessionState::Destroyed {
                    self.sessions.remove(&view);
                }
            }
        }
    }

    /// Run everything whose debounce has elapsed: pending activations,
    /// per-view restores, pane fan-outs and the font-size fan-out. Returns the
    /// number of restores that ran.
    pub fn tick(&mut self, workspace: &mut dyn Workspace, now: Instant) -> usize {
        if !self.active {
            return 0;
        }
        let mut restores = 0;

        for session in self.sessions.values_mut() {
            if session.state() == SessionState::Uninitialized
                && session.activate(workspace).is_some()
            {
                restores += 1;
            }
            if session.fire_due(workspace, now).is_some() {
                restores += 1;
            }
        }

        let due: Vec<PaneId> = self
            .watchers
            .values_mut()
            .filter_map(|watcher| watcher.fire_if_due(now).then_some(watcher.pane()))
            .collect();
        for pane in due {
            let views = workspace.views_in_pane(pane);
            debug!(pane = %pane, views = views.len(), "pane resize settled");
            for view in views {
                if let Some(session) = self.sessions.get_mut(&view) {
                    restores += usize::from(session.restore(workspace).is_some());
                }
            }
        }

        if self.font_size.fire_if_due(now) {
            debug!(views = self.sessions.len(), "font size change settled");
            for session in self.sessions.values_mut() {
                restores += usize::from(session.restore(workspace).is_some());
            }
        }

        restores
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let sessions = self
            .sessions
            .values()
            .fold(None, |acc, session| earliest(acc, session.next_deadline()));
        let watchers = self
            .watchers
            .values()
            .fold(None, |acc, watcher| earliest(acc, watcher.next_deadline()));
        earliest(earliest(sessions, watchers), self.font_size.deadline())
    }

    /// Restore one view immediately, bypassing its debounces.
    pub fn restore_view(&mut self, workspace: &mut dyn Workspace, view: ViewId) -> Option<RestoreOutcome> {
        self.sessions.get_mut(&view)?.restore(workspace)
    }

    fn ensure_watcher(&mut self, workspace: &mut dyn Workspace, pane: PaneId) {
        if self.watchers.contains_key(&pane) {
            return;
        }
        let mut watcher = PaneWatcher::new(pane, &self.settings);
        watcher.activate(workspace);
        self.watchers.insert(pane, watcher);
    }

    fn open_view(
        &mut self,
        workspace: &mut dyn Workspace,
        view: ViewId,
        pane: PaneId,
        copied_from: Option<ViewId>,
    ) {
        if self.sessions.contains_key(&view) {
            trace!(view = %view, "view already has a session");
            return;
        }
        self.ensure_watcher(workspace, pane);

        let inherited = copied_from
            .and_then(|source| self.sessions.get(&source))
            .and_then(ViewSession::anchor);
        let mut session = ViewSession::new(view, pane, &self.settings, inherited);
        session.activate(workspace);
        if session.state() == SessionState::Uninitialized {
            if !is_hosted(workspace, view, pane) {
                debug!(view = %view, "view closed before its session activated");
                session.destroy(workspace);
                return;
            }
            session.watch_destroyed(workspace);
        }
        self.sessions.insert(view, session);
    }

    fn close_pane(&mut self, workspace: &mut dyn Workspace, pane: PaneId) {
        if let Some(mut watcher) = self.watchers.remove(&pane) {
            watcher.destroy(workspace);
        }
        for view in workspace.views_in_pane(pane) {
            if let Some(mut session) = self.sessions.remove(&view) {
                session.destroy(workspace);
            }
        }
    }
}

/// Returns true while the host still lists `view` in `pane`.
fn is_hosted(workspace: &dyn Workspace, view: ViewId, pane: PaneId) -> bool {
    workspace.views_in_pane(pane).contains(&view)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
