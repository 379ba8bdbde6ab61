//! PaneWatcher - debounced resize observation of one layout pane.

use super::Settings;
use crate::host::{PaneTopic, Topic, Workspace};
use crate::model::PaneId;
use crate::rate_limit::Debounce;
use crate::session::{Disposable, Disposables};
use std::time::Instant;
use tracing::{debug, trace};

/// Watches one pane's size and owes a fan-out restore once resizing settles.
#[derive(Debug)]
pub struct PaneWatcher {
    pane: PaneId,
    size: Option<(f64, f64)>,
    debounce: Debounce,
    disposables: Disposables,
    destroyed: bool,
}

impl PaneWatcher {
    /// Creates a watcher that is not yet subscribed.
    pub fn new(pane: PaneId, settings: &Settings) -> Self {
        Self {
            pane,
            size: None,
            debounce: Debounce::new(settings.debounce.clone()),
            disposables: Disposables::new(),
            destroyed: false,
        }
    }

    /// Subscribe to the pane's resize and destroy streams.
    pub fn activate(&mut self, workspace: &mut dyn Workspace) {
        if self.destroyed || !self.disposables.is_empty() {
            return;
        }
        for topic in [PaneTopic::Resized, PaneTopic::Destroyed] {
            let id = workspace.subscribe(Topic::Pane(self.pane, topic));
            self.disposables.push(Disposable::Subscription(id));
        }
        debug!(pane = %self.pane, "pane watcher attached");
    }

    /// Watched pane.
    pub fn pane(&self) -> PaneId {
        self.pane
    }

    /// Last observed size.
    pub fn size(&self) -> Option<(f64, f64)> {
        self.size
    }

    /// Record a size observation. Only an actual change restarts the quiet
    /// period; returns whether it did.
    pub fn on_resize(&mut self, width: f64, height: f64, now: Instant) -> bool {
        if self.destroyed || self.size == Some((width, height)) {
            return false;
        }
        self.size = Some((width, height));
        self.debounce.schedule(now);
        trace!(pane = %self.pane, width, height, "pane resize observed");
        true
    }

    /// Returns true once per settled burst of resizes.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        self.debounce.fire_if_due(now)
    }

    /// When the pending fan-out is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Unsubscribe and drop the pending fan-out. Idempotent.
    pub fn destroy(&mut self, workspace: &mut dyn Workspace) {
        if self.destroyed {
            return;
        }
        self.disposables.dispose(workspace);
        self.debounce.cancel();
        self.destroyed = true;
        debug!(pane = %self.pane, "pane watcher detached");
    }

    /// Returns true after [`destroy`](Self::destroy).
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
