//! Event loop over the simulated host with a virtual clock.

use crate::config::Settings;
use crate::host::simulated::SimulatedWorkspace;
use crate::model::ViewId;
use crate::registry::SessionRegistry;
use crate::restore::RestoreOutcome;
use std::time::{Duration, Instant};

/// Upper bound on ticks per [`Driver::settle`], far above any real burst.
const MAX_SETTLE_TICKS: usize = 1024;

/// Couples a [`SimulatedWorkspace`] to an active [`SessionRegistry`] and
/// drives both with a clock that only moves when told to.
pub struct Driver {
    workspace: SimulatedWorkspace,
    registry: SessionRegistry,
    now: Instant,
}

impl Driver {
    /// Creates a driver with an empty workspace and an activated registry.
    pub fn new(settings: Settings) -> Self {
        let mut workspace = SimulatedWorkspace::new();
        let mut registry = SessionRegistry::new(settings);
        registry.activate(&mut workspace);
        Self {
            workspace,
            registry,
            now: Instant::now(),
        }
    }

    /// The simulated host.
    pub fn workspace(&self) -> &SimulatedWorkspace {
        &self.workspace
    }

    /// The registry under test.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Virtual time.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Act on the host, then deliver every event it published.
    pub fn with<R>(&mut self, action: impl FnOnce(&mut SimulatedWorkspace) -> R) -> R {
        let result = action(&mut self.workspace);
        self.pump();
        result
    }

    /// Restore one view right away, outside any debounce.
    pub fn restore_now(&mut self, view: ViewId) -> Option<RestoreOutcome> {
        let outcome = self.registry.restore_view(&mut self.workspace, view);
        self.pump();
        outcome
    }

    /// Deliver queued host events until the queue stays empty.
    pub fn pump(&mut self) {
        loop {
            let events = self.workspace.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.registry
                    .handle_event(&mut self.workspace, &event, self.now);
            }
        }
    }

    /// Move the clock forward, ticking at every deadline on the way. Returns
    /// the number of restores that ran.
    pub fn advance(&mut self, by: Duration) -> usize {
        let end = self.now + by;
        let mut restores = 0;
        while let Some(deadline) = self.registry.next_deadline() {
            if deadline > end {
                break;
            }
            self.now = self.now.max(deadline);
            restores += self.registry.tick(&mut self.workspace, self.now);
            self.pump();
        }
        self.now = end;
        restores += self.registry.tick(&mut self.workspace, self.now);
        self.pump();
        restores
    }

    /// Advance until nothing is pending. Returns the number of restores.
    pub fn settle(&mut self) -> usize {
        let mut restores = 0;
        for _ in 0..MAX_SETTLE_TICKS {
            let Some(deadline) = self.registry.next_deadline() else {
                break;
            };
            let by = deadline.saturating_duration_since(self.now);
            restores += self.advance(by);
        }
        restores
    }

    /// Deactivate the registry and hand back the host, for leak checks.
    pub fn shutdown(mut self) -> SimulatedWorkspace {
        self.registry.deactivate(&mut self.workspace);
        self.workspace
    }
}
