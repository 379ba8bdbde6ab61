//! Disposal bag for everything a session registers with the host.

use crate::host::Workspace;
use crate::model::{SubscriptionId, ViewId};

/// One registration to undo on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposable {
    /// An event bus subscription.
    Subscription(SubscriptionId),
    /// A reflow hook installed on a view.
    ReflowHook(ViewId),
}

/// Registrations in the order they were made.
#[derive(Debug, Default)]
pub struct Disposables {
    items: Vec<Disposable>,
}

impl Disposables {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a registration.
    pub fn push(&mut self, item: Disposable) {
        self.items.push(item);
    }

    /// Number of registrations still held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true once everything has been disposed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Undo every registration, newest first. A second call finds the bag
    /// empty and does nothing. Views that no longer exist are skipped.
    pub fn dispose(&mut self, workspace: &mut dyn Workspace) {
        while let Some(item) = self.items.pop() {
            match item {
                Disposable::Subscription(id) => workspace.unsubscribe(id),
                Disposable::ReflowHook(view) => {
                    if let Some(host) = workspace.view_mut(view) {
                        host.remove_reflow_hook();
                    }
                }
            }
        }
    }
}
