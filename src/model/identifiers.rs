//! Host object identifiers.
//!
//! Views, panes and subscriptions are owned by the host; we only ever hold
//! their ids. Ids are opaque and compared by value.

use std::fmt;

/// Identifier of an open document view (one editor tab / split).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    /// Wrap a raw host id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw host id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Identifier of a layout pane hosting zero or more views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(u64);

impl PaneId {
    /// Wrap a raw host id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw host id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane#{}", self.0)
    }
}

/// Handle returned by the host event bus for a single subscription.
///
/// Must be handed back to `Workspace::unsubscribe` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a raw host handle.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw host handle.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}
