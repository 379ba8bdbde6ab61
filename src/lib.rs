//! scroll-keeper
//!
//! Keeps the visual reading position of an editor viewport stable when the
//! document reflows under it: soft-wrap toggles, pane resizes, font-size
//! changes and external resyncs.
//!
//! Each open view gets a [`session::ViewSession`] that samples an
//! [`model::Anchor`] on user scrolls and cursor moves, holds the host's reflow
//! behind a [`reflow::ReflowGate`], and after a debounced geometry change lets
//! the reflow through once and scrolls the anchored row back to where it was.
//! A [`registry::SessionRegistry`] owns every session plus the per-pane and
//! global listeners. The [`host`] module defines the editor boundary and ships
//! a simulated editor that the [`scenario`] replayer and the tests drive.

pub mod anchor;
pub mod config;
pub mod host;
pub mod logging;
pub mod model;
pub mod rate_limit;
pub mod reflow;
pub mod registry;
pub mod restore;
pub mod scenario;
pub mod session;
