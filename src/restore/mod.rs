//! Restorer - turns a stored anchor back into a scroll offset.
//!
//! Every restore runs the same sequence against the host:
//!
//! 1. unfreeze the gate and run the owed recomputation, if any
//! 2. force a layout pass so geometry reflects the new wrap
//! 3. project the anchored buffer row to its current pixel top
//! 4. scroll so that pixel sits at the recorded distance from the reference line
//! 5. force another layout pass, then freeze the gate again
//!
//! The gate is frozen again on every path out, including errors.

use crate::anchor::AnchorTracker;
use crate::host::EditorView;
use crate::model::{Anchor, ReferencePolicy, RestoreError, SampleMode};
use crate::reflow::ReflowGate;
use tracing::debug;

/// What a restore did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestoreOutcome {
    /// The anchor was applied; `offset` is the resulting scroll offset.
    Applied {
        /// Scroll offset after the host clamped it.
        offset: f64,
    },
    /// First restore of a view: scrolled to the cursor and sampled it.
    FirstOpen {
        /// The cursor sample, if one could be taken.
        anchor: Option<Anchor>,
    },
    /// No anchor yet; the viewport was left alone.
    Skipped,
}

/// Applies anchors to one view.
#[derive(Debug, Clone, Default)]
pub struct Restorer {
    first_done: bool,
    inherited: Option<Anchor>,
}

impl Restorer {
    /// Creates a restorer whose first restore scrolls to the cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a restorer whose first restore applies `inherited` (the anchor
    /// of the view this one was copied from), falling back to the cursor.
    pub fn with_inherited(inherited: Option<Anchor>) -> Self {
        Self {
            first_done: false,
            inherited,
        }
    }

    /// Returns true until the first restore has run.
    pub fn first_pending(&self) -> bool {
        !self.first_done
    }

    /// Restore the tracker's anchor on `view`.
    pub fn restore(
        &mut self,
        view: &mut dyn EditorView,
        tracker: &mut AnchorTracker,
        gate: &ReflowGate,
    ) -> Result<RestoreOutcome, RestoreError> {
        if !self.first_done {
            self.first_done = true;
            return Ok(self.first_open(view, tracker, gate));
        }

        let Some(anchor) = tracker.anchor() else {
            return Ok(RestoreOutcome::Skipped);
        };
        let offset = apply(view, anchor, tracker.policy(), gate)?;
        debug!(row = %anchor.buffer_row, offset, "anchor restored");
        Ok(RestoreOutcome::Applied { offset })
    }

    fn first_open(
        &mut self,
        view: &mut dyn EditorView,
        tracker: &mut AnchorTracker,
        gate: &ReflowGate,
    ) -> RestoreOutcome {
        if let Some(anchor) = self.inherited.take() {
            match apply(view, anchor, tracker.policy(), gate) {
                Ok(offset) => {
                    tracker.adopt(anchor);
                    debug!(row = %anchor.buffer_row, offset, "inherited anchor restored");
                    return RestoreOutcome::Applied { offset };
                }
                Err(err) => debug!(%err, "inherited anchor not applicable"),
            }
        }

        if gate.unfreeze() {
            view.run_reflow();
        }
        view.force_layout();
        view.scroll_to_cursor();
        view.force_layout();
        gate.freeze();

        let anchor = tracker.sample(view, SampleMode::Cursor).ok();
        debug!(?anchor, "first open");
        RestoreOutcome::FirstOpen { anchor }
    }
}

/// Apply `anchor` to `view` with the gate open, re-freezing it afterwards.
pub fn apply(
    view: &mut dyn EditorView,
    anchor: Anchor,
    policy: ReferencePolicy,
    gate: &ReflowGate,
) -> Result<f64, RestoreError> {
    if gate.unfreeze() {
        view.run_reflow();
    }
    let result = place(view, anchor, policy);
    gate.freeze();
    result
}

fn place(
    view: &mut dyn EditorView,
    anchor: Anchor,
    policy: ReferencePolicy,
) -> Result<f64, RestoreError> {
    view.force_layout();

    let screen_row = view
        .screen_row_for_buffer_row(anchor.buffer_row)
        .ok_or(RestoreError::StaleAnchor {
            row: anchor.buffer_row,
        })?;
    let projected = view
        .pixel_for_screen_row(screen_row)
        .filter(|pixel| pixel.is_finite())
        .ok_or(RestoreError::GeometryUnavailable { what: "row pixel" })?;

    let height = view.viewport_height();
    if !height.is_finite() {
        return Err(RestoreError::GeometryUnavailable {
            what: "viewport height",
        });
    }
    let target = anchor.target_scroll_offset(projected, policy, height);
    if !target.is_finite() {
        return Err(RestoreError::GeometryUnavailable {
            what: "target offset",
        });
    }

    view.set_scroll_offset(target);
    view.force_layout();
    Ok(view.scroll_offset())
}

#[cfg(test)]
#[path = "restore_tests.rs"]
mod tests;
