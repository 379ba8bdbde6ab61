//! AnchorTracker - samples the reading position of a view.
//!
//! A sample turns volatile screen geometry into an [`Anchor`] in buffer
//! coordinates. Both sampling modes project the anchored row the same way the
//! restorer does (top pixel of the row's first screen line), so a sample taken
//! right after a restore reproduces the anchor it was restored from.

use crate::host::EditorView;
use crate::model::{Anchor, BufferRow, ReferencePolicy, SampleError, SampleMode};
use tracing::trace;

/// Holds the latest anchor of one view.
#[derive(Debug, Clone)]
pub struct AnchorTracker {
    policy: ReferencePolicy,
    anchor: Option<Anchor>,
}

impl AnchorTracker {
    /// Creates an uninitialized tracker.
    pub fn new(policy: ReferencePolicy) -> Self {
        Self {
            policy,
            anchor: None,
        }
    }

    /// Reference policy used for sampling.
    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    /// Latest anchor, `None` until the first successful sample.
    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    /// Returns true once a sample has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.anchor.is_some()
    }

    /// Take a sample and store it. On error the previous anchor is kept.
    pub fn sample(&mut self, view: &dyn EditorView, mode: SampleMode) -> Result<Anchor, SampleError> {
        match self.measure(view, mode) {
            Ok(anchor) => {
                self.anchor = Some(anchor);
                Ok(anchor)
            }
            Err(err) => {
                trace!(?mode, %err, "sample discarded");
                Err(err)
            }
        }
    }

    /// Replace the anchor wholesale (inherited from a copied view).
    pub fn adopt(&mut self, anchor: Anchor) {
        self.anchor = Some(anchor);
    }

    /// Compute an anchor from the current geometry without storing it.
    pub fn measure(&self, view: &dyn EditorView, mode: SampleMode) -> Result<Anchor, SampleError> {
        let reference = self
            .policy
            .reference_pixel(view.scroll_offset(), view.viewport_height());
        if !reference.is_finite() {
            return Err(SampleError::NonFiniteReference { pixel: reference });
        }

        let buffer_row = match mode {
            SampleMode::ViewportReference => {
                let screen_row = view
                    .screen_row_for_pixel(reference)
                    .ok_or(SampleError::RowUnavailable { pixel: reference })?;
                let row_count = view.screen_row_count();
                if screen_row.get() >= row_count {
                    return Err(SampleError::RowOutOfRange {
                        row: screen_row,
                        row_count,
                    });
                }
                view.buffer_row_for_screen_row(screen_row)
            }
            SampleMode::Cursor => view.cursor_position().ok_or(SampleError::NoCursor)?.row,
        };

        let projected = project(view, buffer_row)?;
        Ok(Anchor::new(buffer_row, projected - reference))
    }
}

/// Pixel top of the first screen line of `row`.
pub(crate) fn project(view: &dyn EditorView, row: BufferRow) -> Result<f64, SampleError> {
    view.screen_row_for_buffer_row(row)
        .and_then(|screen| view.pixel_for_screen_row(screen))
        .filter(|pixel| pixel.is_finite())
        .ok_or(SampleError::PixelUnavailable { row })
}
