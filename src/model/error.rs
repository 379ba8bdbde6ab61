//! Error types for anchor sampling and restoring.
//!
//! This module defines the failure taxonomy of the reactive core using `thiserror`.
//! None of these errors is fatal: every one of them means "no adjustment this time".
//!
//! # Error Hierarchy
//!
//! - [`SampleError`] - an anchor sample could not be taken; the previous anchor is kept
//! - [`RestoreError`] - a stored anchor could not be turned back into a scroll offset;
//!   the viewport is left where it is
//!
//! # Error Recovery Strategy
//!
//! Geometry queries against the host may answer "unavailable" while a layout pass is
//! in flight. Both error types are therefore recovered locally: the session logs them
//! at `debug`/`trace` level and drops them. They are returned (rather than swallowed at
//! the source) so tests can assert *why* an operation was abandoned.

use super::types::{BufferRow, ScreenRow};
use thiserror::Error;

/// Reasons a sample was discarded.
///
/// A discarded sample leaves the previous anchor untouched. This guards against
/// recording a bogus row while the host is between layout states.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SampleError {
    /// The reference pixel (scroll offset plus fraction of viewport height) is NaN
    /// or infinite.
    ///
    /// **When this occurs**: before the view has been measured, the host may report
    /// a non-finite viewport height or scroll offset.
    #[error("reference pixel is not finite ({pixel})")]
    NonFiniteReference {
        /// The computed reference pixel.
        pixel: f64,
    },

    /// The host could not map the reference pixel to a screen row.
    #[error("no screen row at pixel {pixel}")]
    RowUnavailable {
        /// Pixel that was looked up.
        pixel: f64,
    },

    /// The host returned a screen row past the end of the rendered rows.
    ///
    /// **When this occurs**: mid-reflow, when the row lookup uses the new geometry but
    /// the row count still reflects the old one (or vice versa).
    #[error("screen row {row} out of range (row count {row_count})")]
    RowOutOfRange {
        /// Row the host returned.
        row: ScreenRow,
        /// Rendered row count at the time of the query.
        row_count: usize,
    },

    /// The view has no primary cursor.
    #[error("view has no primary cursor")]
    NoCursor,

    /// The sampled buffer row could not be projected to a pixel position.
    #[error("buffer row {row} has no pixel projection")]
    PixelUnavailable {
        /// Buffer row that failed to project.
        row: BufferRow,
    },
}

/// Reasons a restore was abandoned.
///
/// An abandoned restore never moves the viewport, so the user sees at most a missed
/// micro-adjustment, never a jump to an arbitrary location.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RestoreError {
    /// A geometry query answered "unavailable" (layout in flight, view not measured).
    #[error("geometry unavailable: {what}")]
    GeometryUnavailable {
        /// Which query failed, for logs.
        what: &'static str,
    },

    /// The anchored buffer row no longer maps to a screen row.
    ///
    /// **When this occurs**: the anchored line was deleted, or folded away, between
    /// sampling and restoring.
    #[error("anchored buffer row {row} no longer maps to a screen row")]
    StaleAnchor {
        /// The anchored row.
        row: BufferRow,
    },
}

impl From<SampleError> for RestoreError {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::PixelUnavailable { row } => RestoreError::StaleAnchor { row },
            SampleError::NonFiniteReference { .. } => RestoreError::GeometryUnavailable {
                what: "reference pixel",
            },
            SampleError::RowUnavailable { .. } | SampleError::RowOutOfRange { .. } => {
                RestoreError::GeometryUnavailable { what: "screen row" }
            }
            SampleError::NoCursor => RestoreError::GeometryUnavailable { what: "cursor" },
        }
    }
}
