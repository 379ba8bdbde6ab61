//! Reading-position anchor and the reference line it is measured against.

use super::types::BufferRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed viewport line the anchor's pixel offset is measured from.
///
/// Chosen once per registry and applied by both sampling and restoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Top edge of the viewport.
    Top,
    /// Vertical center of the viewport.
    #[default]
    Center,
}

impl ReferencePolicy {
    /// Fraction of the viewport height at which the reference line sits.
    pub fn fraction(&self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
        }
    }

    /// Pixel position of the reference line for a given scroll offset.
    pub fn reference_pixel(&self, scroll_offset: f64, viewport_height: f64) -> f64 {
        scroll_offset + self.fraction() * viewport_height
    }
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Center => f.write_str("center"),
        }
    }
}

/// Error returned when parsing an unknown reference policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reference policy {0:?} (expected \"top\" or \"center\")")]
pub struct InvalidReferencePolicy(pub String);

impl FromStr for ReferencePolicy {
    type Err = InvalidReferencePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "center" | "centre" => Ok(Self::Center),
            _ => Err(InvalidReferencePolicy(s.to_string())),
        }
    }
}

/// How a sample chooses its buffer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Row under the reference line (wheel, smooth-scroll end).
    ViewportReference,
    /// Row of the primary cursor (cursor moves, first open).
    Cursor,
}

/// Stable framing of a view: a buffer row and where it sat relative to the
/// reference line.
///
/// Only ever replaced as a whole value, so a reader cannot observe a row from
/// one sample paired with the offset of another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// Anchored buffer line.
    pub buffer_row: BufferRow,
    /// Signed pixel distance from the reference line to the top of the
    /// row's first screen line. Negative means above the reference line.
    pub offset_from_reference: f64,
}

impl Anchor {
    /// Create a new anchor.
    pub fn new(buffer_row: BufferRow, offset_from_reference: f64) -> Self {
        Self {
            buffer_row,
            offset_from_reference,
        }
    }

    /// Scroll offset that puts the anchored row back at its recorded distance
    /// from the reference line, given where the row now projects.
    pub fn target_scroll_offset(
        &self,
        projected_pixel: f64,
        policy: ReferencePolicy,
        viewport_height: f64,
    ) -> f64 {
        projected_pixel - self.offset_from_reference - policy.fraction() * viewport_height
    }
}
