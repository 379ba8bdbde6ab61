//! Coordinate newtypes
//!
//! Buffer coordinates are stable across reflow; screen coordinates are not.
//! Keeping them as distinct types stops a screen row from being stored in an
//! anchor by accident.

use std::fmt;

/// Line index in the document. Invariant under reflow. 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BufferRow(usize);

impl BufferRow {
    /// Create a new BufferRow from a raw 0-based line index.
    pub fn new(row: usize) -> Self {
        Self(row)
    }

    /// Get the raw 0-based line index.
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BufferRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rendered visual row. Changes whenever soft-wrap or font metrics change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScreenRow(usize);

impl ScreenRow {
    /// Create a new ScreenRow from a raw 0-based row index.
    pub fn new(row: usize) -> Self {
        Self(row)
    }

    /// Get the raw 0-based row index.
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ScreenRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cursor position in buffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BufferPosition {
    /// Buffer line.
    pub row: BufferRow,
    /// Column within the line, in characters.
    pub column: usize,
}

impl BufferPosition {
    /// Create a new buffer position.
    pub fn new(row: usize, column: usize) -> Self {
        Self {
            row: BufferRow::new(row),
            column,
        }
    }
}
