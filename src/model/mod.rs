//! Domain model types (pure).
//!
//! Identifiers, coordinate newtypes, the anchor, and the error taxonomy.

pub mod anchor;
pub mod error;
pub mod identifiers;
pub mod types;

// Re-export for convenience
pub use anchor::{Anchor, InvalidReferencePolicy, ReferencePolicy, SampleMode};
pub use error::{RestoreError, SampleError};
pub use identifiers::{PaneId, SubscriptionId, ViewId};
pub use types::{BufferPosition, BufferRow, ScreenRow};
