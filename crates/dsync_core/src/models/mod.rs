//! Data models shared across DSync components.
//!
//! - Enums for component kinds and subtitle split methods
//! - The tolerance band every duration is judged against

mod band;
mod enums;

pub use band::{BandError, Deviation, ToleranceBand};
pub use enums::{ComponentKind, SplitMethod, UnknownComponentKind};
