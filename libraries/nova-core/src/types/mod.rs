//! Domain types for Nova Player

mod ids;
mod track;

pub use ids::{SourceKind, TrackId};
pub use track::Track;
