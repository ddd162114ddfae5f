//! Nova Player Core
//!
//! Platform-agnostic track types, traits, and error handling shared by the
//! playback libraries and the player application.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `SourceKind`
//! - **Collaborator Traits**: `RecentlyPlayed` (the metadata repository seam)
//! - **Error Handling**: Unified `NovaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use nova_core::{SourceKind, Track, TrackId};
//!
//! let track = Track::new(
//!     TrackId::new("yt:dQw4w9WgXcQ"),
//!     "Never Gonna Give You Up",
//!     "Rick Astley",
//!     "Whenever You Need Somebody",
//!     "https://example.invalid/yt_audio?video_id=dQw4w9WgXcQ",
//! );
//!
//! assert_eq!(track.id.source_kind(), SourceKind::YouTube);
//! assert_eq!(track.id.key(), "dQw4w9WgXcQ");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{NovaError, Result};
pub use traits::RecentlyPlayed;
pub use types::{SourceKind, Track, TrackId};
