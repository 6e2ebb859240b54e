// ── Domain model ──

pub mod library;
pub mod recent;
pub mod resource;
pub mod stream;

pub use library::{LibraryFlags, LibraryKey, LibraryKind, LibrarySummary};
pub use recent::{MediaItem, RecentKind};
pub use resource::{DesiredResource, ObservedResource, ResourceHandle, ResourceKey, ResourceKind};
pub use stream::{MediaType, PlaybackState, ServerSnapshot, StreamSession};
