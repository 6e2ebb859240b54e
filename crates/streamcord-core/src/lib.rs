//! Session normalization and chat reconciliation for streamcord.
//!
//! This crate owns the engine between the raw clients in `streamcord-api`
//! and the binary:
//!
//! - **Adapters** ([`source`]): [`EmbySource`] and [`JellyfinSource`]
//!   implement [`MediaServer`], normalizing two different session schemas
//!   into one [`StreamSession`] model and counting libraries under a shared
//!   query policy.
//!
//! - **Formatting** ([`format`]): pure rendering of channel names, status
//!   bodies and recently-added bodies, each capped to its surface limit.
//!
//! - **Desired state** ([`desired`]): the full target resource set for one
//!   cycle, keyed so that counts never change identity.
//!
//! - **Reconciliation** ([`reconcile`]): diff against the [`ChatDirectory`],
//!   apply creates, updates and deletes with per-resource fault isolation.
//!   [`DiscordDirectory`] is the production directory.
//!
//! - **Scheduling** ([`Poller`]): one cycle at a time, short backoff after a
//!   failed cycle, cooperative cancellation between cycles.

pub mod config;
pub mod convert;
pub mod desired;
pub mod directory;
pub mod error;
pub mod format;
pub mod model;
pub mod poller;
pub mod reconcile;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DiscordConfig, DisplayOptions, PollConfig, RuntimeConfig, ServerKind, UpstreamConfig,
};
pub use desired::{CycleInputs, build_desired};
pub use directory::DiscordDirectory;
pub use error::CoreError;
pub use poller::Poller;
pub use reconcile::{
    ChatDirectory, CycleOutcome, CycleReport, ReconcileTargets, Reconciler, RecentMessage,
};
pub use source::{EmbySource, JellyfinSource, MediaServer};
pub use streamcord_api::TransportConfig;

pub use model::{
    DesiredResource, LibraryFlags, LibraryKey, LibraryKind, LibrarySummary, MediaItem, MediaType,
    ObservedResource, PlaybackState, RecentKind, ResourceHandle, ResourceKey, ResourceKind,
    ServerSnapshot, StreamSession,
};
