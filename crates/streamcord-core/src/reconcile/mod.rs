// ── Reconciliation ──
//
// Diffs the desired resource set against what the chat directory holds
// and applies the difference: creates, then updates, then deletes. Each
// operation fails on its own; only an unlistable directory aborts a
// cycle.

mod plan;
mod reconciler;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{DesiredResource, ObservedResource, ResourceHandle};

pub use plan::{Plan, diff};
pub use reconciler::{CycleOutcome, CycleReport, MessageHandles, ReconcileTargets, Reconciler};

/// A message found in channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentMessage {
    pub handle: ResourceHandle,
    pub body: String,
}

/// Addressable channels and messages on the chat platform.
///
/// Implementations map their own failures onto `CoreError`: listing
/// failures as `DirectoryUnavailable`, single operations as
/// `ChatOperationFailed`, and vanished targets as `ChatResourceMissing`.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Resources currently inside `container_id`, read fresh.
    async fn list_managed_resources(
        &self,
        container_id: u64,
    ) -> Result<Vec<ObservedResource>, CoreError>;

    /// Create `desired` inside `container_id`.
    async fn create_resource(
        &self,
        container_id: u64,
        desired: &DesiredResource,
    ) -> Result<ResourceHandle, CoreError>;

    /// Replace the content of an existing resource.
    async fn update_resource(
        &self,
        handle: ResourceHandle,
        desired: &DesiredResource,
    ) -> Result<(), CoreError>;

    async fn delete_resource(&self, handle: ResourceHandle) -> Result<(), CoreError>;

    /// Current body of the message behind `handle`, or `None` once it is
    /// gone.
    async fn read_message(&self, handle: ResourceHandle) -> Result<Option<String>, CoreError>;

    /// The newest message authored by this bot among the last `lookback`
    /// messages of `channel_id`.
    async fn find_recent_bot_message(
        &self,
        channel_id: u64,
        lookback: u8,
    ) -> Result<Option<RecentMessage>, CoreError>;
}
