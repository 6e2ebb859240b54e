use std::fmt;

use tracing::{debug, info, warn};

use crate::config::{DiscordConfig, DisplayOptions};
use crate::error::CoreError;
use crate::model::{DesiredResource, ResourceHandle, ResourceKey, ResourceKind};
use crate::reconcile::plan::{Plan, diff};
use crate::reconcile::{ChatDirectory, RecentMessage};

/// How far back to look for a previous bot message.
const MESSAGE_LOOKBACK: u8 = 10;

/// Where each kind of managed resource lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileTargets {
    /// Category holding the library channels. `None` leaves library
    /// channels unmanaged: nothing under the category is listed, created
    /// or deleted.
    pub library_category: Option<u64>,
    pub status_channel: u64,
    pub recently_added_channel: u64,
}

impl ReconcileTargets {
    /// Targets for the configured guild. Library channels are managed only
    /// while library counts are shown.
    pub fn from_config(discord: &DiscordConfig, display: &DisplayOptions) -> Self {
        Self {
            library_category: display
                .show_library_counts
                .then_some(discord.library_category_id),
            status_channel: discord.status_channel_id,
            recently_added_channel: discord.recently_added_channel_id,
        }
    }

    fn container_for(&self, kind: ResourceKind) -> Option<u64> {
        match kind {
            ResourceKind::StatusMessage => Some(self.status_channel),
            ResourceKind::RecentlyAddedMessage => Some(self.recently_added_channel),
            ResourceKind::LibraryVoiceChannel => self.library_category,
        }
    }
}

/// Message handles carried across cycles. Never persisted.
///
/// Only the handle survives a cycle; the message body is read back from
/// the directory every time it is compared.
#[derive(Debug, Clone, Default)]
pub struct MessageHandles {
    status: Option<ResourceHandle>,
    recently_added: Option<ResourceHandle>,
}

impl MessageHandles {
    fn slot(&mut self, kind: ResourceKind) -> Option<&mut Option<ResourceHandle>> {
        match kind {
            ResourceKind::StatusMessage => Some(&mut self.status),
            ResourceKind::RecentlyAddedMessage => Some(&mut self.recently_added),
            ResourceKind::LibraryVoiceChannel => None,
        }
    }

    fn hold(&mut self, kind: ResourceKind, handle: ResourceHandle) {
        if let Some(slot) = self.slot(kind) {
            *slot = Some(handle);
        }
    }

    fn release(&mut self, kind: ResourceKind) {
        if let Some(slot) = self.slot(kind) {
            *slot = None;
        }
    }

    /// Handle of the held message of `kind`, if any.
    pub fn handle(&self, kind: ResourceKind) -> Option<ResourceHandle> {
        match kind {
            ResourceKind::StatusMessage => self.status,
            ResourceKind::RecentlyAddedMessage => self.recently_added,
            ResourceKind::LibraryVoiceChannel => None,
        }
    }
}

/// Terminal state of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied,
    PartiallyFailed,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: Vec<ResourceKey>,
}

impl CycleReport {
    pub fn outcome(&self) -> CycleOutcome {
        if self.failed.is_empty() {
            CycleOutcome::Applied
        } else {
            CycleOutcome::PartiallyFailed
        }
    }

    pub fn operations(&self) -> usize {
        self.created + self.updated + self.deleted + self.failed.len()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} failed",
            self.created,
            self.updated,
            self.deleted,
            self.failed.len()
        )
    }
}

/// Brings the chat directory in line with a desired resource set.
///
/// Owns the held message handles; everything else is re-read from the
/// directory every cycle.
#[derive(Debug, Clone)]
pub struct Reconciler {
    targets: ReconcileTargets,
    handles: MessageHandles,
}

impl Reconciler {
    pub fn new(targets: ReconcileTargets) -> Self {
        Self {
            targets,
            handles: MessageHandles::default(),
        }
    }

    pub fn handles(&self) -> &MessageHandles {
        &self.handles
    }

    /// Run one pass.
    ///
    /// Fails only when the directory cannot be listed. Individual
    /// operation failures are logged, recorded in the report, and do not
    /// stop the remaining operations.
    pub async fn reconcile(
        &mut self,
        directory: &dyn ChatDirectory,
        desired: &[DesiredResource],
    ) -> Result<CycleReport, CoreError> {
        let mut report = CycleReport::default();

        let mut plan = match self.targets.library_category {
            Some(category) => {
                let observed = directory.list_managed_resources(category).await?;
                let channels: Vec<DesiredResource> = desired
                    .iter()
                    .filter(|d| d.kind == ResourceKind::LibraryVoiceChannel)
                    .cloned()
                    .collect();
                diff(&channels, &observed)
            }
            None => Plan::default(),
        };

        for want in desired.iter().filter(|d| d.kind.is_message()) {
            self.plan_message(directory, want, &mut plan, &mut report)
                .await;
        }

        debug!(operations = plan.len(), "applying reconciliation plan");
        self.apply(directory, plan, &mut report).await;

        if report.failed.is_empty() {
            info!(%report, "reconciliation applied");
        } else {
            warn!(%report, "reconciliation partially failed");
        }
        Ok(report)
    }

    /// Decide create or update for one message resource.
    ///
    /// The message is observed fresh: the held handle is read back, and
    /// without one (or once it has vanished) the bot's most recent message
    /// in the target channel is adopted. Only when neither exists is a
    /// create planned.
    async fn plan_message(
        &mut self,
        directory: &dyn ChatDirectory,
        want: &DesiredResource,
        plan: &mut Plan,
        report: &mut CycleReport,
    ) {
        let Some(channel) = self.targets.container_for(want.kind) else {
            return;
        };

        match self.observe_message(directory, want.kind, channel).await {
            Ok(Some(RecentMessage { handle, body })) => {
                if body != want.content {
                    plan.updates.push((handle, want.clone()));
                }
            }
            Ok(None) => plan.creates.push(want.clone()),
            Err(e) => {
                warn!(key = %want.key, error = %e, "message lookup failed, skipping this cycle");
                report.failed.push(want.key.clone());
            }
        }
    }

    /// The current message of `kind` as the directory holds it now.
    async fn observe_message(
        &mut self,
        directory: &dyn ChatDirectory,
        kind: ResourceKind,
        channel: u64,
    ) -> Result<Option<RecentMessage>, CoreError> {
        if let Some(handle) = self.handles.handle(kind) {
            if let Some(body) = directory.read_message(handle).await? {
                return Ok(Some(RecentMessage { handle, body }));
            }
            debug!(%kind, %handle, "held message is gone");
            self.handles.release(kind);
        }

        let found = directory
            .find_recent_bot_message(channel, MESSAGE_LOOKBACK)
            .await?;
        if let Some(message) = &found {
            debug!(%kind, handle = %message.handle, "adopting previous bot message");
            self.handles.hold(kind, message.handle);
        }
        Ok(found)
    }

    async fn apply(&mut self, directory: &dyn ChatDirectory, plan: Plan, report: &mut CycleReport) {
        for want in plan.creates {
            let Some(container) = self.targets.container_for(want.kind) else {
                continue;
            };
            match directory.create_resource(container, &want).await {
                Ok(handle) => {
                    debug!(key = %want.key, %handle, "created");
                    self.handles.hold(want.kind, handle);
                    report.created += 1;
                }
                Err(e) => {
                    warn!(key = %want.key, error = %e, "create failed");
                    report.failed.push(want.key);
                }
            }
        }

        for (handle, want) in plan.updates {
            match directory.update_resource(handle, &want).await {
                Ok(()) => {
                    debug!(key = %want.key, %handle, "updated");
                    report.updated += 1;
                }
                Err(e) => {
                    if matches!(e, CoreError::ChatResourceMissing { .. }) {
                        self.handles.release(want.kind);
                    }
                    warn!(key = %want.key, error = %e, "update failed");
                    report.failed.push(want.key);
                }
            }
        }

        for have in plan.deletes {
            match directory.delete_resource(have.handle).await {
                Ok(()) => {
                    debug!(key = %have.key, handle = %have.handle, "deleted");
                    report.deleted += 1;
                }
                Err(e) => {
                    warn!(key = %have.key, error = %e, "delete failed");
                    report.failed.push(have.key);
                }
            }
        }
    }
}
