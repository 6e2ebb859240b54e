// ── Desired-state builder ──
//
// Composes the full target resource set for one cycle from the unified
// model. Pure: the same inputs always produce the same resources in the
// same order.

use crate::config::DisplayOptions;
use crate::format::{channel_name, recently_added_body, status_body};
use crate::model::{
    DesiredResource, LibrarySummary, MediaItem, ResourceKey, ResourceKind, ServerSnapshot,
};

/// Inputs gathered from the media server for one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    pub snapshot: ServerSnapshot,
    pub libraries: Vec<LibrarySummary>,
    /// `None` when the recently added query failed this cycle; the
    /// message is then left as it is.
    pub recently_added: Option<Vec<MediaItem>>,
}

/// Target resources for one cycle.
///
/// Always contains exactly one status message. Contains one library
/// channel per library when library counts are enabled,
/// and one recently-added message whenever that data was fetched.
pub fn build_desired(inputs: &CycleInputs, display: &DisplayOptions) -> Vec<DesiredResource> {
    let mut desired = vec![DesiredResource {
        kind: ResourceKind::StatusMessage,
        key: ResourceKey::Status,
        content: status_body(&inputs.snapshot, display),
    }];

    if display.show_library_counts {
        desired.extend(library_channels(&inputs.libraries));
    }

    if let Some(items) = &inputs.recently_added {
        desired.push(DesiredResource {
            kind: ResourceKind::RecentlyAddedMessage,
            key: ResourceKey::RecentlyAdded,
            content: recently_added_body(items),
        });
    }

    desired
}

/// One channel per library, keyed on its full key and ordered by it.
/// Libraries that render the same label (e.g. "Movies" and "Kids Movies")
/// keep separate channels with their own counts.
fn library_channels(libraries: &[LibrarySummary]) -> Vec<DesiredResource> {
    let mut sorted: Vec<&LibrarySummary> = libraries.iter().collect();
    sorted.sort_by_key(|summary| summary.key());

    sorted
        .into_iter()
        .map(|summary| DesiredResource {
            kind: ResourceKind::LibraryVoiceChannel,
            key: ResourceKey::Library(summary.key()),
            content: channel_name(summary),
        })
        .collect()
}
