// ── Chat-side resources ──
//
// Desired and observed resources share one key space so the reconciler
// can diff them without knowing anything about Discord.

use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::model::library::LibraryKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    StatusMessage,
    LibraryVoiceChannel,
    RecentlyAddedMessage,
}

impl ResourceKind {
    pub fn is_message(self) -> bool {
        matches!(self, Self::StatusMessage | Self::RecentlyAddedMessage)
    }
}

/// Stable identity of a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResourceKey {
    Status,
    RecentlyAdded,
    Library(LibraryKey),
    /// An observed resource in a managed container whose name maps to no
    /// known key. Never desired, so always scheduled for deletion.
    Unrecognized(String),
}

impl ResourceKey {
    /// The key two resources are matched on during a diff.
    pub fn identity(&self) -> Self {
        match self {
            Self::Library(key) => Self::Library(key.identity()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => f.write_str("status"),
            Self::RecentlyAdded => f.write_str("recently_added"),
            Self::Library(key) => write!(f, "{key}"),
            Self::Unrecognized(id) => write!(f, "unrecognized:{id}"),
        }
    }
}

/// Where an existing resource lives on the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceHandle {
    Channel { channel_id: u64 },
    Message { channel_id: u64, message_id: u64 },
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel { channel_id } => write!(f, "channel {channel_id}"),
            Self::Message {
                channel_id,
                message_id,
            } => write!(f, "message {message_id} in {channel_id}"),
        }
    }
}

/// A resource this system wants to exist, with its exact content.
///
/// `content` is the channel name for voice channels and the body for
/// messages, already truncated to the surface's cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredResource {
    pub kind: ResourceKind,
    pub key: ResourceKey,
    pub content: String,
}

/// A resource as found on the chat platform at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedResource {
    pub kind: ResourceKind,
    pub key: ResourceKey,
    pub handle: ResourceHandle,
    pub content: String,
}
