#![allow(clippy::unwrap_used, dead_code)]

// In-memory chat directory and media server used by the core tests.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use streamcord_core::format::library_identity_from_name;
use streamcord_core::{
    ChatDirectory, CoreError, DesiredResource, LibrarySummary, MediaItem, MediaServer,
    ObservedResource, RecentMessage, ResourceHandle, ResourceKey, ResourceKind, ServerKind,
    StreamSession,
};

pub const CATEGORY: u64 = 900;
pub const STATUS_CHANNEL: u64 = 901;
pub const RECENT_CHANNEL: u64 = 902;

/// One directory call, in the order it reached the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create(ResourceKey),
    Update(ResourceKey),
    Delete(ResourceHandle),
}

#[derive(Debug, Clone)]
struct Channel {
    parent: u64,
    name: String,
}

#[derive(Debug, Clone)]
struct Message {
    channel: u64,
    body: String,
    by_bot: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    channels: BTreeMap<u64, Channel>,
    messages: BTreeMap<u64, Message>,
    ops: Vec<Op>,
    failing_keys: HashSet<ResourceKey>,
    failing_deletes: HashSet<ResourceHandle>,
    list_unavailable: bool,
    lookup_unavailable: bool,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct FakeDirectory {
    state: Mutex<State>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    pub fn seed_channel(&self, parent: u64, name: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.channels.insert(
            id,
            Channel {
                parent,
                name: name.to_owned(),
            },
        );
        id
    }

    pub fn seed_message(&self, channel: u64, body: &str, by_bot: bool) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.messages.insert(
            id,
            Message {
                channel,
                body: body.to_owned(),
                by_bot,
            },
        );
        id
    }

    pub fn remove_message(&self, id: u64) {
        self.state.lock().unwrap().messages.remove(&id);
    }

    /// Rewrite a message body the way a moderator editing it would.
    pub fn edit_message_by_hand(&self, id: u64, body: &str) {
        let mut state = self.state.lock().unwrap();
        let message = state.messages.get_mut(&id).unwrap();
        message.body = body.to_owned();
    }

    /// Id of the only message in `channel`.
    pub fn sole_message(&self, channel: u64) -> u64 {
        let state = self.state.lock().unwrap();
        let ids: Vec<u64> = state
            .messages
            .iter()
            .filter(|(_, m)| m.channel == channel)
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(ids.len(), 1, "expected one message in {channel}");
        ids[0]
    }

    pub fn fail_key(&self, key: ResourceKey) {
        self.state.lock().unwrap().failing_keys.insert(key);
    }

    pub fn fail_delete(&self, handle: ResourceHandle) {
        self.state.lock().unwrap().failing_deletes.insert(handle);
    }

    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_keys.clear();
        state.failing_deletes.clear();
        state.list_unavailable = false;
        state.lookup_unavailable = false;
    }

    pub fn set_list_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().list_unavailable = unavailable;
    }

    pub fn set_lookup_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().lookup_unavailable = unavailable;
    }

    /// Channel names under `parent`, sorted.
    pub fn channel_names(&self, parent: u64) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .channels
            .values()
            .filter(|c| c.parent == parent)
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn channel_exists(&self, id: u64) -> bool {
        self.state.lock().unwrap().channels.contains_key(&id)
    }

    /// Bodies of every message in `channel`, oldest first.
    pub fn message_bodies(&self, channel: u64) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .values()
            .filter(|m| m.channel == channel)
            .map(|m| m.body.clone())
            .collect()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }
}

fn failed(key: impl ToString) -> CoreError {
    CoreError::ChatOperationFailed {
        key: key.to_string(),
        reason: "injected failure".into(),
    }
}

fn missing(key: impl ToString) -> CoreError {
    CoreError::ChatResourceMissing {
        key: key.to_string(),
    }
}

#[async_trait]
impl ChatDirectory for FakeDirectory {
    async fn list_managed_resources(
        &self,
        container_id: u64,
    ) -> Result<Vec<ObservedResource>, CoreError> {
        let state = self.state.lock().unwrap();
        if state.list_unavailable {
            return Err(CoreError::DirectoryUnavailable {
                reason: "gateway down".into(),
            });
        }
        Ok(state
            .channels
            .iter()
            .filter(|(_, c)| c.parent == container_id)
            .map(|(id, c)| ObservedResource {
                kind: ResourceKind::LibraryVoiceChannel,
                key: library_identity_from_name(&c.name).map_or_else(
                    || ResourceKey::Unrecognized(id.to_string()),
                    ResourceKey::Library,
                ),
                handle: ResourceHandle::Channel { channel_id: *id },
                content: c.name.clone(),
            })
            .collect())
    }

    async fn create_resource(
        &self,
        container_id: u64,
        desired: &DesiredResource,
    ) -> Result<ResourceHandle, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Create(desired.key.clone()));
        if state.failing_keys.contains(&desired.key) {
            return Err(failed(&desired.key));
        }
        let id = state.allocate();
        if desired.kind == ResourceKind::LibraryVoiceChannel {
            state.channels.insert(
                id,
                Channel {
                    parent: container_id,
                    name: desired.content.clone(),
                },
            );
            Ok(ResourceHandle::Channel { channel_id: id })
        } else {
            state.messages.insert(
                id,
                Message {
                    channel: container_id,
                    body: desired.content.clone(),
                    by_bot: true,
                },
            );
            Ok(ResourceHandle::Message {
                channel_id: container_id,
                message_id: id,
            })
        }
    }

    async fn update_resource(
        &self,
        handle: ResourceHandle,
        desired: &DesiredResource,
    ) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Update(desired.key.clone()));
        if state.failing_keys.contains(&desired.key) {
            return Err(failed(&desired.key));
        }
        match handle {
            ResourceHandle::Channel { channel_id } => {
                let channel = state
                    .channels
                    .get_mut(&channel_id)
                    .ok_or_else(|| missing(&desired.key))?;
                channel.name.clone_from(&desired.content);
            }
            ResourceHandle::Message { message_id, .. } => {
                let message = state
                    .messages
                    .get_mut(&message_id)
                    .ok_or_else(|| missing(&desired.key))?;
                message.body.clone_from(&desired.content);
            }
        }
        Ok(())
    }

    async fn delete_resource(&self, handle: ResourceHandle) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Delete(handle));
        if state.failing_deletes.contains(&handle) {
            return Err(failed(handle));
        }
        let removed = match handle {
            ResourceHandle::Channel { channel_id } => state.channels.remove(&channel_id).is_some(),
            ResourceHandle::Message { message_id, .. } => {
                state.messages.remove(&message_id).is_some()
            }
        };
        if removed { Ok(()) } else { Err(missing(handle)) }
    }

    async fn read_message(&self, handle: ResourceHandle) -> Result<Option<String>, CoreError> {
        let state = self.state.lock().unwrap();
        if state.lookup_unavailable {
            return Err(failed(handle));
        }
        let ResourceHandle::Message { message_id, .. } = handle else {
            return Ok(None);
        };
        Ok(state.messages.get(&message_id).map(|m| m.body.clone()))
    }

    async fn find_recent_bot_message(
        &self,
        channel_id: u64,
        lookback: u8,
    ) -> Result<Option<RecentMessage>, CoreError> {
        let state = self.state.lock().unwrap();
        if state.lookup_unavailable {
            return Err(failed(format!("channel {channel_id}")));
        }
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|(_, m)| m.channel == channel_id)
            .take(usize::from(lookback))
            .find(|(_, m)| m.by_bot)
            .map(|(id, m)| RecentMessage {
                handle: ResourceHandle::Message {
                    channel_id,
                    message_id: *id,
                },
                body: m.body.clone(),
            }))
    }
}

// ── Media server ────────────────────────────────────────────────────

/// One scripted response per cycle; the last entry repeats.
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok(Vec<StreamSession>),
    Unreachable,
}

pub struct FakeServer {
    sessions: Mutex<VecDeque<Scripted>>,
    libraries: Mutex<Vec<LibrarySummary>>,
    recent: Mutex<Option<Vec<MediaItem>>>,
    calls: Mutex<Vec<tokio::time::Instant>>,
    on_fetch: Mutex<Option<Box<dyn Fn(usize) + Send>>>,
}

impl FakeServer {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            sessions: Mutex::new(script.into()),
            libraries: Mutex::new(Vec::new()),
            recent: Mutex::new(Some(Vec::new())),
            calls: Mutex::new(Vec::new()),
            on_fetch: Mutex::new(None),
        }
    }

    pub fn set_libraries(&self, libraries: Vec<LibrarySummary>) {
        *self.libraries.lock().unwrap() = libraries;
    }

    /// `None` makes the recently added query fail.
    pub fn set_recent(&self, recent: Option<Vec<MediaItem>>) {
        *self.recent.lock().unwrap() = recent;
    }

    /// Called with the 1-based cycle number on every session fetch.
    pub fn on_fetch(&self, hook: impl Fn(usize) + Send + 'static) {
        *self.on_fetch.lock().unwrap() = Some(Box::new(hook));
    }

    /// Instants at which sessions were fetched.
    pub fn calls(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaServer for FakeServer {
    fn kind(&self) -> ServerKind {
        ServerKind::Jellyfin
    }

    async fn fetch_sessions(&self) -> Result<Vec<StreamSession>, CoreError> {
        let cycle = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(tokio::time::Instant::now());
            calls.len()
        };
        if let Some(hook) = self.on_fetch.lock().unwrap().as_ref() {
            hook(cycle);
        }

        let mut script = self.sessions.lock().unwrap();
        let step = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        };
        match step {
            Scripted::Ok(sessions) => Ok(sessions),
            Scripted::Unreachable => Err(CoreError::UpstreamUnavailable {
                reason: "connection refused".into(),
            }),
        }
    }

    async fn fetch_libraries(&self) -> Result<Vec<LibrarySummary>, CoreError> {
        Ok(self.libraries.lock().unwrap().clone())
    }

    async fn fetch_recently_added(&self, limit: usize) -> Result<Vec<MediaItem>, CoreError> {
        match self.recent.lock().unwrap().as_ref() {
            Some(items) => Ok(items.iter().take(limit).cloned().collect()),
            None => Err(CoreError::UpstreamUnavailable {
                reason: "items query timed out".into(),
            }),
        }
    }
}
