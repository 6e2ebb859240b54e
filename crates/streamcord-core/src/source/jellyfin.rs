use async_trait::async_trait;
use tracing::{debug, warn};

use streamcord_api::JellyfinClient;
use streamcord_api::media::models::JellyfinSession;

use crate::config::ServerKind;
use crate::convert::stream_from_jellyfin;
use crate::error::CoreError;
use crate::model::{LibrarySummary, MediaItem, StreamSession};
use crate::source::library::summarize_libraries;
use crate::source::{MediaServer, UserSlot, decode_sessions, normalize_recent};

/// `MediaServer` backed by a Jellyfin server.
pub struct JellyfinSource {
    client: JellyfinClient,
    user: UserSlot,
}

impl JellyfinSource {
    pub fn new(client: JellyfinClient, user_id: Option<String>) -> Self {
        Self {
            client,
            user: UserSlot::new(user_id),
        }
    }
}

#[async_trait]
impl MediaServer for JellyfinSource {
    fn kind(&self) -> ServerKind {
        ServerKind::Jellyfin
    }

    async fn fetch_sessions(&self) -> Result<Vec<StreamSession>, CoreError> {
        let raw = self.client.list_sessions().await?;
        let total = raw.len();
        let sessions = decode_sessions::<JellyfinSession>(raw, stream_from_jellyfin);
        debug!(total, active = sessions.len(), "fetched Jellyfin sessions");
        Ok(sessions)
    }

    async fn fetch_libraries(&self) -> Result<Vec<LibrarySummary>, CoreError> {
        let folders = self.client.list_media_folders().await?;
        Ok(summarize_libraries(&self.client, &folders).await)
    }

    async fn fetch_recently_added(&self, limit: usize) -> Result<Vec<MediaItem>, CoreError> {
        let Some(user_id) = self
            .user
            .get_or_resolve(|| self.client.resolve_user_id())
            .await?
        else {
            warn!("no Jellyfin administrator found for recently added query");
            return Ok(Vec::new());
        };

        let items = self.client.recently_added(user_id, limit).await?;
        Ok(normalize_recent(&items, limit))
    }
}
