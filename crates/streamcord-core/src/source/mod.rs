// ── Media server adapters ──
//
// One `MediaServer` implementation per vendor. Each maps its vendor's
// session and library payloads into the unified model; record-level
// problems are absorbed here and only whole-request failures reach the
// caller.

mod emby;
mod jellyfin;
pub(crate) mod library;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use streamcord_api::{EmbyClient, JellyfinClient};

use crate::config::{ServerKind, UpstreamConfig};
use crate::error::CoreError;
use crate::model::{LibrarySummary, MediaItem, StreamSession};

pub use emby::EmbySource;
pub use jellyfin::JellyfinSource;

/// Normalized query surface over one media server.
#[async_trait]
pub trait MediaServer: Send + Sync {
    fn kind(&self) -> ServerKind;

    /// Sessions currently playing something. Idle sessions are dropped.
    async fn fetch_sessions(&self) -> Result<Vec<StreamSession>, CoreError>;

    /// Item counts of every countable library.
    async fn fetch_libraries(&self) -> Result<Vec<LibrarySummary>, CoreError>;

    /// Up to `limit` recently added items of displayable types.
    async fn fetch_recently_added(&self, limit: usize) -> Result<Vec<MediaItem>, CoreError>;
}

/// Build the adapter for the configured vendor.
pub fn connect(config: &UpstreamConfig) -> Result<Box<dyn MediaServer>, CoreError> {
    let transport = config.transport();
    let source: Box<dyn MediaServer> = match config.kind {
        ServerKind::Emby => {
            let client = EmbyClient::new(config.url.clone(), &config.api_key, &transport)?;
            Box::new(EmbySource::new(client, config.user_id.clone()))
        }
        ServerKind::Jellyfin => {
            let client = JellyfinClient::new(config.url.clone(), &config.api_key, &transport)?;
            Box::new(JellyfinSource::new(client, config.user_id.clone()))
        }
    };
    Ok(source)
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Decode raw session records one by one, skipping the malformed ones.
pub(crate) fn decode_sessions<T: DeserializeOwned>(
    raw: Vec<serde_json::Value>,
    normalize: impl Fn(&T) -> Option<StreamSession>,
) -> Vec<StreamSession> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(session) => normalize(&session),
            Err(e) => {
                let err = CoreError::UpstreamRecordMalformed {
                    record: format!("session #{index}"),
                    reason: e.to_string(),
                };
                warn!(error = %err, "skipping session");
                None
            }
        })
        .collect()
}

/// Lazily resolved user id for recently-added queries.
///
/// Seeded from configuration when present; otherwise resolved on first
/// use and reused for the lifetime of the adapter.
pub(crate) struct UserSlot {
    cell: OnceCell<String>,
}

impl UserSlot {
    pub(crate) fn new(configured: Option<String>) -> Self {
        Self {
            cell: OnceCell::new_with(configured.filter(|id| !id.is_empty())),
        }
    }

    pub(crate) async fn get_or_resolve<F, Fut>(&self, resolve: F) -> Result<Option<&str>, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<String>, streamcord_api::Error>>,
    {
        // `Err(None)`: the server named no user; nothing is cached and the
        // next call tries again.
        let resolved = self
            .cell
            .get_or_try_init(|| async {
                match resolve().await {
                    Ok(Some(id)) => {
                        info!(user_id = %id, "resolved media server user");
                        Ok(id)
                    }
                    Ok(None) => Err(None),
                    Err(e) => Err(Some(CoreError::from(e))),
                }
            })
            .await;

        match resolved {
            Ok(id) => Ok(Some(id.as_str())),
            Err(None) => Ok(None),
            Err(Some(e)) => Err(e),
        }
    }
}

/// Normalize recently added items, keeping at most `limit`.
pub(crate) fn normalize_recent(
    items: &[streamcord_api::media::models::RecentItem],
    limit: usize,
) -> Vec<MediaItem> {
    let now = chrono::Utc::now();
    items
        .iter()
        .filter_map(|item| crate::convert::media_item(item, now))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use streamcord_api::media::models::EmbySession;

    use super::*;
    use crate::convert::stream_from_emby;

    #[test]
    fn malformed_session_is_skipped() {
        let raw = vec![
            json!({
                "UserName": "alice",
                "NowPlayingItem": { "Name": "Heat", "Type": "Movie" },
                "PlayState": { "PositionTicks": 10 }
            }),
            json!({ "UserName": 42, "PlayState": "garbage" }),
            json!({
                "UserName": "bob",
                "NowPlayingItem": { "Name": "Dune", "Type": "Movie" },
                "PlayState": { "PositionTicks": 20 }
            }),
        ];

        let sessions = decode_sessions::<EmbySession>(raw, stream_from_emby);

        let users: Vec<_> = sessions.iter().map(|s| s.user.as_str()).collect();
        assert_eq!(users, ["alice", "bob"]);
    }

    #[tokio::test]
    async fn configured_user_skips_resolution() {
        let slot = UserSlot::new(Some("u1".into()));
        let id = slot
            .get_or_resolve(|| async { Err(streamcord_api::Error::Tls("unreachable".into())) })
            .await
            .ok()
            .flatten();
        assert_eq!(id, Some("u1"));
    }

    #[tokio::test]
    async fn resolved_user_is_cached() {
        let slot = UserSlot::new(None);
        let first = slot
            .get_or_resolve(|| async { Ok(Some("admin".to_owned())) })
            .await
            .ok()
            .flatten()
            .map(str::to_owned);
        let second = slot
            .get_or_resolve(|| async { Ok(None) })
            .await
            .ok()
            .flatten();
        assert_eq!(first.as_deref(), Some("admin"));
        assert_eq!(second, Some("admin"));
    }

    #[tokio::test]
    async fn unresolved_user_is_retried() {
        let slot = UserSlot::new(None);
        let first = slot.get_or_resolve(|| async { Ok(None) }).await.ok().flatten();
        let failed = slot
            .get_or_resolve(|| async { Err(streamcord_api::Error::Tls("handshake".into())) })
            .await;
        let third = slot
            .get_or_resolve(|| async { Ok(Some("admin".to_owned())) })
            .await
            .ok()
            .flatten();

        assert_eq!(first, None);
        assert!(failed.is_err());
        assert_eq!(third, Some("admin"));
    }

    #[tokio::test]
    async fn concurrent_callers_resolve_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let slot = UserSlot::new(None);
        let calls = AtomicUsize::new(0);
        let resolve = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(Some("admin".to_owned()))
        };

        let (a, b) = tokio::join!(slot.get_or_resolve(resolve), slot.get_or_resolve(resolve));

        assert_eq!(a.ok().flatten(), Some("admin"));
        assert_eq!(b.ok().flatten(), Some("admin"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
