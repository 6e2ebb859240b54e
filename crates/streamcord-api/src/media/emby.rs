// Emby HTTP client
//
// Thin wrapper over `reqwest::Client` that injects the `X-Emby-Token`
// header, builds endpoint URLs under the configured base, and decodes
// responses. Sessions come back as raw JSON values so the caller can
// skip a malformed record without losing the whole batch.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::media::models::{
    ItemCountQuery, ItemsPage, MediaFolder, MediaFoldersResponse, RecentItem, User,
};
use crate::transport::{TransportConfig, decode_json};

/// Item types requested for the recently-added listing.
const RECENT_ITEM_TYPES: &str = "Movie,Episode,Series,Season,MusicVideo,Audio";

/// Raw HTTP client for an Emby server.
pub struct EmbyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl EmbyClient {
    /// Create a client that authenticates every request with `api_key`.
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            Error::Authentication {
                message: "API key contains characters not allowed in a header".into(),
            }
        })?;
        token.set_sensitive(true);
        headers.insert("X-Emby-Token", token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(Error::Transport)?;

        decode_json(resp).await
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// List every session known to the server, active or idle.
    ///
    /// `GET /Sessions`
    pub async fn list_sessions(&self) -> Result<Vec<serde_json::Value>, Error> {
        let sessions: Option<Vec<serde_json::Value>> = self.get("/Sessions", &[]).await?;
        Ok(sessions.unwrap_or_default())
    }

    /// List the top-level library folders.
    ///
    /// `GET /Library/MediaFolders`
    pub async fn list_media_folders(&self) -> Result<Vec<MediaFolder>, Error> {
        let resp: MediaFoldersResponse = self.get("/Library/MediaFolders", &[]).await?;
        Ok(resp.items)
    }

    /// Count the items matching `query`.
    ///
    /// `GET /Items?ParentId=..&Recursive=true&IncludeItemTypes=..&Limit=0`
    pub async fn count_items(&self, query: &ItemCountQuery) -> Result<u64, Error> {
        debug!(parent_id = %query.parent_id, types = %query.include_item_types, "counting items");
        let page: ItemsPage<serde_json::Value> = self.get("/Items", &query.to_params()).await?;
        Ok(page.total_record_count)
    }

    /// Most recently added items for `user_id`, newest first.
    ///
    /// Tries `GET /Users/{id}/Items/Latest` first; when that comes back
    /// empty, falls back to a date-sorted `GET /Users/{id}/Items`.
    pub async fn recently_added(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentItem>, Error> {
        let mut params = vec![
            ("Limit", limit.to_string()),
            ("Fields", "DateCreated,Path,PremiereDate".to_owned()),
            ("SortBy", "DateCreated,SortName".to_owned()),
            ("SortOrder", "Descending".to_owned()),
            ("Recursive", "true".to_owned()),
            ("IncludeItemTypes", RECENT_ITEM_TYPES.to_owned()),
            ("ImageTypeLimit", "1".to_owned()),
            ("EnableImageTypes", "Primary".to_owned()),
        ];

        let latest: Option<Vec<RecentItem>> = self
            .get(&format!("/Users/{user_id}/Items/Latest"), &params)
            .await?;
        if let Some(items) = latest.filter(|items| !items.is_empty()) {
            return Ok(items);
        }

        debug!("latest endpoint returned no items, falling back to sorted item query");
        if let Some(sort) = params.iter_mut().find(|(k, _)| *k == "SortBy") {
            sort.1 = "DateCreated".to_owned();
        }
        let page: ItemsPage<RecentItem> =
            self.get(&format!("/Users/{user_id}/Items"), &params).await?;
        Ok(page.items)
    }

    /// Resolve the user id the API key acts as.
    ///
    /// `GET /Users/Me` when the key is bound to a user; otherwise the
    /// first administrator from `GET /Users`, then the first user at all.
    pub async fn resolve_user_id(&self) -> Result<Option<String>, Error> {
        match self.get::<Option<User>>("/Users/Me", &[]).await {
            Ok(Some(me)) => return Ok(Some(me.id)),
            Ok(None) => {}
            Err(e) if e.is_unreachable() => return Err(e),
            Err(e) => debug!(error = %e, "/Users/Me unavailable, scanning user list"),
        }

        let users: Vec<User> = self.get("/Users", &[]).await?;
        let chosen = users
            .iter()
            .find(|u| u.is_administrator())
            .or_else(|| users.first())
            .map(|u| u.id.clone());
        Ok(chosen)
    }
}
