// Jellyfin HTTP client
//
// Same endpoint family as Emby, but reverse-proxied installs frequently
// serve the API under a `/jellyfin` path. The first request probes the
// bare base URL and then the prefixed one; whichever answers is pinned
// for the lifetime of the client.

use std::sync::OnceLock;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::error::Error;
use crate::media::models::{
    ItemCountQuery, ItemsPage, MediaFolder, MediaFoldersResponse, RecentItem, User,
};
use crate::transport::{TransportConfig, decode_json};

/// Path prefixes probed in order until one answers.
const PREFIX_CANDIDATES: [&str; 2] = ["", "/jellyfin"];

/// Jellyfin only lists movies and episodes as recently added.
const RECENT_ITEM_TYPES: &str = "Movie,Episode";

/// Raw HTTP client for a Jellyfin server.
pub struct JellyfinClient {
    http: reqwest::Client,
    base_url: Url,
    prefix: OnceLock<&'static str>,
}

impl JellyfinClient {
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
        headers.insert("X-MediaBrowser-Token", token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            prefix: OnceLock::new(),
        }
    }

    /// The path prefix pinned by the first successful request, if any.
    pub fn detected_prefix(&self) -> Option<&'static str> {
        self.prefix.get().copied()
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn url(&self, prefix: &str, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            prefix,
            path
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_with_prefix<T: DeserializeOwned>(
        &self,
        prefix: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(prefix, path)?;
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

    /// GET under the pinned prefix, probing the candidates until one answers.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        if let Some(prefix) = self.prefix.get() {
            return self.get_with_prefix(prefix, path, query).await;
        }

        let mut last_err = None;
        for prefix in PREFIX_CANDIDATES {
            match self.get_with_prefix(prefix, path, query).await {
                Ok(value) => {
                    if self.prefix.set(prefix).is_ok() {
                        info!(prefix, "pinned Jellyfin API prefix");
                    }
                    return Ok(value);
                }
                Err(e @ Error::Authentication { .. }) => return Err(e),
                Err(e) => {
                    debug!(prefix, error = %e, "Jellyfin prefix probe failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(Error::NotFound {
            path: path.to_owned(),
        }))
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

    /// Most recently added movies and episodes for `user_id`, newest first.
    ///
    /// `GET /Users/{id}/Items?SortBy=DateCreated,SortName&SortOrder=Descending`
    pub async fn recently_added(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecentItem>, Error> {
        let params = [
            ("Limit", limit.to_string()),
            ("Fields", "Path,Overview,DateCreated".to_owned()),
            ("ImageTypeLimit", "1".to_owned()),
            ("EnableImageTypes", "Primary".to_owned()),
            ("SortBy", "DateCreated,SortName".to_owned()),
            ("SortOrder", "Descending".to_owned()),
            ("Recursive", "true".to_owned()),
            ("IncludeItemTypes", RECENT_ITEM_TYPES.to_owned()),
        ];

        let page: ItemsPage<RecentItem> =
            self.get(&format!("/Users/{user_id}/Items"), &params).await?;
        Ok(page.items)
    }

    /// Resolve the first administrator's user id.
    ///
    /// `GET /Users`
    pub async fn resolve_user_id(&self) -> Result<Option<String>, Error> {
        let users: Vec<User> = self.get("/Users", &[]).await?;
        Ok(users
            .into_iter()
            .find(User::is_administrator)
            .map(|u| u.id))
    }
}
