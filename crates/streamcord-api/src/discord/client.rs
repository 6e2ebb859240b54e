// Discord REST client
//
// Bot-token authenticated wrapper over the handful of v10 endpoints the
// reconciler needs. No gateway connection, no client-side rate limit
// bookkeeping: a 429 surfaces as `Error::RateLimited` and the caller
// decides what to do with it.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::discord::models::{
    CHANNEL_GUILD_VOICE, Channel, CreateChannel, Guild, GuildMember, Message, MessagePayload,
    Snowflake, User,
};
use crate::error::Error;
use crate::transport::{TransportConfig, check_status, decode_json};

/// Default REST base for API v10.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Raw HTTP client for the Discord REST API.
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DiscordClient {
    /// Create a client that authenticates as the bot owning `token`.
    pub fn new(base_url: Url, token: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {}", token.expose_secret())).map_err(
            |_| Error::Authentication {
                message: "bot token contains characters not allowed in a header".into(),
            },
        )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        decode_json(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        decode_json(resp).await
    }

    async fn patch<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {}", url);
        let resp = self
            .http
            .patch(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        decode_json(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await.map_err(Error::Transport)?;
        check_status(resp).await?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────

    /// The bot's own user.
    ///
    /// `GET /users/@me`
    pub async fn current_user(&self) -> Result<User, Error> {
        self.get("/users/@me").await
    }

    // ── Guilds ───────────────────────────────────────────────────────

    /// A guild with its roles.
    ///
    /// `GET /guilds/{guild_id}`
    pub async fn guild(&self, guild_id: Snowflake) -> Result<Guild, Error> {
        self.get(&format!("/guilds/{guild_id}")).await
    }

    /// One member of a guild.
    ///
    /// `GET /guilds/{guild_id}/members/{user_id}`
    pub async fn guild_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> Result<GuildMember, Error> {
        self.get(&format!("/guilds/{guild_id}/members/{user_id}"))
            .await
    }

    // ── Channels ─────────────────────────────────────────────────────

    /// All channels of a guild.
    ///
    /// `GET /guilds/{guild_id}/channels`
    pub async fn guild_channels(&self, guild_id: Snowflake) -> Result<Vec<Channel>, Error> {
        self.get(&format!("/guilds/{guild_id}/channels")).await
    }

    /// Create a voice channel under `parent_id`.
    ///
    /// `POST /guilds/{guild_id}/channels`
    pub async fn create_voice_channel(
        &self,
        guild_id: Snowflake,
        parent_id: Snowflake,
        name: &str,
    ) -> Result<Channel, Error> {
        let body = CreateChannel {
            name: name.to_owned(),
            kind: CHANNEL_GUILD_VOICE,
            parent_id: Some(parent_id),
        };
        self.post(&format!("/guilds/{guild_id}/channels"), &body).await
    }

    /// Rename a channel.
    ///
    /// `PATCH /channels/{channel_id}`
    pub async fn rename_channel(&self, channel_id: Snowflake, name: &str) -> Result<Channel, Error> {
        self.patch(
            &format!("/channels/{channel_id}"),
            &serde_json::json!({ "name": name }),
        )
        .await
    }

    /// Delete a channel.
    ///
    /// `DELETE /channels/{channel_id}`
    pub async fn delete_channel(&self, channel_id: Snowflake) -> Result<(), Error> {
        self.delete(&format!("/channels/{channel_id}")).await
    }

    // ── Messages ─────────────────────────────────────────────────────

    /// The `limit` most recent messages of a channel, newest first.
    ///
    /// `GET /channels/{channel_id}/messages?limit=N`
    pub async fn channel_messages(
        &self,
        channel_id: Snowflake,
        limit: u8,
    ) -> Result<Vec<Message>, Error> {
        let limit = limit.clamp(1, 100);
        self.get(&format!("/channels/{channel_id}/messages?limit={limit}"))
            .await
    }

    /// A single message.
    ///
    /// `GET /channels/{channel_id}/messages/{message_id}`
    pub async fn channel_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<Message, Error> {
        self.get(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await
    }

    /// Post a message.
    ///
    /// `POST /channels/{channel_id}/messages`
    pub async fn create_message(
        &self,
        channel_id: Snowflake,
        payload: &MessagePayload,
    ) -> Result<Message, Error> {
        self.post(&format!("/channels/{channel_id}/messages"), payload)
            .await
    }

    /// Replace a message's content and embeds.
    ///
    /// `PATCH /channels/{channel_id}/messages/{message_id}`
    pub async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        payload: &MessagePayload,
    ) -> Result<Message, Error> {
        self.patch(
            &format!("/channels/{channel_id}/messages/{message_id}"),
            payload,
        )
        .await
    }

    /// Delete a message.
    ///
    /// `DELETE /channels/{channel_id}/messages/{message_id}`
    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), Error> {
        self.delete(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await
    }
}
