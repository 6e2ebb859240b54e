// ── Discord chat directory ──
//
// Maps managed resources onto Discord objects: library channels are
// voice channels under the configured category, status and recently
// added are single-embed messages in their text channels. Keys are not
// stored anywhere on Discord; a channel's key is recovered from the
// label part of its name.
//
// Connecting checks the configured channels up front: a missing or
// mistyped target is a configuration error, missing bot permissions are
// logged by name.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use streamcord_api::discord::models::{Channel, Embed, EmbedFooter, Message, MessagePayload};
use streamcord_api::{DiscordClient, Snowflake, TransportConfig};

use crate::config::DiscordConfig;
use crate::error::CoreError;
use crate::format::{RECENTLY_ADDED_TITLE, STATUS_TITLE, library_identity_from_name};
use crate::model::{DesiredResource, ObservedResource, ResourceHandle, ResourceKey, ResourceKind};
use crate::reconcile::{ChatDirectory, ReconcileTargets, RecentMessage};

/// Shown next to the embed timestamp. Messages are only edited when their
/// body changes, so the timestamp marks the last change.
const FOOTER_TEXT: &str = "Last changed";

/// `ChatDirectory` over the Discord REST API.
pub struct DiscordDirectory {
    client: DiscordClient,
    guild_id: Snowflake,
    bot_user_id: Snowflake,
    embed_color: u32,
}

impl DiscordDirectory {
    /// Build the client, resolve the bot's own user id and check that
    /// `targets` exist in the guild with the right channel types.
    pub async fn connect(
        config: &DiscordConfig,
        targets: &ReconcileTargets,
        transport: &TransportConfig,
    ) -> Result<Self, CoreError> {
        let client = DiscordClient::new(config.api_base.clone(), &config.bot_token, transport)
            .map_err(unavailable)?;
        let me = client.current_user().await.map_err(unavailable)?;
        debug!(bot = %me.username, id = %me.id, "connected to Discord");

        let directory = Self::with_client(
            client,
            Snowflake(config.guild_id),
            me.id,
            config.embed_color,
        );
        directory.verify_targets(targets).await?;

        let missing = directory.missing_permissions().await?;
        if !missing.is_empty() {
            warn!(
                guild = config.guild_id,
                missing = %missing.join(", "),
                "bot lacks guild permissions, operations may fail"
            );
        }
        Ok(directory)
    }

    /// Wrap an existing client for a known bot user.
    pub fn with_client(
        client: DiscordClient,
        guild_id: Snowflake,
        bot_user_id: Snowflake,
        embed_color: u32,
    ) -> Self {
        Self {
            client,
            guild_id,
            bot_user_id,
            embed_color,
        }
    }

    pub fn bot_user_id(&self) -> Snowflake {
        self.bot_user_id
    }

    /// Fail unless every target channel exists in the guild: message
    /// targets as text channels, the library container as a category.
    pub async fn verify_targets(&self, targets: &ReconcileTargets) -> Result<(), CoreError> {
        let channels = self
            .client
            .guild_channels(self.guild_id)
            .await
            .map_err(unavailable)?;

        let require = |role: &str, id: u64, has_type: fn(&Channel) -> bool| {
            match channels.iter().find(|c| c.id == Snowflake(id)) {
                None => Err(CoreError::ConfigurationInvalid {
                    message: format!("{role} {id} does not exist in guild {}", self.guild_id),
                }),
                Some(channel) if !has_type(channel) => Err(CoreError::ConfigurationInvalid {
                    message: format!("{role} {id} has the wrong channel type ({})", channel.kind),
                }),
                Some(_) => Ok(()),
            }
        };

        require("status channel", targets.status_channel, Channel::is_text)?;
        require("recently added channel", targets.recently_added_channel, Channel::is_text)?;
        if let Some(category) = targets.library_category {
            require("library category", category, Channel::is_category)?;
        }
        Ok(())
    }

    /// Names of the guild permissions the bot needs but does not hold.
    pub async fn missing_permissions(&self) -> Result<Vec<&'static str>, CoreError> {
        let guild = self.client.guild(self.guild_id).await.map_err(unavailable)?;
        let member = self
            .client
            .guild_member(self.guild_id, self.bot_user_id)
            .await
            .map_err(unavailable)?;
        Ok(guild
            .permissions_of(self.bot_user_id, &member.roles)
            .missing())
    }

    fn payload(&self, desired: &DesiredResource) -> MessagePayload {
        let title = match desired.kind {
            ResourceKind::RecentlyAddedMessage => RECENTLY_ADDED_TITLE,
            ResourceKind::StatusMessage | ResourceKind::LibraryVoiceChannel => STATUS_TITLE,
        };

        MessagePayload {
            content: None,
            embeds: vec![Embed {
                title: Some(title.to_owned()),
                description: Some(desired.content.clone()),
                color: Some(self.embed_color),
                timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
                footer: Some(EmbedFooter {
                    text: FOOTER_TEXT.to_owned(),
                }),
            }],
        }
    }
}

// ── Error mapping ───────────────────────────────────────────────────

fn unavailable(err: streamcord_api::Error) -> CoreError {
    CoreError::DirectoryUnavailable {
        reason: err.to_string(),
    }
}

fn operation_failed(key: impl ToString, err: &streamcord_api::Error) -> CoreError {
    if err.is_not_found() {
        CoreError::ChatResourceMissing {
            key: key.to_string(),
        }
    } else {
        CoreError::ChatOperationFailed {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}

/// The rendered body of a message: its first embed's description, else
/// its plain content.
fn message_body(message: &Message) -> String {
    message
        .embeds
        .first()
        .and_then(|embed| embed.description.clone())
        .unwrap_or_else(|| message.content.clone())
}

#[async_trait]
impl ChatDirectory for DiscordDirectory {
    async fn list_managed_resources(
        &self,
        container_id: u64,
    ) -> Result<Vec<ObservedResource>, CoreError> {
        let channels = self
            .client
            .guild_channels(self.guild_id)
            .await
            .map_err(unavailable)?;

        let mut channels: Vec<Channel> = channels
            .into_iter()
            .filter(|c| c.is_voice() && c.parent_id == Some(Snowflake(container_id)))
            .collect();
        // Oldest first, so channels sharing a label pair up the same way
        // every cycle.
        channels.sort_by_key(|c| c.id);

        let observed = channels
            .into_iter()
            .map(|channel| {
                let name = channel.name.unwrap_or_default();
                let key = library_identity_from_name(&name).map_or_else(
                    || ResourceKey::Unrecognized(channel.id.to_string()),
                    ResourceKey::Library,
                );
                ObservedResource {
                    kind: ResourceKind::LibraryVoiceChannel,
                    key,
                    handle: ResourceHandle::Channel {
                        channel_id: channel.id.0,
                    },
                    content: name,
                }
            })
            .collect();
        Ok(observed)
    }

    async fn create_resource(
        &self,
        container_id: u64,
        desired: &DesiredResource,
    ) -> Result<ResourceHandle, CoreError> {
        let container = Snowflake(container_id);
        match desired.kind {
            ResourceKind::LibraryVoiceChannel => {
                let channel = self
                    .client
                    .create_voice_channel(self.guild_id, container, &desired.content)
                    .await
                    .map_err(|e| operation_failed(&desired.key, &e))?;
                Ok(ResourceHandle::Channel {
                    channel_id: channel.id.0,
                })
            }
            ResourceKind::StatusMessage | ResourceKind::RecentlyAddedMessage => {
                let message = self
                    .client
                    .create_message(container, &self.payload(desired))
                    .await
                    .map_err(|e| operation_failed(&desired.key, &e))?;
                Ok(ResourceHandle::Message {
                    channel_id: container_id,
                    message_id: message.id.0,
                })
            }
        }
    }

    async fn update_resource(
        &self,
        handle: ResourceHandle,
        desired: &DesiredResource,
    ) -> Result<(), CoreError> {
        let result = match handle {
            ResourceHandle::Channel { channel_id } => self
                .client
                .rename_channel(Snowflake(channel_id), &desired.content)
                .await
                .map(drop),
            ResourceHandle::Message {
                channel_id,
                message_id,
            } => self
                .client
                .edit_message(
                    Snowflake(channel_id),
                    Snowflake(message_id),
                    &self.payload(desired),
                )
                .await
                .map(drop),
        };
        result.map_err(|e| operation_failed(&desired.key, &e))
    }

    async fn delete_resource(&self, handle: ResourceHandle) -> Result<(), CoreError> {
        let result = match handle {
            ResourceHandle::Channel { channel_id } => {
                self.client.delete_channel(Snowflake(channel_id)).await
            }
            ResourceHandle::Message {
                channel_id,
                message_id,
            } => {
                self.client
                    .delete_message(Snowflake(channel_id), Snowflake(message_id))
                    .await
            }
        };
        result.map_err(|e| operation_failed(handle, &e))
    }

    async fn read_message(&self, handle: ResourceHandle) -> Result<Option<String>, CoreError> {
        let ResourceHandle::Message {
            channel_id,
            message_id,
        } = handle
        else {
            return Ok(None);
        };
        match self
            .client
            .channel_message(Snowflake(channel_id), Snowflake(message_id))
            .await
        {
            Ok(message) => Ok(Some(message_body(&message))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(operation_failed(handle, &e)),
        }
    }

    async fn find_recent_bot_message(
        &self,
        channel_id: u64,
        lookback: u8,
    ) -> Result<Option<RecentMessage>, CoreError> {
        let messages = self
            .client
            .channel_messages(Snowflake(channel_id), lookback)
            .await
            .map_err(|e| operation_failed(format!("channel {channel_id}"), &e))?;

        Ok(messages
            .iter()
            .find(|m| m.author.id == self.bot_user_id)
            .map(|m| RecentMessage {
                handle: ResourceHandle::Message {
                    channel_id,
                    message_id: m.id.0,
                },
                body: message_body(m),
            }))
    }
}
