// Discord REST response and request types
//
// Only the slice of the Discord object model this bot touches: users,
// guilds and their roles, channels, messages and embeds. Snowflakes travel as JSON strings
// and are parsed into `u64` newtypes at the edge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Snowflake ───────────────────────────────────────────────────────

/// A Discord object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Num(n) => Ok(Self(n)),
        }
    }
}

// ── Channel type codes ──────────────────────────────────────────────

pub const CHANNEL_GUILD_TEXT: u8 = 0;
pub const CHANNEL_GUILD_VOICE: u8 = 2;
pub const CHANNEL_GUILD_CATEGORY: u8 = 4;
pub const CHANNEL_GUILD_ANNOUNCEMENT: u8 = 5;

// ── Permissions ─────────────────────────────────────────────────────

/// A guild permission bit set. Travels as a decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const EMBED_LINKS: Self = Self(1 << 14);
    pub const READ_MESSAGE_HISTORY: Self = Self(1 << 16);

    /// Everything the bot needs to manage its channels and messages.
    pub const REQUIRED: [(Self, &'static str); 6] = [
        (Self::MANAGE_CHANNELS, "manage_channels"),
        (Self::VIEW_CHANNEL, "view_channel"),
        (Self::SEND_MESSAGES, "send_messages"),
        (Self::MANAGE_MESSAGES, "manage_messages"),
        (Self::EMBED_LINKS, "embed_links"),
        (Self::READ_MESSAGE_HISTORY, "read_message_history"),
    ];

    pub const fn all() -> Self {
        Self(u64::MAX)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Names of the required permissions this set lacks. Administrator
    /// implies every permission.
    pub fn missing(self) -> Vec<&'static str> {
        if self.contains(Self::ADMINISTRATOR) {
            return Vec::new();
        }
        Self::REQUIRED
            .iter()
            .filter(|(bit, _)| !self.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map(Self).map_err(serde::de::Error::custom)
    }
}

// ── Objects ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub owner_id: Snowflake,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Guild {
    /// Guild-level permissions of a member holding `member_roles`.
    ///
    /// The owner holds everything. Everyone else gets the `@everyone` role
    /// (whose id equals the guild id) plus each of their roles.
    pub fn permissions_of(&self, user_id: Snowflake, member_roles: &[Snowflake]) -> Permissions {
        if user_id == self.owner_id {
            return Permissions::all();
        }
        self.roles
            .iter()
            .filter(|role| role.id == self.id || member_roles.contains(&role.id))
            .fold(Permissions::default(), |acc, role| acc.union(role.permissions))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    #[serde(default)]
    pub name: String,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub roles: Vec<Snowflake>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub position: Option<i32>,
}

impl Channel {
    pub fn is_voice(&self) -> bool {
        self.kind == CHANNEL_GUILD_VOICE
    }

    /// Whether messages can be posted here.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, CHANNEL_GUILD_TEXT | CHANNEL_GUILD_ANNOUNCEMENT)
    }

    pub fn is_category(&self) -> bool {
        self.kind == CHANNEL_GUILD_CATEGORY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// ISO-8601 timestamp shown next to the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

// ── Requests ────────────────────────────────────────────────────────

/// Body of `POST /guilds/{id}/channels`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
}

/// Body of `POST`/`PATCH` on channel messages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn guild() -> Guild {
        serde_json::from_value(serde_json::json!({
            "id": "10",
            "owner_id": "1",
            "roles": [
                { "id": "10", "name": "@everyone", "permissions": "3072" },
                { "id": "20", "name": "Bots", "permissions": "93200" },
                { "id": "30", "name": "Admins", "permissions": "8" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn everyone_role_alone_lacks_management() {
        let perms = guild().permissions_of(Snowflake(77), &[]);

        assert_eq!(
            perms.missing(),
            vec!["manage_channels", "manage_messages", "embed_links", "read_message_history"]
        );
    }

    #[test]
    fn member_roles_add_to_everyone() {
        let perms = guild().permissions_of(Snowflake(77), &[Snowflake(20)]);

        assert!(perms.missing().is_empty());
    }

    #[test]
    fn administrator_and_owner_hold_everything() {
        let guild = guild();

        assert!(guild.permissions_of(Snowflake(77), &[Snowflake(30)]).missing().is_empty());
        assert!(guild.permissions_of(Snowflake(1), &[]).missing().is_empty());
    }

    #[test]
    fn permissions_must_be_a_decimal_string() {
        assert!(serde_json::from_str::<Permissions>("\"abc\"").is_err());
        assert_eq!(
            serde_json::from_str::<Permissions>("\"8\"").unwrap(),
            Permissions::ADMINISTRATOR
        );
    }
}
