// ── Runtime configuration ──
//
// These types describe *what* to poll and *where* to project it. They
// carry credentials and tuning but never touch disk: the binary builds
// a `RuntimeConfig` from `streamcord-config` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use streamcord_api::{TlsMode, TransportConfig};

/// Which media server vendor to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServerKind {
    #[default]
    Emby,
    Jellyfin,
}

/// Connection to the media server.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub kind: ServerKind,
    pub url: Url,
    pub api_key: SecretString,
    /// User whose view drives the recently-added query. Resolved from
    /// the server on first use when absent.
    pub user_id: Option<String>,
    /// Accept self-signed certificates.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: if self.accept_invalid_certs {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: self.timeout,
        }
    }
}

/// Discord bot credentials and the managed guild objects.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    pub api_base: Url,
    pub guild_id: u64,
    pub status_channel_id: u64,
    pub recently_added_channel_id: u64,
    /// Category holding one voice channel per library.
    pub library_category_id: u64,
    /// RGB accent color for embeds.
    pub embed_color: u32,
}

/// Per-field display switches for the status message and library channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DisplayOptions {
    pub show_current_streams: bool,
    pub show_transcoding_count: bool,
    pub show_bandwidth: bool,
    pub show_library_counts: bool,
    pub show_stream_state: bool,
    pub show_media_type: bool,
    pub show_user: bool,
    pub show_media_title: bool,
    pub show_player_info: bool,
    pub show_quality_profile: bool,
    pub show_bandwidth_per_stream: bool,
    pub show_transcoding_status: bool,
    pub show_progress: bool,
    pub show_eta: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_current_streams: true,
            show_transcoding_count: false,
            show_bandwidth: false,
            show_library_counts: false,
            show_stream_state: true,
            show_media_type: true,
            show_user: true,
            show_media_title: true,
            show_player_info: true,
            show_quality_profile: true,
            show_bandwidth_per_stream: false,
            show_transcoding_status: true,
            show_progress: true,
            show_eta: true,
        }
    }
}

/// Upper bound on recently added items per message.
pub const MAX_RECENTLY_ADDED: usize = 10;

/// Longest pause after a failed cycle.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub recently_added_limit: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            recently_added_limit: MAX_RECENTLY_ADDED,
        }
    }
}

impl PollConfig {
    /// Delay after a failed cycle: five seconds, or half the interval when
    /// that is shorter, so recovery always beats the steady cadence.
    pub fn backoff(&self) -> Duration {
        MAX_BACKOFF.min(self.interval / 2)
    }
}

/// Everything the poller needs to run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub upstream: UpstreamConfig,
    pub discord: DiscordConfig,
    pub display: DisplayOptions,
    pub poll: PollConfig,
}
