// ── Unified playback model ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What kind of item a session is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaType {
    Movie,
    Episode,
    Track,
    Unknown,
}

impl MediaType {
    /// Map an upstream item `Type` (`Movie`, `Episode`, `Audio`, ...).
    pub fn from_upstream(item_type: Option<&str>) -> Self {
        match item_type {
            Some("Movie") => Self::Movie,
            Some("Episode") => Self::Episode,
            Some("Audio") => Self::Track,
            _ => Self::Unknown,
        }
    }
}

/// Playback state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

/// One active playback session, normalized from either upstream vendor.
///
/// Built fresh every cycle and never mutated afterwards. All display
/// strings are pre-rendered by the adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSession {
    pub user: String,
    pub media_type: MediaType,
    /// Fully formatted, e.g. `"Lost - S01E02 - Tabula Rasa"`.
    pub title: String,
    pub series_name: Option<String>,
    /// Client application (`"Emby Web"`, `"Jellyfin Android"`).
    pub product: String,
    pub player_device: String,
    /// e.g. `"1920x1080 8.0Mbps (h264)"`.
    pub quality_label: String,
    /// `"H:MM:SS/H:MM:SS"` or `"Unknown"`.
    pub progress_label: String,
    pub eta_label: Option<String>,
    pub state: PlaybackState,
    pub is_transcoding: bool,
    /// 0 when unknown.
    pub bandwidth_kbps: u64,
    pub is_local_network: bool,
}

/// Aggregate view over one poll of the media server.
///
/// Totals are derived from `sessions` at construction and cannot drift
/// from them: fields are private and there is no mutator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerSnapshot {
    sessions: Vec<StreamSession>,
    total_bandwidth_kbps: u64,
    lan_bandwidth_kbps: u64,
    remote_bandwidth_kbps: u64,
    transcoding_count: usize,
}

impl ServerSnapshot {
    pub fn from_sessions(sessions: Vec<StreamSession>) -> Self {
        let (lan, remote) = sessions.iter().fold((0_u64, 0_u64), |(lan, remote), s| {
            if s.is_local_network {
                (lan.saturating_add(s.bandwidth_kbps), remote)
            } else {
                (lan, remote.saturating_add(s.bandwidth_kbps))
            }
        });
        let transcoding_count = sessions.iter().filter(|s| s.is_transcoding).count();

        Self {
            sessions,
            total_bandwidth_kbps: lan.saturating_add(remote),
            lan_bandwidth_kbps: lan,
            remote_bandwidth_kbps: remote,
            transcoding_count,
        }
    }

    pub fn sessions(&self) -> &[StreamSession] {
        &self.sessions
    }

    pub fn total_bandwidth_kbps(&self) -> u64 {
        self.total_bandwidth_kbps
    }

    pub fn lan_bandwidth_kbps(&self) -> u64 {
        self.lan_bandwidth_kbps
    }

    pub fn remote_bandwidth_kbps(&self) -> u64 {
        self.remote_bandwidth_kbps
    }

    pub fn transcoding_count(&self) -> usize {
        self.transcoding_count
    }
}
