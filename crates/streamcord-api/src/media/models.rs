// Media server response types
//
// Emby and Jellyfin share the library/item endpoints but diverge in the
// session payload: Emby reports source video dimensions on the playing
// item itself, Jellyfin nests them inside `MediaStreams`. Fields use
// `#[serde(default)]` liberally because both servers omit keys freely
// across versions and client types.

use serde::{Deserialize, Serialize};

// ── Library ─────────────────────────────────────────────────────────

/// Response envelope of `GET /Library/MediaFolders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaFoldersResponse {
    #[serde(default)]
    pub items: Vec<MediaFolder>,
}

/// A top-level library folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaFolder {
    pub id: String,
    pub name: String,
    /// `movies`, `tvshows`, `music`, `boxsets`, ... (absent for mixed folders).
    #[serde(default)]
    pub collection_type: Option<String>,
}

/// Generic paged item response (`{ Items, TotalRecordCount }`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_record_count: u64,
}

/// Filters for an item-count query scoped to one library.
///
/// Always sent with `Recursive=true` and `Limit=0` so the server only
/// computes `TotalRecordCount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCountQuery {
    pub parent_id: String,
    /// Comma-separated item types, e.g. `"Audio,MusicAlbum"`.
    pub include_item_types: String,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
}

impl ItemCountQuery {
    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ParentId", self.parent_id.clone()),
            ("Recursive", "true".to_owned()),
            ("IncludeItemTypes", self.include_item_types.clone()),
            ("Limit", "0".to_owned()),
            ("ImageTypeLimit", "0".to_owned()),
        ];
        if let Some(w) = self.min_width {
            params.push(("MinWidth", w.to_string()));
        }
        if let Some(w) = self.max_width {
            params.push(("MaxWidth", w.to_string()));
        }
        params
    }
}

/// A recently added item (same shape on both servers).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecentItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "Type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub parent_index_number: Option<u32>,
    #[serde(default)]
    pub index_number: Option<u32>,
    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub date_created: Option<String>,
}

// ── Users ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub policy: Option<UserPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPolicy {
    #[serde(default)]
    pub is_administrator: bool,
}

impl User {
    pub fn is_administrator(&self) -> bool {
        self.policy.as_ref().is_some_and(|p| p.is_administrator)
    }
}

// ── Sessions (shared parts) ─────────────────────────────────────────

/// Present only while the server is transcoding the stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscodingInfo {
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Bits per second.
    #[serde(default)]
    pub bitrate: Option<u64>,
}

// ── Sessions (Emby) ─────────────────────────────────────────────────

/// One entry of Emby's `GET /Sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbySession {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub remote_end_point: Option<String>,
    #[serde(default)]
    pub now_playing_item: Option<EmbyNowPlaying>,
    #[serde(default)]
    pub play_state: EmbyPlayState,
    #[serde(default)]
    pub transcoding_info: Option<TranscodingInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbyNowPlaying {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "Type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub parent_index_number: Option<u32>,
    #[serde(default)]
    pub index_number: Option<u32>,
    #[serde(default)]
    pub run_time_ticks: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Bits per second.
    #[serde(default)]
    pub bitrate: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmbyPlayState {
    #[serde(default)]
    pub position_ticks: Option<u64>,
    #[serde(default)]
    pub is_paused: bool,
    /// Free-form state reported by some Emby clients (`Playing`, `Stopped`).
    #[serde(default)]
    pub play_state: Option<String>,
}

// ── Sessions (Jellyfin) ─────────────────────────────────────────────

/// One entry of Jellyfin's `GET /Sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinSession {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub remote_end_point: Option<String>,
    #[serde(default)]
    pub now_playing_item: Option<JellyfinNowPlaying>,
    #[serde(default)]
    pub play_state: JellyfinPlayState,
    #[serde(default)]
    pub transcoding_info: Option<TranscodingInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinNowPlaying {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "Type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub parent_index_number: Option<u32>,
    #[serde(default)]
    pub index_number: Option<u32>,
    #[serde(default)]
    pub run_time_ticks: Option<u64>,
    #[serde(default)]
    pub media_streams: Vec<MediaStream>,
}

impl JellyfinNowPlaying {
    /// The first video stream of the source media, if any.
    pub fn video_stream(&self) -> Option<&MediaStream> {
        self.media_streams
            .iter()
            .find(|s| s.stream_type.eq_ignore_ascii_case("video"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStream {
    #[serde(default, rename = "Type")]
    pub stream_type: String,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Bits per second.
    #[serde(default)]
    pub bit_rate: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinPlayState {
    #[serde(default)]
    pub position_ticks: Option<u64>,
    #[serde(default)]
    pub is_paused: bool,
}
