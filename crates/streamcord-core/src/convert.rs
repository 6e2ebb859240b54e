// ── API-to-domain type conversions ──
//
// Bridges raw `streamcord_api::media` session and item payloads into the
// unified `StreamSession` / `MediaItem` model. Emby and Jellyfin only
// differ in where source video dimensions live; everything downstream of
// `SessionParts` is shared.

use chrono::{DateTime, Utc};

use streamcord_api::media::models::{
    EmbySession, JellyfinSession, RecentItem, TranscodingInfo,
};

use crate::model::{MediaItem, MediaType, PlaybackState, RecentKind, StreamSession};

/// Upstream time unit: 100ns.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Endpoint prefixes treated as the local network.
///
/// A literal prefix test: `172.17.`–`172.31.` are classified remote.
pub const LOCAL_NETWORK_PREFIXES: [&str; 3] = ["10.", "172.16.", "192.168."];

const UNKNOWN: &str = "Unknown";

// ── Helpers ────────────────────────────────────────────────────────

/// `H:MM:SS`, hours unpadded and unbounded.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Progress and ETA labels from position and runtime ticks.
///
/// Progress is `"Unknown"` (and ETA absent) unless both are nonzero. ETA
/// is present only while time remains.
pub fn progress_labels(
    position_ticks: Option<u64>,
    runtime_ticks: Option<u64>,
) -> (String, Option<String>) {
    match (position_ticks, runtime_ticks) {
        (Some(position), Some(runtime)) if position > 0 && runtime > 0 => {
            let progress = format!(
                "{}/{}",
                format_duration(position / TICKS_PER_SECOND),
                format_duration(runtime / TICKS_PER_SECOND)
            );
            let eta = runtime
                .checked_sub(position)
                .filter(|remaining| *remaining > 0)
                .map(|remaining| format_duration(remaining / TICKS_PER_SECOND));
            (progress, eta)
        }
        _ => (UNKNOWN.to_owned(), None),
    }
}

/// `"{series} - S{season:02}E{episode:02} - {name}"` for episodes, the
/// raw name otherwise.
pub fn item_title(
    media_type: MediaType,
    name: Option<&str>,
    series_name: Option<&str>,
    season: Option<u32>,
    episode: Option<u32>,
) -> String {
    let name = name.unwrap_or(UNKNOWN);
    if media_type == MediaType::Episode {
        format!(
            "{} - S{:02}E{:02} - {}",
            series_name.unwrap_or(UNKNOWN),
            season.unwrap_or(0),
            episode.unwrap_or(0),
            name
        )
    } else {
        name.to_owned()
    }
}

/// Whether an endpoint (`"192.168.1.20"`, `"10.0.0.4:51234"`) is local.
pub fn is_local_endpoint(endpoint: Option<&str>) -> bool {
    endpoint.is_some_and(|ep| LOCAL_NETWORK_PREFIXES.iter().any(|p| ep.starts_with(p)))
}

/// Bits per second to kilobits per second.
fn bps_to_kbps(bps: u64) -> u64 {
    bps / 1000
}

/// `"8.0"` for 8000 kbps, rounded to one decimal.
pub fn format_mbps(kbps: u64) -> String {
    let tenths = kbps.saturating_add(50) / 100;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Source video properties, wherever the vendor reports them.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SourceVideo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bitrate_bps: Option<u64>,
}

fn dimensions(width: Option<u32>, height: Option<u32>) -> Option<(u32, u32)> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
        _ => None,
    }
}

fn resolution_with_bitrate(w: u32, h: u32, bitrate_bps: Option<u64>) -> String {
    let mut label = format!("{w}x{h}");
    if let Some(kbps) = bitrate_bps.map(bps_to_kbps).filter(|k| *k > 0) {
        label.push(' ');
        label.push_str(&format_mbps(kbps));
        label.push_str("Mbps");
    }
    label
}

/// Quality label for a session.
///
/// Transcoded: `"{w}x{h} {mbps}Mbps ({codec})"`, or `"Unknown"` without
/// dimensions. Direct: `"{w}x{h} {mbps}Mbps (direct)"`, or `"Direct"`.
pub(crate) fn quality_label(transcoding: Option<&TranscodingInfo>, source: SourceVideo) -> String {
    if let Some(tc) = transcoding {
        let Some((w, h)) = dimensions(tc.width, tc.height) else {
            return UNKNOWN.to_owned();
        };
        let mut label = resolution_with_bitrate(w, h, tc.bitrate);
        if let Some(codec) = tc.video_codec.as_deref().filter(|c| !c.is_empty()) {
            label.push_str(&format!(" ({codec})"));
        }
        label
    } else {
        match dimensions(source.width, source.height) {
            Some((w, h)) => format!("{} (direct)", resolution_with_bitrate(w, h, source.bitrate_bps)),
            None => "Direct".to_owned(),
        }
    }
}

/// Transcode bitrate while transcoding, source bitrate otherwise, 0 if unknown.
fn bandwidth_kbps(transcoding: Option<&TranscodingInfo>, source: SourceVideo) -> u64 {
    transcoding
        .map_or(source.bitrate_bps, |tc| tc.bitrate)
        .map_or(0, bps_to_kbps)
}

// ── Sessions ───────────────────────────────────────────────────────

/// Vendor-neutral slice of a session, after the vendor-specific lookups.
struct SessionParts<'a> {
    user_name: Option<&'a str>,
    client: Option<&'a str>,
    device_name: Option<&'a str>,
    remote_end_point: Option<&'a str>,
    item_type: Option<&'a str>,
    name: Option<&'a str>,
    series_name: Option<&'a str>,
    season: Option<u32>,
    episode: Option<u32>,
    position_ticks: Option<u64>,
    runtime_ticks: Option<u64>,
    state: PlaybackState,
    transcoding: Option<&'a TranscodingInfo>,
    source: SourceVideo,
}

fn build_stream(parts: SessionParts<'_>) -> StreamSession {
    let media_type = MediaType::from_upstream(parts.item_type);
    let (progress_label, eta_label) = progress_labels(parts.position_ticks, parts.runtime_ticks);

    StreamSession {
        user: parts.user_name.unwrap_or(UNKNOWN).to_owned(),
        media_type,
        title: item_title(
            media_type,
            parts.name,
            parts.series_name,
            parts.season,
            parts.episode,
        ),
        series_name: parts.series_name.map(str::to_owned),
        product: parts.client.unwrap_or(UNKNOWN).to_owned(),
        player_device: parts.device_name.unwrap_or(UNKNOWN).to_owned(),
        quality_label: quality_label(parts.transcoding, parts.source),
        progress_label,
        eta_label,
        state: parts.state,
        is_transcoding: parts.transcoding.is_some(),
        bandwidth_kbps: bandwidth_kbps(parts.transcoding, parts.source),
        is_local_network: is_local_endpoint(parts.remote_end_point),
    }
}

fn is_active(position_ticks: Option<u64>) -> bool {
    position_ticks.is_some_and(|p| p > 0)
}

/// Normalize one Emby session; `None` when nothing is playing.
pub fn stream_from_emby(session: &EmbySession) -> Option<StreamSession> {
    let item = session.now_playing_item.as_ref()?;
    let play = &session.play_state;
    if !is_active(play.position_ticks) {
        return None;
    }

    let state = if play
        .play_state
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("stopped"))
    {
        PlaybackState::Stopped
    } else if play.is_paused {
        PlaybackState::Paused
    } else {
        PlaybackState::Playing
    };

    Some(build_stream(SessionParts {
        user_name: session.user_name.as_deref(),
        client: session.client.as_deref(),
        device_name: session.device_name.as_deref(),
        remote_end_point: session.remote_end_point.as_deref(),
        item_type: item.item_type.as_deref(),
        name: item.name.as_deref(),
        series_name: item.series_name.as_deref(),
        season: item.parent_index_number,
        episode: item.index_number,
        position_ticks: play.position_ticks,
        runtime_ticks: item.run_time_ticks,
        state,
        transcoding: session.transcoding_info.as_ref(),
        source: SourceVideo {
            width: item.width,
            height: item.height,
            bitrate_bps: item.bitrate,
        },
    }))
}

/// Normalize one Jellyfin session; `None` when nothing is playing.
pub fn stream_from_jellyfin(session: &JellyfinSession) -> Option<StreamSession> {
    let item = session.now_playing_item.as_ref()?;
    let play = &session.play_state;
    if !is_active(play.position_ticks) {
        return None;
    }

    let source = item.video_stream().map_or_else(SourceVideo::default, |v| SourceVideo {
        width: v.width,
        height: v.height,
        bitrate_bps: v.bit_rate,
    });

    Some(build_stream(SessionParts {
        user_name: session.user_name.as_deref(),
        client: session.client.as_deref(),
        device_name: session.device_name.as_deref(),
        remote_end_point: session.remote_end_point.as_deref(),
        item_type: item.item_type.as_deref(),
        name: item.name.as_deref(),
        series_name: item.series_name.as_deref(),
        season: item.parent_index_number,
        episode: item.index_number,
        position_ticks: play.position_ticks,
        runtime_ticks: item.run_time_ticks,
        state: if play.is_paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        },
        transcoding: session.transcoding_info.as_ref(),
        source,
    }))
}

// ── Recently added ─────────────────────────────────────────────────

/// `"{d}d ago"`, `"{h}h ago"`, `"{m}m ago"`, or `"Unknown"`.
pub fn relative_added_label(date_created: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(created) = date_created
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
    else {
        return UNKNOWN.to_owned();
    };

    let delta = now.signed_duration_since(created);
    if delta.num_days() >= 1 {
        format!("{}d ago", delta.num_days())
    } else if delta.num_hours() >= 1 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}m ago", delta.num_minutes().max(0))
    }
}

/// Normalize one recently added item; `None` for types never displayed.
pub fn media_item(item: &RecentItem, now: DateTime<Utc>) -> Option<MediaItem> {
    let kind = RecentKind::from_upstream(item.item_type.as_deref()?)?;
    let media_type = if kind == RecentKind::Episode {
        MediaType::Episode
    } else {
        MediaType::Unknown
    };

    Some(MediaItem {
        title: item_title(
            media_type,
            item.name.as_deref(),
            item.series_name.as_deref(),
            item.parent_index_number,
            item.index_number,
        ),
        kind,
        added_label: relative_added_label(item.date_created.as_deref(), now),
    })
}
