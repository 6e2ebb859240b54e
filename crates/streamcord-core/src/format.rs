// ── Classification & formatting ──
//
// Pure functions from the unified model to the strings shown on Discord.
// Nothing here performs I/O; every output is capped to its surface's
// length limit before it leaves this module.

use std::fmt::Write as _;

use crate::config::DisplayOptions;
use crate::convert::format_mbps;
use crate::model::{
    LibraryKey, LibraryKind, LibrarySummary, MediaItem, MediaType, PlaybackState, RecentKind,
    ServerSnapshot, StreamSession,
};

/// Discord channel name cap, in characters.
pub const CHANNEL_NAME_LIMIT: usize = 100;

/// Discord embed description cap, in characters.
pub const MESSAGE_BODY_LIMIT: usize = 4096;

pub const STATUS_TITLE: &str = "🎬 Now Playing";
pub const RECENTLY_ADDED_TITLE: &str = "📥 Recently Added Media";

pub const NO_ACTIVE_STREAMS: &str = "🎵 No active streams";
pub const NO_RECENT_MEDIA: &str = "📭 No recently added media";

/// Separator between a channel label and its count.
const LABEL_SEPARATOR: &str = ": ";

// ── Numbers and truncation ──────────────────────────────────────────

/// `"999"`, `"1.2K"`, `"3.4M"`: one decimal, rounded. A value that
/// rounds to 1000.0K is shown as 1.0M.
pub fn format_count(n: u64) -> String {
    fn tenths(n: u64, unit: u64) -> u64 {
        n.saturating_mul(10).saturating_add(unit / 2) / unit
    }

    fn render(tenths: u64, suffix: char) -> String {
        format!("{}.{}{suffix}", tenths / 10, tenths % 10)
    }

    if n < 1_000 {
        return n.to_string();
    }
    let thousands = tenths(n, 1_000);
    if thousands < 10_000 {
        render(thousands, 'K')
    } else {
        render(tenths(n, 1_000_000), 'M')
    }
}

/// Cut `s` to at most `cap` characters, dropping from the end.
pub fn truncate(s: &str, cap: usize) -> String {
    match s.char_indices().nth(cap) {
        Some((byte_idx, _)) => s[..byte_idx].to_owned(),
        None => s.to_owned(),
    }
}

// ── Library channels ────────────────────────────────────────────────

/// Icon and label for a library channel.
///
/// Kind first, then flags: kids > anime > 4K for shows, 4K only for
/// movies. Flags a kind ignores never change the label.
pub fn library_label(key: LibraryKey) -> &'static str {
    match key.kind {
        LibraryKind::Movies if key.is_4k => "🎬 4K Movies",
        LibraryKind::Movies => "🎬 Movies",
        LibraryKind::Shows if key.is_kids => "🏠 Kids TV",
        LibraryKind::Shows if key.is_anime => "👾 Anime",
        LibraryKind::Shows if key.is_4k => "📺 4K TV Shows",
        LibraryKind::Shows => "📺 TV Shows",
        LibraryKind::Music => "🎵 Music",
        LibraryKind::Other => "📁 Other",
    }
}

/// `"{label}: {count}"`, capped at the channel name limit.
pub fn channel_name(summary: &LibrarySummary) -> String {
    let name = format!(
        "{}{LABEL_SEPARATOR}{}",
        library_label(summary.key()),
        format_count(summary.item_count)
    );
    truncate(&name, CHANNEL_NAME_LIMIT)
}

/// Every distinct library identity, one per label.
fn labelled_identities() -> impl Iterator<Item = LibraryKey> {
    let key = |kind, is_4k, is_kids, is_anime| LibraryKey {
        kind,
        is_4k,
        is_kids,
        is_anime,
    };
    [
        key(LibraryKind::Movies, false, false, false),
        key(LibraryKind::Movies, true, false, false),
        key(LibraryKind::Shows, false, false, false),
        key(LibraryKind::Shows, true, false, false),
        key(LibraryKind::Shows, false, true, false),
        key(LibraryKind::Shows, false, false, true),
        key(LibraryKind::Music, false, false, false),
        key(LibraryKind::Other, false, false, false),
    ]
    .into_iter()
}

/// Recover the library identity from a rendered channel name.
///
/// The label is everything before the last `": "`. Returns `None` for
/// names this module never produces.
pub fn library_identity_from_name(name: &str) -> Option<LibraryKey> {
    let (label, _count) = name.rsplit_once(LABEL_SEPARATOR)?;
    labelled_identities().find(|key| library_label(*key) == label)
}

// ── Status message ──────────────────────────────────────────────────

fn media_emoji(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "🎬",
        MediaType::Episode => "📺",
        MediaType::Track | MediaType::Unknown => "🎵",
    }
}

fn media_type_name(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "Movie",
        MediaType::Episode => "Episode",
        MediaType::Track => "Track",
        MediaType::Unknown => "Unknown",
    }
}

fn state_line(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Playing => "▶️ **State:** Playing",
        PlaybackState::Paused => "⏸️ **State:** Paused",
        PlaybackState::Stopped => "⏹️ **State:** Stopped",
    }
}

fn session_block(session: &StreamSession, display: &DisplayOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    if display.show_media_title {
        lines.push(format!("**{} {}**", media_emoji(session.media_type), session.title));
    }
    if display.show_media_type {
        lines.push(format!("🏷️ **Type:** {}", media_type_name(session.media_type)));
    }
    if display.show_user {
        lines.push(format!("👤 **User:** {}", session.user));
    }
    if display.show_player_info {
        lines.push(format!(
            "🎮 **Player:** {} ({})",
            session.product, session.player_device
        ));
    }
    if display.show_quality_profile {
        lines.push(format!("🎯 **Quality:** {}", session.quality_label));
    }

    let eta = session.eta_label.as_deref().filter(|_| display.show_eta);
    match (display.show_progress, eta) {
        (true, Some(eta)) => lines.push(format!(
            "⏱️ **Progress:** {} (⌛ {eta} remaining)",
            session.progress_label
        )),
        (true, None) => lines.push(format!("⏱️ **Progress:** {}", session.progress_label)),
        (false, Some(eta)) => lines.push(format!("⌛ **Remaining:** {eta}")),
        (false, None) => {}
    }

    if display.show_stream_state {
        lines.push(state_line(session.state).to_owned());
    }
    if display.show_bandwidth_per_stream {
        lines.push(format!(
            "📶 **Bandwidth:** {} Mbps",
            format_mbps(session.bandwidth_kbps)
        ));
    }
    if display.show_transcoding_status && session.is_transcoding {
        lines.push("⚡ **Transcoding:** Yes".to_owned());
    }

    lines.join("\n")
}

/// Body of the status message.
///
/// With no sessions this is exactly [`NO_ACTIVE_STREAMS`].
pub fn status_body(snapshot: &ServerSnapshot, display: &DisplayOptions) -> String {
    let sessions = snapshot.sessions();
    if sessions.is_empty() {
        return NO_ACTIVE_STREAMS.to_owned();
    }

    let mut header: Vec<String> = Vec::new();
    if display.show_current_streams {
        header.push(format!("📊 **Active Streams:** {}", sessions.len()));
    }
    if display.show_transcoding_count {
        header.push(format!("⚡ **Transcoding:** {}", snapshot.transcoding_count()));
    }
    if display.show_bandwidth {
        header.push(format!(
            "🌐 **Bandwidth:** {} Mbps (🏠 LAN {} Mbps, 🌍 Remote {} Mbps)",
            format_mbps(snapshot.total_bandwidth_kbps()),
            format_mbps(snapshot.lan_bandwidth_kbps()),
            format_mbps(snapshot.remote_bandwidth_kbps())
        ));
    }

    let mut sections = Vec::with_capacity(sessions.len() + 1);
    if !header.is_empty() {
        sections.push(header.join("\n"));
    }
    sections.extend(
        sessions
            .iter()
            .map(|s| session_block(s, display))
            .filter(|block| !block.is_empty()),
    );

    truncate(&sections.join("\n\n"), MESSAGE_BODY_LIMIT)
}

// ── Recently added message ──────────────────────────────────────────

/// Body of the recently-added message, one section per item kind in
/// fixed order. Empty sections are omitted.
pub fn recently_added_body(items: &[MediaItem]) -> String {
    let mut body = String::new();

    for kind in RecentKind::ALL {
        let mut section = items.iter().filter(|item| item.kind == kind).peekable();
        if section.peek().is_none() {
            continue;
        }

        if !body.is_empty() {
            body.push_str("\n\n");
        }
        let _ = write!(body, "**{}**", kind.section_label());
        for item in section {
            let _ = write!(body, "\n• {} ({})", item.title, item.added_label);
        }
    }

    if body.is_empty() {
        return NO_RECENT_MEDIA.to_owned();
    }
    truncate(&body, MESSAGE_BODY_LIMIT)
}
