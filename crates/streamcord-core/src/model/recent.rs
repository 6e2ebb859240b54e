// ── Recently added media ──

use serde::Serialize;

/// Item types shown in the recently-added message, in section order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RecentKind {
    Movie,
    Episode,
    Series,
    Season,
    MusicVideo,
    Audio,
}

impl RecentKind {
    pub const ALL: [Self; 6] = [
        Self::Movie,
        Self::Episode,
        Self::Series,
        Self::Season,
        Self::MusicVideo,
        Self::Audio,
    ];

    /// Map an upstream item `Type`; `None` for types the message never shows.
    pub fn from_upstream(item_type: &str) -> Option<Self> {
        match item_type {
            "Movie" => Some(Self::Movie),
            "Episode" => Some(Self::Episode),
            "Series" => Some(Self::Series),
            "Season" => Some(Self::Season),
            "MusicVideo" => Some(Self::MusicVideo),
            "Audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn section_label(self) -> &'static str {
        match self {
            Self::Movie => "🎬 Movies",
            Self::Episode => "📺 Episodes",
            Self::Series => "📺 Series",
            Self::Season => "🗂️ Seasons",
            Self::MusicVideo => "🎵 Music Videos",
            Self::Audio => "🎧 Audio",
        }
    }
}

/// One recently added item, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    pub title: String,
    pub kind: RecentKind,
    /// `"3d ago"`, `"5h ago"`, `"12m ago"` or `"Unknown"`.
    pub added_label: String,
}
