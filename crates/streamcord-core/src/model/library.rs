// ── Library summaries and their stable identity ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad library category, from the upstream `CollectionType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LibraryKind {
    Movies,
    Shows,
    Music,
    Other,
}

impl LibraryKind {
    pub fn from_collection_type(collection_type: Option<&str>) -> Self {
        match collection_type {
            Some("movies") => Self::Movies,
            Some("tvshows") => Self::Shows,
            Some("music") => Self::Music,
            _ => Self::Other,
        }
    }
}

/// Name-derived library markers.
///
/// `is_kids` and `is_anime` are never both set; kids wins when a name
/// carries both markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryFlags {
    pub is_4k: bool,
    pub is_kids: bool,
    pub is_anime: bool,
}

impl LibraryFlags {
    /// Derive flags from a library name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let is_kids = lower.contains("kids");
        Self {
            is_4k: lower.contains("4k"),
            is_kids,
            is_anime: !is_kids && lower.contains("anime"),
        }
    }
}

/// Item count of one upstream library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarySummary {
    pub name: String,
    pub kind: LibraryKind,
    pub item_count: u64,
    pub flags: LibraryFlags,
}

impl LibrarySummary {
    pub fn new(name: impl Into<String>, kind: LibraryKind, item_count: u64) -> Self {
        let name = name.into();
        let flags = LibraryFlags::from_name(&name);
        Self {
            name,
            kind,
            item_count,
            flags,
        }
    }

    /// Stable key: depends on kind and flags only, never on the count.
    pub fn key(&self) -> LibraryKey {
        LibraryKey {
            kind: self.kind,
            is_4k: self.flags.is_4k,
            is_kids: self.flags.is_kids,
            is_anime: self.flags.is_anime,
        }
    }
}

/// `(kind, is_4k, is_kids, is_anime)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LibraryKey {
    pub kind: LibraryKind,
    pub is_4k: bool,
    pub is_kids: bool,
    pub is_anime: bool,
}

impl LibraryKey {
    /// Project onto the flags the channel label actually distinguishes.
    ///
    /// Movies keep only 4K. Shows keep the single highest-precedence flag
    /// (kids > anime > 4K). Music and other keep none. Two libraries with
    /// the same identity render to the same channel label.
    pub fn identity(self) -> Self {
        let plain = Self {
            kind: self.kind,
            is_4k: false,
            is_kids: false,
            is_anime: false,
        };
        match self.kind {
            LibraryKind::Movies => Self {
                is_4k: self.is_4k,
                ..plain
            },
            LibraryKind::Shows if self.is_kids => Self {
                is_kids: true,
                ..plain
            },
            LibraryKind::Shows if self.is_anime => Self {
                is_anime: true,
                ..plain
            },
            LibraryKind::Shows => Self {
                is_4k: self.is_4k,
                ..plain
            },
            LibraryKind::Music | LibraryKind::Other => plain,
        }
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "library:{}", self.kind)?;
        if self.is_4k {
            f.write_str(":4k")?;
        }
        if self.is_kids {
            f.write_str(":kids")?;
        }
        if self.is_anime {
            f.write_str(":anime")?;
        }
        Ok(())
    }
}
