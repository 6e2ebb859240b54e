// ── Library count policy ──
//
// Shared by both vendors: which folders are counted, which item types
// and width filters each count uses, and the one-shot unfiltered retry
// for shows libraries that come back empty.

use async_trait::async_trait;
use tracing::{debug, warn};

use streamcord_api::media::models::{ItemCountQuery, MediaFolder};
use streamcord_api::{EmbyClient, JellyfinClient};

use crate::model::{LibraryFlags, LibraryKind, LibrarySummary};

/// Minimum width of 4K content.
const UHD_MIN_WIDTH: u32 = 3840;

/// Folders never reported, matched case-insensitively.
const SKIPPED_FOLDERS: [&str; 1] = ["collections"];

/// Anything that can answer an item-count query.
#[async_trait]
pub(crate) trait ItemCounter: Send + Sync {
    async fn count_items(&self, query: &ItemCountQuery) -> Result<u64, streamcord_api::Error>;
}

#[async_trait]
impl ItemCounter for EmbyClient {
    async fn count_items(&self, query: &ItemCountQuery) -> Result<u64, streamcord_api::Error> {
        EmbyClient::count_items(self, query).await
    }
}

#[async_trait]
impl ItemCounter for JellyfinClient {
    async fn count_items(&self, query: &ItemCountQuery) -> Result<u64, streamcord_api::Error> {
        JellyfinClient::count_items(self, query).await
    }
}

fn item_types(kind: LibraryKind) -> Option<&'static str> {
    match kind {
        LibraryKind::Movies => Some("Movie"),
        LibraryKind::Shows => Some("Series"),
        LibraryKind::Music => Some("Audio,MusicAlbum"),
        LibraryKind::Other => None,
    }
}

/// The count query for a folder, or `None` when the folder is not counted.
pub(crate) fn count_query(folder: &MediaFolder) -> Option<ItemCountQuery> {
    if SKIPPED_FOLDERS
        .iter()
        .any(|skip| folder.name.eq_ignore_ascii_case(skip))
    {
        return None;
    }

    let kind = LibraryKind::from_collection_type(folder.collection_type.as_deref());
    let include_item_types = item_types(kind)?;
    let flags = LibraryFlags::from_name(&folder.name);

    let (min_width, max_width) = if flags.is_4k {
        (Some(UHD_MIN_WIDTH), None)
    } else if flags.is_kids || flags.is_anime {
        (None, None)
    } else {
        (None, Some(UHD_MIN_WIDTH - 1))
    };

    Some(ItemCountQuery {
        parent_id: folder.id.clone(),
        include_item_types: include_item_types.to_owned(),
        min_width,
        max_width,
    })
}

/// Count one folder, retrying an empty shows count without width filters.
async fn count_folder(
    counter: &dyn ItemCounter,
    kind: LibraryKind,
    query: &ItemCountQuery,
) -> Result<u64, streamcord_api::Error> {
    let count = counter.count_items(query).await?;
    if count > 0 || kind != LibraryKind::Shows {
        return Ok(count);
    }

    let relaxed = ItemCountQuery {
        min_width: None,
        max_width: None,
        ..query.clone()
    };
    let retried = counter.count_items(&relaxed).await?;
    debug!(parent_id = %query.parent_id, count = retried, "retried empty shows count without width filter");
    Ok(retried)
}

/// Summarize every countable folder.
///
/// A folder whose count fails is logged and left out, never reported as
/// zero.
pub(crate) async fn summarize_libraries(
    counter: &dyn ItemCounter,
    folders: &[MediaFolder],
) -> Vec<LibrarySummary> {
    let mut summaries = Vec::with_capacity(folders.len());

    for folder in folders {
        let Some(query) = count_query(folder) else {
            debug!(library = %folder.name, "skipping library");
            continue;
        };
        let kind = LibraryKind::from_collection_type(folder.collection_type.as_deref());

        match count_folder(counter, kind, &query).await {
            Ok(count) => summaries.push(LibrarySummary::new(folder.name.clone(), kind, count)),
            Err(e) => warn!(library = %folder.name, error = %e, "library count failed, omitting"),
        }
    }

    summaries
}
