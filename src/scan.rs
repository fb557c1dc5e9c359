//! Staging a scan: vision guesses -> stock photos -> draft items.
//!
//! Image lookups are network calls, so they run before the store is touched;
//! the drafts are then written in one transaction.

use crate::database::DbResult;
use crate::image_search::ImageSearchClient;
use crate::items::add_item;
use crate::models::ScannedItem;
use rusqlite::Connection;
use serde::Serialize;

/// A scanned item ready to be stored as a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDraft {
    pub name: String,
    pub quantity: i64,
    pub image_url: String,
}

/// Look up a photo for every scanned item. Items with a blank name are skipped.
pub async fn prepare_drafts(
    images: &ImageSearchClient,
    scanned: &[ScannedItem],
) -> Vec<PendingDraft> {
    let mut drafts = Vec::with_capacity(scanned.len());
    for item in scanned {
        let name = item.name.trim();
        if name.is_empty() {
            log::warn!("Skipping scanned item without a name");
            continue;
        }
        drafts.push(PendingDraft {
            name: name.to_string(),
            quantity: item.quantity(),
            image_url: images.search_image(name).await,
        });
    }
    drafts
}

/// Store the drafts and return their new ids, in order.
pub fn stage_drafts(conn: &mut Connection, drafts: &[PendingDraft]) -> DbResult<Vec<i64>> {
    let tx = conn.transaction()?;
    let ids = drafts
        .iter()
        .map(|d| add_item(&tx, &d.name, d.quantity, Some(d.image_url.as_str())))
        .collect::<DbResult<Vec<_>>>()?;
    tx.commit()?;
    log::info!("Staged {} scanned items as drafts", ids.len());
    Ok(ids)
}
