//! Item lifecycle: staging drafts, editing, and confirming them into the inventory.
//!
//! Confirming a draft merges it into an existing confirmed item with the same
//! name (case-insensitive) when there is one, so repeated scans of the same
//! food do not pile up duplicate inventory rows.

use crate::database::{log_failure, DbResult};
use crate::models::{Item, ItemStatus};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::Serialize;

const ITEM_COLUMNS: &str = "id, name, image_url, quantity, status";

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    let image_url: Option<String> = row.get(2)?;
    Ok(Item {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        image_url: image_url.filter(|url| !url.is_empty()),
        quantity: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        status: row.get(4)?,
    })
}

/// Insert a new draft item and return its id.
///
/// No validation happens here; empty names and any quantity are stored as given.
pub fn add_item(
    conn: &Connection,
    name: &str,
    quantity: i64,
    image_url: Option<&str>,
) -> DbResult<i64> {
    let result = conn
        .execute(
            "INSERT INTO items (name, quantity, image_url, status) VALUES (?1, ?2, ?3, ?4)",
            params![name, quantity, image_url.unwrap_or(""), ItemStatus::Draft],
        )
        .map(|_| conn.last_insert_rowid());
    let id = log_failure("adding item", result)?;
    log::debug!("Added item: {} (id {})", name, id);
    Ok(id)
}

/// Look up a single item by id
pub fn get_item(conn: &Connection, id: i64) -> DbResult<Option<Item>> {
    let result = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
            params![id],
            row_to_item,
        )
        .optional();
    log_failure("getting item", result)
}

/// All items with the given status, in store order
pub fn list_items(conn: &Connection, status: ItemStatus) -> DbResult<Vec<Item>> {
    // NULL status counts as draft, as it does when the row is read
    let result = conn
        .prepare_cached(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE COALESCE(status, 'draft') = ?1 ORDER BY id"
        ))
        .and_then(|mut stmt| {
            let items = stmt
                .query_map(params![status], row_to_item)?
                .collect::<DbResult<Vec<_>>>()?;
            Ok(items)
        });
    log_failure("listing items", result)
}

/// Overwrite an item's quantity. Returns the number of rows changed (0 if the id is unknown).
pub fn update_item_quantity(conn: &Connection, id: i64, quantity: i64) -> DbResult<usize> {
    let result = conn.execute(
        "UPDATE items SET quantity = ?1 WHERE id = ?2",
        params![quantity, id],
    );
    log_failure("updating item quantity", result)
}

/// Overwrite an item's name. Returns the number of rows changed.
pub fn update_item_name(conn: &Connection, id: i64, name: &str) -> DbResult<usize> {
    let result = conn.execute(
        "UPDATE items SET name = ?1 WHERE id = ?2",
        params![name, id],
    );
    log_failure("updating item name", result)
}

/// Remove an item in either status. Deleting an unknown id is a no-op.
pub fn delete_item(conn: &Connection, id: i64) -> DbResult<usize> {
    let result = conn.execute("DELETE FROM items WHERE id = ?1", params![id]);
    let deleted = log_failure("deleting item", result)?;
    log::debug!("Deleted item {} ({} rows)", id, deleted);
    Ok(deleted)
}

/// What `confirm_item` did with a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOutcome {
    /// No row with this id exists
    Missing,
    /// The row exists but is already confirmed; nothing changed
    AlreadyConfirmed,
    /// The draft itself became the confirmed row
    Promoted { id: i64 },
    /// The draft's quantity was added to an existing confirmed row and the draft removed
    Merged { into: i64, quantity: i64 },
}

/// Confirm one draft item.
///
/// If a confirmed item with the same name (ignoring case) exists, the draft's
/// quantity is added to it and the draft is deleted; the existing row keeps its
/// name and image. Otherwise the draft is flipped to `confirmed` in place.
/// The lookup, update and delete run in a single transaction.
pub fn confirm_item(conn: &mut Connection, id: i64) -> DbResult<ConfirmOutcome> {
    let result = conn.transaction().and_then(|tx| {
        let outcome = confirm_item_tx(&tx, id)?;
        tx.commit()?;
        Ok(outcome)
    });
    let outcome = log_failure("confirming item", result)?;
    log::debug!("Confirm item {}: {:?}", id, outcome);
    Ok(outcome)
}

fn confirm_item_tx(tx: &Transaction<'_>, id: i64) -> DbResult<ConfirmOutcome> {
    let draft = tx
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
            params![id],
            row_to_item,
        )
        .optional()?;

    let draft = match draft {
        None => return Ok(ConfirmOutcome::Missing),
        Some(item) if item.status == ItemStatus::Confirmed => {
            return Ok(ConfirmOutcome::AlreadyConfirmed)
        }
        Some(item) => item,
    };

    // Oldest confirmed row wins when legacy data holds several with the same name
    let existing: Option<(i64, i64)> = tx
        .query_row(
            "SELECT id, COALESCE(quantity, 0) FROM items
             WHERE status = ?1 AND name = ?2 COLLATE NOCASE
             ORDER BY id
             LIMIT 1",
            params![ItemStatus::Confirmed, draft.name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match existing {
        Some((into, quantity)) => {
            let merged = quantity + draft.quantity;
            tx.execute(
                "UPDATE items SET quantity = ?1 WHERE id = ?2",
                params![merged, into],
            )?;
            tx.execute("DELETE FROM items WHERE id = ?1", params![draft.id])?;
            Ok(ConfirmOutcome::Merged {
                into,
                quantity: merged,
            })
        }
        None => {
            tx.execute(
                "UPDATE items SET status = ?1 WHERE id = ?2",
                params![ItemStatus::Confirmed, draft.id],
            )?;
            Ok(ConfirmOutcome::Promoted { id: draft.id })
        }
    }
}

/// Statistics from a bulk confirm
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmAllStats {
    /// Drafts that became confirmed rows themselves
    pub promoted: usize,
    /// Drafts folded into an existing confirmed row
    pub merged: usize,
}

/// Confirm every draft item.
///
/// With `merge_by_name = false` this is the bulk status flip: every draft becomes
/// confirmed as-is, so same-name drafts (or a draft matching an existing
/// confirmed item) end up as separate confirmed rows. With `merge_by_name = true`
/// each draft goes through the single-confirm merge rule, oldest draft first.
/// Either way the whole batch commits or rolls back together.
pub fn confirm_all(conn: &mut Connection, merge_by_name: bool) -> DbResult<ConfirmAllStats> {
    let result = conn.transaction().and_then(|tx| {
        let stats = if merge_by_name {
            confirm_all_merging_tx(&tx)?
        } else {
            let promoted = tx.execute(
                "UPDATE items SET status = ?1 WHERE COALESCE(status, 'draft') = ?2",
                params![ItemStatus::Confirmed, ItemStatus::Draft],
            )?;
            ConfirmAllStats {
                promoted,
                merged: 0,
            }
        };
        tx.commit()?;
        Ok(stats)
    });
    let stats = log_failure("confirming all items", result)?;
    log::info!(
        "Confirmed all drafts: {} promoted, {} merged",
        stats.promoted,
        stats.merged
    );
    Ok(stats)
}

fn confirm_all_merging_tx(tx: &Transaction<'_>) -> DbResult<ConfirmAllStats> {
    let draft_ids: Vec<i64> = tx
        .prepare("SELECT id FROM items WHERE COALESCE(status, 'draft') = ?1 ORDER BY id")?
        .query_map(params![ItemStatus::Draft], |row| row.get(0))?
        .collect::<DbResult<Vec<_>>>()?;

    let mut stats = ConfirmAllStats::default();
    for id in draft_ids {
        match confirm_item_tx(tx, id)? {
            ConfirmOutcome::Promoted { .. } => stats.promoted += 1,
            ConfirmOutcome::Merged { .. } => stats.merged += 1,
            ConfirmOutcome::Missing | ConfirmOutcome::AlreadyConfirmed => {}
        }
    }
    Ok(stats)
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
