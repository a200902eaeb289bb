//! Side effects of message and user mutations.
//!
//! Each hook takes the caller's open [`Transaction`], so its writes commit or
//! roll back together with the mutation that triggered it. The store calls
//! them directly from its write path; there is exactly one hook per event.

use rusqlite::{Transaction, params};
use tracing::debug;
use uuid::Uuid;

use crate::models::MessageRow;
use crate::queries::next_timestamp;
use crate::threads;
use crate::{Result, StoreError};

/// Rows removed directly by [`before_user_delete`]. Rows removed by
/// foreign-key cascades are not counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UserCleanup {
    pub history: usize,
    pub messages: usize,
    pub notifications: usize,
}

/// Notify the receiver of a freshly inserted message.
pub fn on_message_created(tx: &Transaction<'_>, message: &MessageRow) -> Result<()> {
    let notification_id = Uuid::new_v4().to_string();
    let created_at = next_timestamp(tx, "notifications", "created_at")?;
    tx.execute(
        "INSERT INTO notifications (id, user_id, message_id, is_read, created_at) VALUES (?1, ?2, ?3, 0, ?4)",
        params![notification_id, message.receiver_id, message.id, created_at],
    )?;

    debug!("Notification {} for user {}", notification_id, message.receiver_id);
    Ok(())
}

/// Log the stored content of `message_id` before it is replaced by `new_content`.
///
/// The stored content is re-read inside the transaction rather than taken
/// from the caller. Returns `true` when the content changed and a history row
/// was written; the caller must then set `edited`.
pub fn before_message_update(
    tx: &Transaction<'_>,
    message_id: &str,
    new_content: &str,
    editor: Option<&str>,
) -> Result<bool> {
    let old_content: String = tx
        .query_row("SELECT content FROM messages WHERE id = ?1", [message_id], |row| row.get(0))
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("message", message_id),
            other => other.into(),
        })?;

    if old_content == new_content {
        return Ok(false);
    }

    let edited_at = next_timestamp(tx, "message_history", "edited_at")?;
    tx.execute(
        "INSERT INTO message_history (id, message_id, old_content, edited_by, edited_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![Uuid::new_v4().to_string(), message_id, old_content, editor, edited_at],
    )?;

    debug!("Logged edit of message {} by {:?}", message_id, editor);
    Ok(true)
}

/// Clear out everything owned by `user_id` ahead of deleting the user row.
///
/// History rows the user authored are hard-deleted here, so the schema's
/// `ON DELETE SET NULL` on `edited_by` never sees them.
pub fn before_user_delete(tx: &Transaction<'_>, user_id: &str) -> Result<UserCleanup> {
    let history = tx.execute("DELETE FROM message_history WHERE edited_by = ?1", [user_id])?;

    let owned: Vec<String> = tx
        .prepare("SELECT id FROM messages WHERE sender_id = ?1 OR receiver_id = ?1")?
        .query_map([user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // Replies from other users go with the thread; notifications and history
    // on each message go by cascade.
    let messages = threads::delete_subtrees(tx, &owned)?;

    let notifications = tx.execute("DELETE FROM notifications WHERE user_id = ?1", [user_id])?;

    Ok(UserCleanup {
        history,
        messages,
        notifications,
    })
}
