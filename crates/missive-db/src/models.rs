//! Database row types — these map directly to SQLite rows.
//! Ids and timestamps stay as TEXT here; missive-api converts them to typed models.
use rusqlite::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp: String,
    pub edited: bool,
    pub parent_message_id: Option<String>,
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message_id: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: String,
    pub message_id: String,
    pub old_content: String,
    pub edited_by: Option<String>,
    pub edited_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadMessageRow {
    pub id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub receiver_id: String,
    pub receiver_username: String,
    pub content: String,
    pub timestamp: String,
    pub parent_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadReplyRow {
    pub message: MessageRow,
    pub sender_username: String,
    pub receiver_username: String,
    /// Direct replies of this reply, in creation order.
    pub reply_ids: Vec<String>,
}

// -- Write inputs --

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

pub struct NewMessage<'a> {
    pub sender_id: &'a str,
    pub receiver_id: &'a str,
    pub content: &'a str,
    pub parent_message_id: Option<&'a str>,
}

/// Fields a caller may change on an existing message. `None` leaves the field alone.
#[derive(Debug, Default, Clone)]
pub struct MessageChanges {
    pub content: Option<String>,
    pub read: Option<bool>,
}

// -- Read filters --

/// Inclusive bounds on message timestamps, in the stored RFC 3339 form.
/// `None` leaves that side open.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: Option<String>,
    pub until: Option<String>,
}

// -- Column lists and mappers --

pub(crate) const USER_COLUMNS: &str = "id, username, email, password, created_at";

/// Message columns qualified with the `m` alias, in `MessageRow::from_row` order.
pub(crate) const MESSAGE_COLUMNS: &str =
    "m.id, m.sender_id, m.receiver_id, m.content, m.timestamp, m.edited, m.parent_message_id, m.read";

pub(crate) const MESSAGE_COLUMN_COUNT: usize = 8;

pub(crate) const NOTIFICATION_COLUMNS: &str = "id, user_id, message_id, is_read, created_at";

pub(crate) const HISTORY_COLUMNS: &str = "id, message_id, old_content, edited_by, edited_at";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl MessageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            receiver_id: row.get(2)?,
            content: row.get(3)?,
            timestamp: row.get(4)?,
            edited: row.get(5)?,
            parent_message_id: row.get(6)?,
            read: row.get(7)?,
        })
    }
}

impl NotificationRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            message_id: row.get(2)?,
            is_read: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl HistoryRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            message_id: row.get(1)?,
            old_content: row.get(2)?,
            edited_by: row.get(3)?,
            edited_at: row.get(4)?,
        })
    }
}
