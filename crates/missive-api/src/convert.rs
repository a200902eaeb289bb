//! Store rows to API models. A corrupt id or timestamp is logged and replaced
//! with a default rather than failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use missive_db::models::{HistoryRow, MessageRow, NotificationRow, ThreadReplyRow, UnreadMessageRow};
use missive_types::models::{Message, MessageHistoryEntry, Notification, ThreadReply, UnreadMessage};

pub fn message(row: MessageRow) -> Message {
    Message {
        id: parse_id(&row.id, "message id", &row.id),
        sender_id: parse_id(&row.sender_id, "sender_id", &row.id),
        receiver_id: parse_id(&row.receiver_id, "receiver_id", &row.id),
        timestamp: parse_time(&row.timestamp, &row.id),
        edited: row.edited,
        parent_message_id: row.parent_message_id.as_deref().map(|p| parse_id(p, "parent_message_id", &row.id)),
        read: row.read,
        content: row.content,
    }
}

pub fn notification(row: NotificationRow) -> Notification {
    Notification {
        id: parse_id(&row.id, "notification id", &row.id),
        user_id: parse_id(&row.user_id, "user_id", &row.id),
        message_id: parse_id(&row.message_id, "message_id", &row.id),
        is_read: row.is_read,
        created_at: parse_time(&row.created_at, &row.id),
    }
}

pub fn history_entry(row: HistoryRow) -> MessageHistoryEntry {
    MessageHistoryEntry {
        id: parse_id(&row.id, "history id", &row.id),
        message_id: parse_id(&row.message_id, "message_id", &row.id),
        edited_by: row.edited_by.as_deref().map(|e| parse_id(e, "edited_by", &row.id)),
        edited_at: parse_time(&row.edited_at, &row.id),
        old_content: row.old_content,
    }
}

pub fn unread_message(row: UnreadMessageRow) -> UnreadMessage {
    UnreadMessage {
        id: parse_id(&row.id, "message id", &row.id),
        sender_id: parse_id(&row.sender_id, "sender_id", &row.id),
        receiver_id: parse_id(&row.receiver_id, "receiver_id", &row.id),
        timestamp: parse_time(&row.timestamp, &row.id),
        parent_message_id: row.parent_message_id.as_deref().map(|p| parse_id(p, "parent_message_id", &row.id)),
        sender_username: row.sender_username,
        receiver_username: row.receiver_username,
        content: row.content,
    }
}

pub fn thread_reply(row: ThreadReplyRow) -> ThreadReply {
    let parent = row.message.id.clone();
    ThreadReply {
        reply_ids: row.reply_ids.iter().map(|id| parse_id(id, "reply id", &parent)).collect(),
        message: message(row.message),
        sender_username: row.sender_username,
        receiver_username: row.receiver_username,
    }
}

fn parse_id(raw: &str, field: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", field, raw, row_id, e);
        Uuid::default()
    })
}

fn parse_time(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>().unwrap_or_else(|e| {
        warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
        DateTime::default()
    })
}
