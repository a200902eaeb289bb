use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub edited: bool,
    pub parent_message_id: Option<Uuid>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A prior version of a message's content.
/// `edited_by` is `None` when the editor was unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHistoryEntry {
    pub id: Uuid,
    pub message_id: Uuid,
    pub old_content: String,
    pub edited_by: Option<Uuid>,
    pub edited_at: DateTime<Utc>,
}

/// Reduced projection served by the unread index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub receiver_id: Uuid,
    pub receiver_username: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub parent_message_id: Option<Uuid>,
}

/// One direct reply, with its participants and the ids of the next level attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadReply {
    #[serde(flatten)]
    pub message: Message,
    pub sender_username: String,
    pub receiver_username: String,
    pub reply_ids: Vec<Uuid>,
}
