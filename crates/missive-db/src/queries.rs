use crate::hooks;
use crate::threads;
use crate::models::{
    HISTORY_COLUMNS, HistoryRow, MESSAGE_COLUMNS, MessageChanges, MessageRow, NOTIFICATION_COLUMNS,
    NewMessage, NewUser, NotificationRow, TimeWindow, USER_COLUMNS, UserRow,
};
use crate::{Database, Result, StoreError};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info};
use uuid::Uuid;

impl Database {
    // -- Users --

    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserRow> {
        validate_username(new.username)?;
        validate_email(new.email)?;

        self.with_tx(|tx| {
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 OR email = ?2)",
                params![new.username, new.email],
                |row| row.get(0),
            )?;
            if taken {
                return Err(StoreError::Conflict(format!(
                    "username or email already registered: {}",
                    new.username
                )));
            }

            let row = UserRow {
                id: Uuid::new_v4().to_string(),
                username: new.username.to_string(),
                email: new.email.to_string(),
                password: new.password_hash.to_string(),
                created_at: now_timestamp(),
            };
            tx.execute(
                "INSERT INTO users (id, username, email, password, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.id, row.username, row.email, row.password, row.created_at],
            )?;

            info!("Created user {} ({})", row.username, row.id);
            Ok(row)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Deletes a user together with everything they own. See
    /// [`hooks::before_user_delete`] for what goes with them.
    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.with_tx(|tx| {
            if query_user(tx, "id", id)?.is_none() {
                return Err(StoreError::not_found("user", id));
            }

            let cleanup = hooks::before_user_delete(tx, id)?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;

            info!(
                "Deleted user {}: {} messages, {} notifications, {} history entries",
                id, cleanup.messages, cleanup.notifications, cleanup.history
            );
            Ok(())
        })
    }

    // -- Messages --

    pub fn create_message(&self, new: &NewMessage<'_>) -> Result<MessageRow> {
        validate_content(new.content)?;

        self.with_tx(|tx| {
            require_user(tx, new.sender_id)?;
            require_user(tx, new.receiver_id)?;
            if let Some(parent_id) = new.parent_message_id {
                if query_message(tx, parent_id)?.is_none() {
                    return Err(StoreError::reference("message", parent_id));
                }
            }

            let row = MessageRow {
                id: Uuid::new_v4().to_string(),
                sender_id: new.sender_id.to_string(),
                receiver_id: new.receiver_id.to_string(),
                content: new.content.to_string(),
                timestamp: next_timestamp(tx, "messages", "timestamp")?,
                edited: false,
                parent_message_id: new.parent_message_id.map(str::to_string),
                read: false,
            };
            tx.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, timestamp, edited, parent_message_id, read)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, 0)",
                params![
                    row.id,
                    row.sender_id,
                    row.receiver_id,
                    row.content,
                    row.timestamp,
                    row.parent_message_id
                ],
            )?;

            hooks::on_message_created(tx, &row)?;

            debug!("Message {} from {} to {}", row.id, row.sender_id, row.receiver_id);
            Ok(row)
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Every message the user sent or received inside `window`, oldest first.
    pub fn messages_for_user(&self, user_id: &str, window: &TimeWindow) -> Result<Vec<MessageRow>> {
        validate_window(window)?;

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE (m.sender_id = ?1 OR m.receiver_id = ?1)
                   AND (?2 IS NULL OR m.timestamp >= ?2)
                   AND (?3 IS NULL OR m.timestamp <= ?3)
                 ORDER BY m.timestamp ASC, m.rowid ASC"
            ))?;

            let rows = stmt
                .query_map(params![user_id, window.since, window.until], MessageRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Messages exchanged between `user_id` and `other_id` in either
    /// direction inside `window`, oldest first.
    pub fn conversation_with(
        &self,
        user_id: &str,
        other_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MessageRow>> {
        validate_window(window)?;

        self.with_conn(|conn| {
            if query_user(conn, "id", other_id)?.is_none() {
                return Err(StoreError::not_found("user", other_id));
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE ((m.sender_id = ?1 AND m.receiver_id = ?2)
                     OR (m.sender_id = ?2 AND m.receiver_id = ?1))
                   AND (?3 IS NULL OR m.timestamp >= ?3)
                   AND (?4 IS NULL OR m.timestamp <= ?4)
                 ORDER BY m.timestamp ASC, m.rowid ASC"
            ))?;

            let rows = stmt
                .query_map(
                    params![user_id, other_id, window.since, window.until],
                    MessageRow::from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            debug!("{} messages between {} and {}", rows.len(), user_id, other_id);
            Ok(rows)
        })
    }

    /// Apply `changes` to a message. A content change is logged to history
    /// with `editor` as the author, and marks the message edited.
    pub fn update_message(
        &self,
        id: &str,
        changes: &MessageChanges,
        editor: Option<&str>,
    ) -> Result<MessageRow> {
        if let Some(content) = &changes.content {
            validate_content(content)?;
        }

        self.with_tx(|tx| {
            let mut row = query_message(tx, id)?.ok_or_else(|| StoreError::not_found("message", id))?;
            if let Some(editor_id) = editor {
                require_user(tx, editor_id)?;
            }

            if let Some(content) = &changes.content {
                if hooks::before_message_update(tx, id, content, editor)? {
                    row.edited = true;
                }
                row.content = content.clone();
            }
            if let Some(read) = changes.read {
                row.read = read;
            }

            tx.execute(
                "UPDATE messages SET content = ?2, edited = ?3, read = ?4 WHERE id = ?1",
                params![row.id, row.content, row.edited, row.read],
            )?;

            Ok(row)
        })
    }

    /// Only the receiver may mark a message read.
    pub fn mark_message_read(&self, id: &str, actor_id: &str) -> Result<MessageRow> {
        self.with_tx(|tx| {
            let mut row = query_message(tx, id)?.ok_or_else(|| StoreError::not_found("message", id))?;
            if row.receiver_id != actor_id {
                return Err(StoreError::Permission(format!(
                    "only the receiver can mark message {} read",
                    id
                )));
            }

            tx.execute("UPDATE messages SET read = 1 WHERE id = ?1", [id])?;
            row.read = true;
            Ok(row)
        })
    }

    /// Replies, notifications and history go with the message.
    pub fn delete_message(&self, id: &str) -> Result<()> {
        self.with_tx(|tx| {
            if query_message(tx, id)?.is_none() {
                return Err(StoreError::not_found("message", id));
            }

            let removed = threads::delete_subtrees(tx, &[id.to_string()])?;
            debug!("Deleted message {} with {} replies", id, removed.saturating_sub(1));
            Ok(())
        })
    }

    // -- Notifications --

    /// Newest first.
    pub fn notifications_for_user(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;

            let rows = stmt
                .query_map([user_id], NotificationRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn mark_notification_read(&self, id: &str, actor_id: &str) -> Result<NotificationRow> {
        self.with_tx(|tx| {
            let mut row = tx
                .query_row(
                    &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
                    [id],
                    NotificationRow::from_row,
                )
                .optional()?
                .ok_or_else(|| StoreError::not_found("notification", id))?;

            if row.user_id != actor_id {
                return Err(StoreError::Permission(format!(
                    "notification {} belongs to another user",
                    id
                )));
            }

            tx.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
            row.is_read = true;
            Ok(row)
        })
    }

    // -- History --

    /// Prior versions of a message, newest first. Restricted to the
    /// message's sender and receiver.
    pub fn history_for_message(&self, message_id: &str, actor_id: &str) -> Result<Vec<HistoryRow>> {
        self.with_conn(|conn| {
            let message = query_message(conn, message_id)?
                .ok_or_else(|| StoreError::not_found("message", message_id))?;
            if message.sender_id != actor_id && message.receiver_id != actor_id {
                return Err(StoreError::Permission(format!(
                    "not a participant of message {}",
                    message_id
                )));
            }

            let mut stmt = conn.prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM message_history
                 WHERE message_id = ?1
                 ORDER BY edited_at DESC, rowid DESC"
            ))?;

            let rows = stmt
                .query_map([message_id], HistoryRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// Server-assigned timestamp. Fixed-width RFC 3339 so TEXT order is time order.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Timestamp for a new row of `table`, never earlier than the latest value
/// already in `column`. The wall clock can step back; stored order must not.
/// Equal values fall back to rowid, which grows with each insert.
pub(crate) fn next_timestamp(conn: &Connection, table: &'static str, column: &'static str) -> Result<String> {
    let now = now_timestamp();
    let latest: Option<String> =
        conn.query_row(&format!("SELECT MAX({column}) FROM {table}"), [], |row| row.get(0))?;

    Ok(match latest {
        Some(latest) if latest > now => latest,
        _ => now,
    })
}

pub(crate) fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1"),
            [id],
            MessageRow::from_row,
        )
        .optional()?;

    Ok(row)
}

fn query_user(conn: &Connection, column: &'static str, value: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;
    let row = stmt.query_row([value], UserRow::from_row).optional()?;

    Ok(row)
}

fn require_user(conn: &Connection, id: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::reference("user", id))
    }
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(StoreError::Validation("message content must not be empty".into()));
    }
    Ok(())
}

fn validate_window(window: &TimeWindow) -> Result<()> {
    if let (Some(since), Some(until)) = (&window.since, &window.until) {
        if since > until {
            return Err(StoreError::Validation(format!(
                "window starts after it ends: {} > {}",
                since, until
            )));
        }
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 || username.len() > 32 {
        return Err(StoreError::Validation("username must be 3-32 characters".into()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(StoreError::Validation(format!("invalid email: {}", email))),
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn user(db: &Database, name: &str) -> UserRow {
        db.create_user(&NewUser {
            username: name,
            email: &format!("{}@example.com", name),
            password_hash: "not-a-real-hash",
        })
        .unwrap()
    }

    pub(crate) fn send(
        db: &Database,
        from: &UserRow,
        to: &UserRow,
        content: &str,
        parent: Option<&MessageRow>,
    ) -> MessageRow {
        db.create_message(&NewMessage {
            sender_id: &from.id,
            receiver_id: &to.id,
            content,
            parent_message_id: parent.map(|p| p.id.as_str()),
        })
        .unwrap()
    }

    pub(crate) fn count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn create_user_rejects_duplicates() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "alice");

        let err = db
            .create_user(&NewUser {
                username: "alice",
                email: "other@example.com",
                password_hash: "x",
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn create_user_validates_fields() {
        let db = Database::open_in_memory().unwrap();

        let short = db.create_user(&NewUser { username: "al", email: "al@example.com", password_hash: "x" });
        assert!(matches!(short, Err(StoreError::Validation(_))));

        let bad_email = db.create_user(&NewUser { username: "alice", email: "alice", password_hash: "x" });
        assert!(matches!(bad_email, Err(StoreError::Validation(_))));
        assert_eq!(count(&db, "users"), 0);
    }

    #[test]
    fn user_lookups() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");

        assert_eq!(db.get_user_by_username("alice").unwrap(), Some(alice.clone()));
        assert_eq!(db.get_user_by_id(&alice.id).unwrap(), Some(alice));
        assert_eq!(db.get_user_by_username("nobody").unwrap(), None);
    }

    #[test]
    fn create_message_defaults() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");

        let msg = send(&db, &a, &b, "hi", None);
        let stored = db.get_message(&msg.id).unwrap().unwrap();
        assert_eq!(stored, msg);
        assert!(!stored.edited);
        assert!(!stored.read);
        assert_eq!(stored.parent_message_id, None);
    }

    #[test]
    fn create_message_rejects_empty_content() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");

        let err = db
            .create_message(&NewMessage {
                sender_id: &a.id,
                receiver_id: &b.id,
                content: "   ",
                parent_message_id: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(count(&db, "messages"), 0);
    }

    #[test]
    fn create_message_rejects_missing_references() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let ghost = Uuid::new_v4().to_string();

        let err = db
            .create_message(&NewMessage {
                sender_id: &a.id,
                receiver_id: &ghost,
                content: "hello?",
                parent_message_id: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Reference { entity: "user", .. }));

        let err = db
            .create_message(&NewMessage {
                sender_id: &a.id,
                receiver_id: &a.id,
                content: "note to self",
                parent_message_id: Some(&ghost),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Reference { entity: "message", .. }));

        assert_eq!(count(&db, "messages"), 0);
        assert_eq!(count(&db, "notifications"), 0);
    }

    #[test]
    fn messages_for_user_lists_both_directions_in_order() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let c = user(&db, "carol");

        let m1 = send(&db, &a, &b, "one", None);
        let m2 = send(&db, &b, &a, "two", None);
        send(&db, &b, &c, "not for alice", None);

        let ids: Vec<_> = db
            .messages_for_user(&a.id, &TimeWindow::default())
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![m1.id, m2.id]);
    }

    fn set_timestamp(db: &Database, id: &str, timestamp: &str) {
        db.with_conn(|conn| {
            conn.execute("UPDATE messages SET timestamp = ?2 WHERE id = ?1", [id, timestamp])?;
            Ok(())
        })
        .unwrap();
    }

    fn window(since: Option<&str>, until: Option<&str>) -> TimeWindow {
        TimeWindow {
            since: since.map(str::to_string),
            until: until.map(str::to_string),
        }
    }

    #[test]
    fn messages_for_user_respects_window() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let early = send(&db, &a, &b, "early", None);
        let middle = send(&db, &b, &a, "middle", None);
        let late = send(&db, &a, &b, "late", None);
        set_timestamp(&db, &early.id, "2024-01-01T08:00:00.000000Z");
        set_timestamp(&db, &middle.id, "2024-01-01T12:00:00.000000Z");
        set_timestamp(&db, &late.id, "2024-01-01T18:00:00.000000Z");

        let ids = |w: TimeWindow| -> Vec<String> {
            db.messages_for_user(&a.id, &w).unwrap().into_iter().map(|m| m.id).collect()
        };

        assert_eq!(
            ids(window(Some("2024-01-01T12:00:00.000000Z"), None)),
            vec![middle.id.clone(), late.id.clone()]
        );
        assert_eq!(
            ids(window(None, Some("2024-01-01T12:00:00.000000Z"))),
            vec![early.id.clone(), middle.id.clone()]
        );
        assert_eq!(
            ids(window(Some("2024-01-01T09:00:00.000000Z"), Some("2024-01-01T17:00:00.000000Z"))),
            vec![middle.id]
        );

        let err = db
            .messages_for_user(
                &a.id,
                &window(Some("2024-01-02T00:00:00.000000Z"), Some("2024-01-01T00:00:00.000000Z")),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn conversation_is_two_party_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let c = user(&db, "carol");

        let m1 = send(&db, &a, &b, "hi bob", None);
        send(&db, &a, &c, "hi carol", None);
        let m2 = send(&db, &b, &a, "hi alice", Some(&m1));
        send(&db, &c, &b, "hi bob from carol", None);
        let m3 = send(&db, &a, &b, "how are you", None);

        let ids: Vec<_> = db
            .conversation_with(&a.id, &b.id, &TimeWindow::default())
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![m1.id.clone(), m2.id.clone(), m3.id.clone()]);

        // Same exchange seen from the other side.
        let ids: Vec<_> = db
            .conversation_with(&b.id, &a.id, &TimeWindow::default())
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![m1.id.clone(), m2.id.clone(), m3.id.clone()]);

        set_timestamp(&db, &m1.id, "2024-01-01T08:00:00.000000Z");
        let recent = db
            .conversation_with(&a.id, &b.id, &window(Some("2024-06-01T00:00:00.000000Z"), None))
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|m| m.id != m1.id));

        let err = db.conversation_with(&a.id, "missing", &TimeWindow::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let first = send(&db, &a, &b, "first", None);
        // As if the clock had been ahead when `first` was stored.
        let ahead = "2999-01-01T00:00:00.000000Z";
        set_timestamp(&db, &first.id, ahead);

        let second = send(&db, &a, &b, "second", None);
        assert!(second.timestamp.as_str() >= ahead);

        let ids: Vec<_> = db
            .messages_for_user(&a.id, &TimeWindow::default())
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);

        let unread: Vec<_> = db.unread_for_user(&b.id).unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(unread, vec![first.id, second.id]);
    }

    #[test]
    fn deleting_a_deep_chain_does_not_hit_trigger_depth() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let root = send(&db, &a, &b, "root", None);
        let mut tail = root.clone();
        for i in 0..1100 {
            tail = send(&db, &b, &a, &format!("reply {i}"), Some(&tail));
        }
        let bystander = send(&db, &b, &a, "unrelated", None);

        db.delete_message(&root.id).unwrap();

        assert_eq!(count(&db, "messages"), 1);
        assert!(db.get_message(&bystander.id).unwrap().is_some());
        assert_eq!(count(&db, "notifications"), 1);
    }

    #[test]
    fn mark_read_is_receiver_only() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let msg = send(&db, &a, &b, "hi", None);

        let err = db.mark_message_read(&msg.id, &a.id).unwrap_err();
        assert!(matches!(err, StoreError::Permission(_)));

        let read = db.mark_message_read(&msg.id, &b.id).unwrap();
        assert!(read.read);
        assert!(db.get_message(&msg.id).unwrap().unwrap().read);
    }

    #[test]
    fn delete_message_cascades_to_replies_and_notifications() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let root = send(&db, &a, &b, "root", None);
        let reply = send(&db, &b, &a, "reply", Some(&root));
        send(&db, &a, &b, "nested", Some(&reply));

        db.delete_message(&root.id).unwrap();
        assert_eq!(count(&db, "messages"), 0);
        assert_eq!(count(&db, "notifications"), 0);

        let err = db.delete_message(&root.id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "message", .. }));
    }

    #[test]
    fn notifications_are_newest_first_and_owner_only() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let first = send(&db, &a, &b, "first", None);
        let second = send(&db, &a, &b, "second", None);

        let notes = db.notifications_for_user(&b.id).unwrap();
        let message_ids: Vec<_> = notes.iter().map(|n| n.message_id.clone()).collect();
        assert_eq!(message_ids, vec![second.id, first.id]);
        assert!(db.notifications_for_user(&a.id).unwrap().is_empty());

        let err = db.mark_notification_read(&notes[0].id, &a.id).unwrap_err();
        assert!(matches!(err, StoreError::Permission(_)));

        let marked = db.mark_notification_read(&notes[0].id, &b.id).unwrap();
        assert!(marked.is_read);
    }

    #[test]
    fn history_requires_participant() {
        let db = Database::open_in_memory().unwrap();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let eve = user(&db, "eve");
        let msg = send(&db, &a, &b, "hi", None);

        let err = db.history_for_message(&msg.id, &eve.id).unwrap_err();
        assert!(matches!(err, StoreError::Permission(_)));

        let err = db.history_for_message("missing", &a.id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        assert!(db.history_for_message(&msg.id, &b.id).unwrap().is_empty());
    }
}
