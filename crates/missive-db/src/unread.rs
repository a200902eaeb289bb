use crate::models::UnreadMessageRow;
use crate::{Database, Result};

impl Database {
    /// Messages addressed to `user_id` that have not been read, oldest first.
    ///
    /// One statement, so the result is a single snapshot. Only the fields a
    /// client needs to render an inbox entry are selected.
    pub fn unread_for_user(&self, user_id: &str) -> Result<Vec<UnreadMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.sender_id, s.username, m.receiver_id, r.username,
                        m.content, m.timestamp, m.parent_message_id
                 FROM messages m
                 JOIN users s ON s.id = m.sender_id
                 JOIN users r ON r.id = m.receiver_id
                 WHERE m.receiver_id = ?1 AND m.read = 0
                 ORDER BY m.timestamp ASC, m.rowid ASC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(UnreadMessageRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        sender_username: row.get(2)?,
                        receiver_id: row.get(3)?,
                        receiver_username: row.get(4)?,
                        content: row.get(5)?,
                        timestamp: row.get(6)?,
                        parent_message_id: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
