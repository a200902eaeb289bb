use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id                  TEXT PRIMARY KEY,
            sender_id           TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            receiver_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content             TEXT NOT NULL,
            timestamp           TEXT NOT NULL,
            edited              INTEGER NOT NULL DEFAULT 0,
            parent_message_id   TEXT REFERENCES messages(id) ON DELETE CASCADE,
            read                INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver_unread
            ON messages(receiver_id, read, timestamp);

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, timestamp);

        CREATE INDEX IF NOT EXISTS idx_messages_parent
            ON messages(parent_message_id, timestamp);

        CREATE INDEX IF NOT EXISTS idx_messages_timestamp
            ON messages(timestamp);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            message_id  TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_notifications_message
            ON notifications(message_id);

        CREATE INDEX IF NOT EXISTS idx_notifications_created
            ON notifications(created_at);

        -- edited_by nulls out if a user row is removed outside the store;
        -- Database::delete_user hard-deletes these rows first.
        CREATE TABLE IF NOT EXISTS message_history (
            id           TEXT PRIMARY KEY,
            message_id   TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            old_content  TEXT NOT NULL,
            edited_by    TEXT REFERENCES users(id) ON DELETE SET NULL,
            edited_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_history_message
            ON message_history(message_id, edited_at);

        CREATE INDEX IF NOT EXISTS idx_history_editor
            ON message_history(edited_by);

        CREATE INDEX IF NOT EXISTS idx_history_edited
            ON message_history(edited_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
