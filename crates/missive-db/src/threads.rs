//! Reply threads. Replies point at their parent by id; a thread is read one
//! level at a time.

use std::collections::{HashMap, HashSet, VecDeque};

use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::models::{MESSAGE_COLUMN_COUNT, MESSAGE_COLUMNS, MessageRow, ThreadReplyRow};
use crate::{Database, Result};

/// Ids bound per `IN (...)` statement, well under SQLite's variable limit.
const MAX_BOUND_IDS: usize = 500;

impl Database {
    /// Direct replies to `message_id`, in creation order.
    ///
    /// Senders, receivers and the ids of each reply's own replies come back in
    /// the same statement, so this is a single round trip however many
    /// replies there are. Grandchildren are not expanded.
    pub fn replies_of(&self, message_id: &str) -> Result<Vec<ThreadReplyRow>> {
        self.with_conn(|conn| {
            // Child keys sort as "timestamp|rowid|id", which is creation order.
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS}, s.username, r.username,
                        (SELECT group_concat(printf('%s|%020d|%s', c.timestamp, c.rowid, c.id))
                           FROM messages c WHERE c.parent_message_id = m.id)
                 FROM messages m
                 JOIN users s ON s.id = m.sender_id
                 JOIN users r ON r.id = m.receiver_id
                 WHERE m.parent_message_id = ?1
                 ORDER BY m.timestamp ASC, m.rowid ASC"
            ))?;

            let rows = stmt
                .query_map([message_id], |row| {
                    let child_keys: Option<String> = row.get(MESSAGE_COLUMN_COUNT + 2)?;
                    Ok(ThreadReplyRow {
                        message: MessageRow::from_row(row)?,
                        sender_username: row.get(MESSAGE_COLUMN_COUNT)?,
                        receiver_username: row.get(MESSAGE_COLUMN_COUNT + 1)?,
                        reply_ids: ordered_child_ids(child_keys.as_deref()),
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The whole thread under `message_id`, grouped by depth: index 0 holds the
    /// direct replies, index 1 their replies, and so on, up to `max_depth` levels.
    ///
    /// Breadth-first with an explicit queue, one query per level.
    pub fn thread_levels(&self, message_id: &str, max_depth: usize) -> Result<Vec<Vec<MessageRow>>> {
        let mut levels = Vec::new();
        let mut frontier: VecDeque<String> = VecDeque::from([message_id.to_string()]);

        while !frontier.is_empty() && levels.len() < max_depth {
            let parents: Vec<String> = frontier.drain(..).collect();
            let level = self.children_of(&parents)?;
            if level.is_empty() {
                break;
            }

            frontier.extend(level.iter().map(|m| m.id.clone()));
            levels.push(level);
        }

        debug!("Thread {} resolved to {} levels", message_id, levels.len());
        Ok(levels)
    }

    fn children_of(&self, parent_ids: &[String]) -> Result<Vec<MessageRow>> {
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let mut rows: Vec<(String, i64, MessageRow)> = Vec::new();
            for chunk in parent_ids.chunks(MAX_BOUND_IDS) {
                let sql = format!(
                    "SELECT {MESSAGE_COLUMNS}, m.rowid FROM messages m
                     WHERE m.parent_message_id IN ({})",
                    placeholders(chunk.len())
                );

                let mut stmt = conn.prepare(&sql)?;
                let chunk_rows: Vec<(String, i64, MessageRow)> = stmt
                    .query_map(params_from_iter(chunk), |row| {
                        let message = MessageRow::from_row(row)?;
                        let rowid: i64 = row.get(MESSAGE_COLUMN_COUNT)?;
                        Ok((message.timestamp.clone(), rowid, message))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows.extend(chunk_rows);
            }

            // Chunks come back independently; restore creation order across them.
            rows.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
            Ok(rows.into_iter().map(|(_, _, message)| message).collect())
        })
    }
}

/// Ids of `roots` and every message below them, grouped by depth under the
/// topmost member of the set. A message's parent is always in an earlier level,
/// so deleting the levels last-to-first never cascades more than one step.
pub(crate) fn subtree_levels(conn: &Connection, roots: &[String]) -> Result<Vec<Vec<String>>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut frontier: Vec<String> = Vec::new();
    for root in roots {
        if seen.insert(root.clone()) {
            frontier.push(root.clone());
        }
    }
    let unique_roots = frontier.clone();

    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    let mut has_parent: HashSet<String> = HashSet::new();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for (id, parent_id) in child_links(conn, &frontier)? {
            children.entry(parent_id).or_default().push(id.clone());
            has_parent.insert(id.clone());
            // A root that is also a reply is already expanded
            if seen.insert(id.clone()) {
                next.push(id);
            }
        }
        frontier = next;
    }

    let mut levels = Vec::new();
    let mut level: Vec<String> = unique_roots
        .into_iter()
        .filter(|id| !has_parent.contains(id))
        .collect();

    while !level.is_empty() {
        let next: Vec<String> = level
            .iter()
            .filter_map(|id| children.get(id))
            .flatten()
            .cloned()
            .collect();
        levels.push(level);
        level = next;
    }

    Ok(levels)
}

/// Delete `roots` with all their replies, deepest level first. Returns the
/// number of messages removed.
pub(crate) fn delete_subtrees(conn: &Connection, roots: &[String]) -> Result<usize> {
    let levels = subtree_levels(conn, roots)?;

    let mut removed = 0;
    for level in levels.iter().rev() {
        for chunk in level.chunks(MAX_BOUND_IDS) {
            removed += conn.execute(
                &format!("DELETE FROM messages WHERE id IN ({})", placeholders(chunk.len())),
                params_from_iter(chunk),
            )?;
        }
    }

    debug!("Deleted {} messages across {} thread levels", removed, levels.len());
    Ok(removed)
}

/// `(id, parent_message_id)` for every direct reply to one of `parent_ids`.
fn child_links(conn: &Connection, parent_ids: &[String]) -> Result<Vec<(String, String)>> {
    let mut links = Vec::new();
    for chunk in parent_ids.chunks(MAX_BOUND_IDS) {
        let sql = format!(
            "SELECT id, parent_message_id FROM messages WHERE parent_message_id IN ({})",
            placeholders(chunk.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let chunk_links: Vec<(String, String)> = stmt
            .query_map(params_from_iter(chunk), |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        links.extend(chunk_links);
    }

    Ok(links)
}

fn placeholders(count: usize) -> String {
    (1..=count).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn ordered_child_ids(keys: Option<&str>) -> Vec<String> {
    let Some(keys) = keys else {
        return vec![];
    };

    let mut keys: Vec<&str> = keys.split(',').collect();
    keys.sort_unstable();
    keys.into_iter()
        .filter_map(|key| key.rsplit('|').next())
        .map(str::to_string)
        .collect()
}
