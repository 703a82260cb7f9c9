use crate::models::{MessageRow, NewMessage, VoteRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::debug;

use roomboard_types::vote::{VoteType, resolve_vote};

const MESSAGE_COLUMNS: &str = "id, created_at, room_id, parent_id, sender_name, content, \
     media_url, media_type, is_anonymous, likes, dislikes";

/// Result of inserting a message.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(MessageRow),
    /// `parent_id` referenced a message that does not exist; nothing was written.
    ParentMissing,
}

impl Database {
    // -- Messages --

    pub fn create_message(&self, msg: &NewMessage<'_>) -> Result<CreateOutcome> {
        self.with_tx(|tx| {
            if let Some(parent_id) = msg.parent_id {
                if query_message(tx, parent_id)?.is_none() {
                    return Ok(CreateOutcome::ParentMissing);
                }
            }

            tx.execute(
                "INSERT INTO messages (id, created_at, room_id, parent_id, sender_name, content, media_url, media_type, is_anonymous)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    msg.id,
                    msg.created_at,
                    msg.room_id,
                    msg.parent_id,
                    msg.sender_name,
                    msg.content,
                    msg.media_url,
                    msg.media_type,
                    msg.is_anonymous,
                ],
            )?;

            let row = query_message(tx, msg.id)?
                .ok_or_else(|| anyhow::anyhow!("Message {} vanished after insert", msg.id))?;
            Ok(CreateOutcome::Created(row))
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// All messages in a room, newest first.
    pub fn get_messages(&self, room_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, room_id))
    }

    /// Replace a message's content. Counters, media and parent are untouched.
    /// Returns `None` if the message does not exist.
    pub fn update_message_content(&self, id: &str, content: &str) -> Result<Option<MessageRow>> {
        self.with_tx(|tx| {
            let updated = tx.execute(
                "UPDATE messages SET content = ?1 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            query_message(tx, id)
        })
    }

    /// Delete a message. Replies and votes go with it via ON DELETE CASCADE.
    /// Not reachable from the HTTP API.
    pub fn delete_message(&self, id: &str) -> Result<bool> {
        self.with_tx(|tx| {
            let deleted = tx.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Votes --

    /// Apply one voter's request to a message in a single transaction:
    /// read the current vote, resolve the transition, write the vote row and
    /// both counters. Returns the updated message, or `None` (with nothing
    /// written) if the message does not exist.
    pub fn apply_vote(
        &self,
        vote_id: &str,
        message_id: &str,
        user_name: &str,
        requested: Option<VoteType>,
    ) -> Result<Option<MessageRow>> {
        self.with_tx(|tx| {
            if query_message(tx, message_id)?.is_none() {
                return Ok(None);
            }

            let existing = query_vote(tx, message_id, user_name)?;
            let current = match &existing {
                Some(row) => Some(row.vote_type.parse::<VoteType>()?),
                None => None,
            };

            let resolution = resolve_vote(current, requested);
            debug!(
                "Vote on {} by '{}': {:?} -> {:?}",
                message_id, user_name, current, resolution.vote
            );

            match (existing, resolution.vote) {
                (None, None) => {}
                (None, Some(new_type)) => {
                    tx.execute(
                        "INSERT INTO votes (id, message_id, user_name, vote_type) VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![vote_id, message_id, user_name, new_type.as_str()],
                    )?;
                }
                (Some(row), None) => {
                    tx.execute("DELETE FROM votes WHERE id = ?1", [&row.id])?;
                }
                (Some(row), Some(new_type)) => {
                    tx.execute(
                        "UPDATE votes SET vote_type = ?1 WHERE id = ?2",
                        rusqlite::params![new_type.as_str(), &row.id],
                    )?;
                }
            }

            if resolution.like_delta != 0 || resolution.dislike_delta != 0 {
                tx.execute(
                    "UPDATE messages SET likes = likes + ?1, dislikes = dislikes + ?2 WHERE id = ?3",
                    rusqlite::params![resolution.like_delta, resolution.dislike_delta, message_id],
                )?;
            }

            query_message(tx, message_id)
        })
    }

    pub fn get_vote(&self, message_id: &str, user_name: &str) -> Result<Option<VoteRow>> {
        self.with_conn(|conn| query_vote(conn, message_id, user_name))
    }

    /// Count live vote rows per type: `(likes, dislikes)`.
    pub fn count_votes(&self, message_id: &str) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let counts: (i64, i64) = conn.query_row(
                "SELECT
                    COALESCE(SUM(vote_type = 'like'), 0),
                    COALESCE(SUM(vote_type = 'dislike'), 0)
                 FROM votes WHERE message_id = ?1",
                [message_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(counts)
        })
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        room_id: row.get(2)?,
        parent_id: row.get(3)?,
        sender_name: row.get(4)?,
        content: row.get(5)?,
        media_url: row.get(6)?,
        media_type: row.get(7)?,
        is_anonymous: row.get(8)?,
        likes: row.get(9)?,
        dislikes: row.get(10)?,
    })
}

fn query_message(conn: &Connection, id: &str) -> Result<Option<MessageRow>> {
    let sql = format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS);
    let row = conn.query_row(&sql, [id], message_from_row).optional()?;
    Ok(row)
}

fn query_messages(conn: &Connection, room_id: &str) -> Result<Vec<MessageRow>> {
    // rowid breaks ties between messages created within the same microsecond
    let sql = format!(
        "SELECT {} FROM messages WHERE room_id = ?1 ORDER BY created_at DESC, rowid DESC",
        MESSAGE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([room_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_vote(conn: &Connection, message_id: &str, user_name: &str) -> Result<Option<VoteRow>> {
    let row = conn
        .query_row(
            "SELECT id, vote_type FROM votes WHERE message_id = ?1 AND user_name = ?2",
            [message_id, user_name],
            |row| {
                Ok(VoteRow {
                    id: row.get(0)?,
                    vote_type: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(row)
}
