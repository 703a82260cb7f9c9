use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (messages, votes)");
        conn.execute_batch(
            "
            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                created_at      TEXT NOT NULL,
                room_id         TEXT NOT NULL,
                parent_id       TEXT REFERENCES messages(id) ON DELETE CASCADE,
                sender_name     TEXT NOT NULL,
                content         TEXT NOT NULL,
                media_url       TEXT,
                media_type      TEXT,
                is_anonymous    INTEGER NOT NULL DEFAULT 0,
                likes           INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
                dislikes        INTEGER NOT NULL DEFAULT 0 CHECK (dislikes >= 0)
            );

            CREATE INDEX idx_messages_room
                ON messages(room_id, created_at);

            CREATE INDEX idx_messages_parent
                ON messages(parent_id);

            CREATE TABLE votes (
                id          TEXT PRIMARY KEY,
                message_id  TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
                user_name   TEXT NOT NULL,
                vote_type   TEXT NOT NULL CHECK (vote_type IN ('like', 'dislike')),
                UNIQUE(message_id, user_name)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
