use crate::DbResult;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'user',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS links (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            url         TEXT NOT NULL,
            category    TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- The only many-to-many relation in the model. The UNIQUE constraint
        -- is the arbiter of duplicate assignments; the FKs cascade so a user
        -- or link delete can never orphan a row here.
        CREATE TABLE IF NOT EXISTS user_link_assignments (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            link_id     TEXT NOT NULL REFERENCES links(id) ON DELETE CASCADE,
            assigned_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, link_id)
        );

        CREATE INDEX IF NOT EXISTS idx_assignments_user
            ON user_link_assignments(user_id);

        CREATE INDEX IF NOT EXISTS idx_assignments_link
            ON user_link_assignments(link_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
