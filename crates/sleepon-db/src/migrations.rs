use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                display_name    TEXT NOT NULL DEFAULT '',
                avatar          TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL
            );

            CREATE TABLE entries (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL,
                title           TEXT NOT NULL,
                content         TEXT NOT NULL,
                mood            TEXT NOT NULL DEFAULT '',
                reflection      TEXT NOT NULL DEFAULT '',
                ai_response     TEXT NOT NULL DEFAULT '',
                status          TEXT,
                need_help_count INTEGER NOT NULL DEFAULT 0,
                unlock_at       TEXT NOT NULL,
                is_public       INTEGER NOT NULL DEFAULT 0,
                is_anonymous    INTEGER NOT NULL DEFAULT 0,
                is_finished     INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_entries_owner ON entries(username, created_at);
            CREATE INDEX idx_entries_public ON entries(is_public, unlock_at);

            CREATE TABLE reflection_history (
                id              TEXT PRIMARY KEY,
                entry_id        TEXT NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
                content         TEXT NOT NULL,
                status          TEXT NOT NULL,
                ai_response     TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_reflection_entry ON reflection_history(entry_id, created_at);

            CREATE TABLE comments (
                id              TEXT PRIMARY KEY,
                entry_id        TEXT NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
                username        TEXT NOT NULL,
                content         TEXT NOT NULL,
                is_anonymous    INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_comments_entry ON comments(entry_id, created_at);

            CREATE TABLE preferences (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL,
                question        TEXT NOT NULL,
                answer          TEXT NOT NULL,
                category        TEXT NOT NULL DEFAULT '',
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_preferences_owner ON preferences(username);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
