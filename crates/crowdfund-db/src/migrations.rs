use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                name              TEXT NOT NULL,
                occupation        TEXT NOT NULL DEFAULT '',
                email             TEXT NOT NULL UNIQUE,
                password_hash     TEXT NOT NULL,
                avatar_file_name  TEXT,
                role              TEXT NOT NULL DEFAULT 'user',
                created_at        TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at        TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE campaigns (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id            INTEGER NOT NULL REFERENCES users(id),
                name               TEXT NOT NULL,
                short_description  TEXT NOT NULL,
                description        TEXT NOT NULL,
                perks              TEXT NOT NULL DEFAULT '',
                backer_count       INTEGER NOT NULL DEFAULT 0,
                goal_amount        INTEGER NOT NULL,
                current_amount     INTEGER NOT NULL DEFAULT 0,
                slug               TEXT NOT NULL UNIQUE,
                created_at         TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at         TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_campaigns_user ON campaigns(user_id);

            CREATE TABLE campaign_images (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id  INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                file_name    TEXT NOT NULL,
                is_primary   INTEGER NOT NULL DEFAULT 0,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- At most one primary image per campaign
            CREATE UNIQUE INDEX idx_campaign_images_primary
                ON campaign_images(campaign_id) WHERE is_primary = 1;

            CREATE TABLE transactions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id  INTEGER NOT NULL REFERENCES campaigns(id),
                user_id      INTEGER NOT NULL REFERENCES users(id),
                amount       INTEGER NOT NULL,
                status       TEXT NOT NULL DEFAULT 'pending',
                code         TEXT NOT NULL UNIQUE,
                payment_url  TEXT,
                created_at   TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_transactions_campaign ON transactions(campaign_id, status);
            CREATE INDEX idx_transactions_user ON transactions(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (admin sessions)");
        conn.execute_batch(
            "
            CREATE TABLE sessions (
                id           TEXT PRIMARY KEY,
                data         TEXT NOT NULL,
                expiry_date  INTEGER NOT NULL
            );

            CREATE INDEX idx_sessions_expiry ON sessions(expiry_date);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
