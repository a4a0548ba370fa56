use sqlx::PgPool;

/// Run the record and entity table migrations, creating tables and indexes
/// if they do not already exist.
pub async fn run_migrations(pool: &PgPool, prefix: &str) -> Result<(), sqlx::Error> {
    let records = format!("{prefix}records");
    let entities = format!("{prefix}entities");

    let create_records = format!(
        "
        CREATE TABLE IF NOT EXISTS {records} (
            id             TEXT PRIMARY KEY,
            recorded_at    TIMESTAMPTZ NOT NULL,
            action         TEXT NOT NULL,
            actor          JSONB NOT NULL,
            actor_id       TEXT,
            resource       JSONB,
            resource_id    TEXT,
            resource_kind  TEXT,
            target         JSONB,
            previous_state JSONB,
            new_state      JSONB,
            changes        JSONB NOT NULL DEFAULT '[]'::jsonb,
            reason         TEXT NOT NULL,
            metadata       JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            rollback_token TEXT,
            status         TEXT NOT NULL,
            tags           TEXT[] NOT NULL DEFAULT '{{}}'
        )
        "
    );

    sqlx::query(&create_records).execute(pool).await?;

    let create_entities = format!(
        "
        CREATE TABLE IF NOT EXISTS {entities} (
            kind       TEXT NOT NULL,
            id         TEXT NOT NULL,
            doc        JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (kind, id)
        )
        "
    );

    sqlx::query(&create_entities).execute(pool).await?;

    let indexes = [
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}records_resource_time ON {records} (resource_id, recorded_at DESC) WHERE resource_id IS NOT NULL"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}records_actor_time ON {records} (actor_id, recorded_at DESC) WHERE actor_id IS NOT NULL"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}records_time ON {records} (recorded_at DESC)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}records_action ON {records} (action, recorded_at DESC)"
        ),
        // Tokens are the restoration credential; the unique index both
        // enforces global uniqueness and serves the token lookup.
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{prefix}records_token ON {records} (rollback_token) WHERE rollback_token IS NOT NULL"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}records_tags ON {records} USING GIN (tags)"
        ),
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }

    Ok(())
}
