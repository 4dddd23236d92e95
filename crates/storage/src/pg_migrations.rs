//! PostgreSQL schema migrations for the document store.

use sqlx::PgPool;

/// Run all PostgreSQL migrations.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_counters (
            key TEXT PRIMARY KEY,
            value BIGINT NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_documents (
            key TEXT PRIMARY KEY,
            doc JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_sets (
            set_key TEXT NOT NULL,
            member BIGINT NOT NULL,
            PRIMARY KEY (set_key, member)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
