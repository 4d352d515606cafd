//! Schema version tracking and upgrade orchestration. Grounded in
//! `ingestion/src/sql_migration.rs` (`read_data_lake_schema_version`,
//! `execute_migration`) and `ingestion/src/remote_data_lake.rs` (advisory
//! lock guarding concurrent migrators via `migrate_db`).

use anyhow::{Context, Result};
use sqlx::{Executor, PgPool, Row};

use crate::schema::{create_fulltext_index, create_tables};

/// The latest schema version this crate knows how to create/upgrade to.
pub const LATEST_SCHEMA_VERSION: i32 = 2;

/// Reads the current schema version, treating an unreadable `migration`
/// table (e.g. it doesn't exist yet) as version 0.
pub async fn read_schema_version(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> i32 {
    match sqlx::query("SELECT version FROM migration;")
        .fetch_one(&mut **tr)
        .await
    {
        Ok(row) => row.get("version"),
        Err(e) => {
            tracing::info!("error reading schema version, assuming version 0: {e}");
            0
        }
    }
}

/// Upgrades an existing version-1 schema (created without full-text search)
/// to version 2, which adds the generated `tsvector` column used when
/// `FULLTEXT_ENABLED=true`.
pub async fn upgrade_to_v2(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    create_fulltext_index(tr).await?;
    tr.execute("UPDATE migration SET version = 2;")
        .await
        .with_context(|| "updating schema version to 2")?;
    Ok(())
}

async fn acquire_migration_lock(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    // A fixed advisory-lock key scoped to schema migration; any value works
    // as long as every migrator in the fleet agrees on it.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(0i64)
        .execute(&mut **tr)
        .await?;
    Ok(())
}

/// Brings `pool`'s database up to [`LATEST_SCHEMA_VERSION`], creating the
/// schema from scratch at version 0. Safe to call concurrently from
/// multiple server instances at startup: every caller takes the same
/// advisory lock before checking/upgrading, so only one actually runs DDL.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    let mut tr = pool.begin().await?;
    let mut version = read_schema_version(&mut tr).await;
    tr.rollback().await?;

    if version == LATEST_SCHEMA_VERSION {
        return Ok(());
    }

    let mut tr = pool.begin().await?;
    acquire_migration_lock(&mut tr).await?;
    version = read_schema_version(&mut tr).await;
    if version == LATEST_SCHEMA_VERSION {
        tr.rollback().await?;
        return Ok(());
    }

    if version == 0 {
        tracing::info!("creating schema version 1");
        create_tables(&mut tr).await?;
        version = read_schema_version(&mut tr).await;
    }
    if version == 1 {
        tracing::info!("upgrading schema to version 2");
        upgrade_to_v2(&mut tr).await?;
        version = read_schema_version(&mut tr).await;
    }
    tr.commit().await?;

    anyhow::ensure!(
        version == LATEST_SCHEMA_VERSION,
        "schema migration did not reach the latest version (at {version})"
    );
    Ok(())
}
