//! Table definitions for schema version 1. Grounded in
//! `ingestion/src/sql_telemetry_db.rs`'s `create_*_table` + `create_tables`
//! shape: one function per table, composed by the migration runner.

use anyhow::{Context, Result};
use sqlx::Executor;

pub async fn create_migration_table(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    sqlx::query("CREATE TABLE migration(version INTEGER NOT NULL);")
        .execute(&mut **tr)
        .await
        .with_context(|| "creating table migration")?;
    sqlx::query("INSERT INTO migration VALUES(1);")
        .execute(&mut **tr)
        .await
        .with_context(|| "recording the initial schema version")?;
    Ok(())
}

pub async fn create_events_table(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    let sql = "
        CREATE TABLE events(
            execution_id UUID PRIMARY KEY,
            correlation_id VARCHAR(200) NOT NULL,
            trace_id VARCHAR(200) NOT NULL,
            span_id VARCHAR(64),
            parent_span_id VARCHAR(64),
            span_links JSONB,
            account_id VARCHAR(64),
            batch_id VARCHAR(200),
            application_id VARCHAR(200) NOT NULL,
            originating_system VARCHAR(200) NOT NULL,
            target_system VARCHAR(200) NOT NULL,
            process_name VARCHAR(200) NOT NULL,
            step_sequence INTEGER,
            step_name VARCHAR(200),
            event_type VARCHAR(32) NOT NULL,
            event_status VARCHAR(32) NOT NULL,
            identifiers JSONB NOT NULL DEFAULT '{}',
            metadata JSONB,
            summary TEXT NOT NULL,
            result VARCHAR(2048),
            event_timestamp TIMESTAMPTZ NOT NULL,
            endpoint VARCHAR(2048),
            http_method VARCHAR(16)
                CHECK (http_method IS NULL OR http_method IN
                    ('GET','POST','PUT','DELETE','PATCH','HEAD','OPTIONS')),
            http_status_code INTEGER,
            request_payload TEXT,
            response_payload TEXT,
            error_code VARCHAR(200),
            error_message VARCHAR(2048),
            execution_time_ms BIGINT,
            idempotency_key VARCHAR(200),
            is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
            insert_time TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE INDEX idx_events_correlation_time
            ON events(correlation_id, event_timestamp);
        CREATE INDEX idx_events_account
            ON events(account_id);
        CREATE INDEX idx_events_trace
            ON events(trace_id);
        CREATE INDEX idx_events_process_time
            ON events(process_name, event_timestamp);
        CREATE INDEX idx_events_time
            ON events(event_timestamp);
        CREATE INDEX idx_events_target_system_time
            ON events(target_system, event_timestamp);
        CREATE INDEX idx_events_batch
            ON events(batch_id);
        CREATE INDEX idx_events_failure_time
            ON events(event_timestamp) WHERE event_status = 'FAILURE';
        CREATE UNIQUE INDEX idx_events_idempotency_key
            ON events(idempotency_key) WHERE idempotency_key IS NOT NULL;
        ";
    tr.execute(sql)
        .await
        .with_context(|| "creating table events and its indices")?;
    Ok(())
}

pub async fn create_correlation_links_table(
    tr: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<()> {
    let sql = "
        CREATE TABLE correlation_links(
            correlation_id VARCHAR(200) PRIMARY KEY,
            account_id VARCHAR(64) NOT NULL,
            application_id VARCHAR(200),
            customer_id VARCHAR(200),
            card_last4 VARCHAR(4),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE INDEX idx_correlation_links_account
            ON correlation_links(account_id);
        CREATE INDEX idx_correlation_links_application
            ON correlation_links(application_id) WHERE application_id IS NOT NULL;
        ";
    tr.execute(sql)
        .await
        .with_context(|| "creating table correlation_links and its indices")?;
    Ok(())
}

pub async fn create_process_definitions_table(
    tr: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<()> {
    let sql = "
        CREATE TABLE process_definitions(
            process_name VARCHAR(200) PRIMARY KEY,
            owning_team VARCHAR(200) NOT NULL,
            expected_step_count INTEGER,
            sla_ms BIGINT
        );

        CREATE INDEX idx_process_definitions_owning_team
            ON process_definitions(owning_team);
        ";
    tr.execute(sql)
        .await
        .with_context(|| "creating table process_definitions and its index")?;
    Ok(())
}

pub async fn create_account_timeline_summary_table(
    tr: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<()> {
    let sql = "
        CREATE TABLE account_timeline_summary(
            account_id VARCHAR(64) PRIMARY KEY,
            first_event_time TIMESTAMPTZ NOT NULL,
            last_event_time TIMESTAMPTZ NOT NULL,
            total_events BIGINT NOT NULL,
            systems_touched JSONB NOT NULL DEFAULT '[]',
            recent_correlation_ids JSONB NOT NULL DEFAULT '[]'
        );
        ";
    tr.execute(sql)
        .await
        .with_context(|| "creating table account_timeline_summary")?;
    Ok(())
}

pub async fn create_tables(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    create_events_table(tr).await?;
    create_correlation_links_table(tr).await?;
    create_process_definitions_table(tr).await?;
    create_account_timeline_summary_table(tr).await?;
    create_migration_table(tr).await?;
    Ok(())
}

/// Adds the full-text search support used by `eventlog-query`'s text search
/// path when `FULLTEXT_ENABLED=true`.
pub async fn create_fulltext_index(tr: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    let sql = "
        ALTER TABLE events ADD COLUMN search_vector tsvector
            GENERATED ALWAYS AS (
                to_tsvector('english', coalesce(summary, '') || ' ' || coalesce(result, ''))
            ) STORED;
        CREATE INDEX idx_events_search_vector ON events USING GIN(search_vector);
        ";
    tr.execute(sql)
        .await
        .with_context(|| "creating full text search index")?;
    Ok(())
}
