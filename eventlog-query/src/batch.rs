//! Query — by batch id, plus the batch summary aggregate.

use eventlog_core::pagination::{Page, PageRequest};
use eventlog_core::query::{BatchEventsResponse, BatchStats, BatchSummaryResponse};
use sqlx::{PgPool, Row};

use crate::error::QueryError;
use crate::row::{map_event_row, EVENT_SELECT_COLUMNS};

pub async fn get_batch_events(
    pool: &PgPool,
    batch_id: &str,
    page_request: PageRequest,
) -> Result<BatchEventsResponse, QueryError> {
    let sql = format!(
        "SELECT {EVENT_SELECT_COLUMNS}, COUNT(*) OVER() AS total_count FROM events \
         WHERE batch_id = $1 AND is_deleted = FALSE \
         ORDER BY event_timestamp DESC LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query(&sql)
        .bind(batch_id)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(pool)
        .await?;
    let total_count = rows
        .first()
        .map(|row| row.get::<i64, _>("total_count"))
        .unwrap_or(0);
    let events: Vec<_> = rows.iter().map(map_event_row).collect();

    let stats = get_batch_stats(pool, batch_id).await?;

    let page = Page::new(events, total_count, page_request);
    Ok(BatchEventsResponse {
        events: page.items,
        total_count: page.total_count,
        page: page.page,
        page_size: page.page_size,
        has_more: page.has_more,
        stats,
    })
}

async fn get_batch_stats(pool: &PgPool, batch_id: &str) -> Result<BatchStats, QueryError> {
    let row = sqlx::query(
        "SELECT \
            COUNT(DISTINCT correlation_id) AS unique_correlation_ids, \
            COUNT(*) FILTER (WHERE event_status = 'SUCCESS') AS success_count, \
            COUNT(*) FILTER (WHERE event_status = 'FAILURE') AS failure_count, \
            COUNT(*) AS total_count \
         FROM events WHERE batch_id = $1 AND is_deleted = FALSE",
    )
    .bind(batch_id)
    .fetch_one(pool)
    .await?;

    Ok(BatchStats {
        unique_correlation_ids: row.get("unique_correlation_ids"),
        success_count: row.get("success_count"),
        failure_count: row.get("failure_count"),
        total_count: row.get("total_count"),
    })
}

/// `total_processes` is distinct correlations; `completed` is correlations
/// with a `PROCESS_END`/`SUCCESS` event; `failed` is correlations with a
/// `FAILURE` event; `in_progress` is the remainder.
pub async fn get_batch_summary(
    pool: &PgPool,
    batch_id: &str,
) -> Result<BatchSummaryResponse, QueryError> {
    let row = sqlx::query(
        "SELECT \
            COUNT(DISTINCT correlation_id) AS total_processes, \
            COUNT(DISTINCT correlation_id) FILTER ( \
                WHERE correlation_id IN ( \
                    SELECT correlation_id FROM events \
                    WHERE batch_id = $1 AND is_deleted = FALSE \
                    AND event_type = 'PROCESS_END' AND event_status = 'SUCCESS' \
                ) \
            ) AS completed, \
            COUNT(DISTINCT correlation_id) FILTER ( \
                WHERE correlation_id IN ( \
                    SELECT correlation_id FROM events \
                    WHERE batch_id = $1 AND is_deleted = FALSE \
                    AND event_status = 'FAILURE' \
                ) \
            ) AS failed, \
            min(event_timestamp) AS earliest_event_time, \
            max(event_timestamp) AS latest_event_time \
         FROM events WHERE batch_id = $1 AND is_deleted = FALSE",
    )
    .bind(batch_id)
    .fetch_one(pool)
    .await?;

    let total_processes: i64 = row.get("total_processes");
    let completed: i64 = row.get("completed");
    let failed: i64 = row.get("failed");
    let in_progress = total_processes - completed - failed;

    let correlation_ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT correlation_id FROM events WHERE batch_id = $1 AND is_deleted = FALSE",
    )
    .bind(batch_id)
    .fetch_all(pool)
    .await?;

    Ok(BatchSummaryResponse {
        total_processes,
        completed,
        failed,
        in_progress,
        correlation_ids,
        earliest_event_time: row.get("earliest_event_time"),
        latest_event_time: row.get("latest_event_time"),
    })
}
