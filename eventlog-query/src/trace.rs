//! Query — by trace id. `systems_involved`/`total_duration_ms`
//! are computed in SQL so a single round trip covers both the event list and
//! the aggregates, instead of scanning the result set twice in Rust.

use eventlog_core::query::TraceEventsResponse;
use sqlx::{PgPool, Row};

use crate::error::QueryError;
use crate::row::{map_event_row, EVENT_SELECT_COLUMNS};

pub async fn get_trace_events(
    pool: &PgPool,
    trace_id: &str,
) -> Result<TraceEventsResponse, QueryError> {
    let sql = format!(
        "SELECT {EVENT_SELECT_COLUMNS} FROM events \
         WHERE trace_id = $1 AND is_deleted = FALSE \
         ORDER BY event_timestamp ASC"
    );
    let rows = sqlx::query(&sql).bind(trace_id).fetch_all(pool).await?;
    let events: Vec<_> = rows.iter().map(map_event_row).collect();

    let agg_sql = "SELECT \
        array_agg(DISTINCT target_system) FILTER (WHERE target_system IS NOT NULL) AS systems, \
        EXTRACT(EPOCH FROM (max(event_timestamp) - min(event_timestamp))) * 1000 AS span_ms \
        FROM events WHERE trace_id = $1 AND is_deleted = FALSE";
    let agg_row = sqlx::query(agg_sql).bind(trace_id).fetch_one(pool).await?;
    let systems_involved: Vec<String> = agg_row
        .try_get::<Option<Vec<String>>, _>("systems")?
        .unwrap_or_default();
    let total_duration_ms: i64 = agg_row
        .try_get::<Option<f64>, _>("span_ms")?
        .map(|ms| ms.round() as i64)
        .unwrap_or(0);

    Ok(TraceEventsResponse {
        events,
        systems_involved,
        total_duration_ms,
    })
}
