//! Query — by correlation id.

use eventlog_core::query::CorrelationEventsResponse;
use eventlog_store::CorrelationLinkStore;
use sqlx::PgPool;

use crate::error::QueryError;
use crate::row::{map_event_row, EVENT_SELECT_COLUMNS};

pub async fn get_correlation_events(
    pool: &PgPool,
    correlation_id: &str,
) -> Result<CorrelationEventsResponse, QueryError> {
    let sql = format!(
        "SELECT {EVENT_SELECT_COLUMNS} FROM events \
         WHERE correlation_id = $1 AND is_deleted = FALSE \
         ORDER BY step_sequence ASC NULLS LAST, event_timestamp ASC"
    );
    let rows = sqlx::query(&sql)
        .bind(correlation_id)
        .fetch_all(pool)
        .await?;
    let events: Vec<_> = rows.iter().map(map_event_row).collect();

    let link = CorrelationLinkStore::new(pool.clone())
        .get(correlation_id)
        .await
        .map_err(|e| QueryError::Other(anyhow::anyhow!(e)))?;

    Ok(CorrelationEventsResponse {
        events,
        is_linked: link.is_some(),
        account_id: link.map(|l| l.account_id),
    })
}
