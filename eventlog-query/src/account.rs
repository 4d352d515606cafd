//! Query — by account id. Filters and the `include_linked`
//! union are built with `sqlx::QueryBuilder` so every value from the
//! caller-supplied [`AccountEventsFilter`] stays a bound parameter rather
//! than interpolated SQL text.

use eventlog_core::pagination::{Page, PageRequest};
use eventlog_core::query::{AccountEventsFilter, AccountEventsResponse};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::error::QueryError;
use crate::row::{map_event_row, EVENT_SELECT_COLUMNS};

pub async fn get_account_events(
    pool: &PgPool,
    account_id: &str,
    filter: &AccountEventsFilter,
) -> Result<AccountEventsResponse, QueryError> {
    let page_request = PageRequest::new(filter.page, filter.page_size);

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {EVENT_SELECT_COLUMNS}, COUNT(*) OVER() AS total_count FROM events WHERE is_deleted = FALSE AND ("
    ));
    builder.push("account_id = ").push_bind(account_id.to_string());
    if filter.include_linked {
        builder
            .push(" OR correlation_id IN (SELECT correlation_id FROM correlation_links WHERE account_id = ")
            .push_bind(account_id.to_string())
            .push(")");
    }
    builder.push(")");

    if let Some(start) = filter.start_date {
        builder.push(" AND event_timestamp >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        builder.push(" AND event_timestamp <= ").push_bind(end);
    }
    if let Some(process_name) = &filter.process_name {
        builder
            .push(" AND process_name = ")
            .push_bind(process_name.clone());
    }
    if let Some(status) = filter.event_status {
        builder
            .push(" AND event_status = ")
            .push_bind(status.as_str());
    }

    builder
        .push(" ORDER BY event_timestamp DESC LIMIT ")
        .push_bind(page_request.limit())
        .push(" OFFSET ")
        .push_bind(page_request.offset());

    let rows = builder.build().fetch_all(pool).await?;
    let total_count = rows
        .first()
        .map(|row| row.get::<i64, _>("total_count"))
        .unwrap_or(0);
    let events = rows.iter().map(map_event_row).collect();

    let page = Page::new(events, total_count, page_request);
    Ok(AccountEventsResponse {
        events: page.items,
        total_count: page.total_count,
        page: page.page,
        page_size: page.page_size,
        has_more: page.has_more,
    })
}

/// The account timeline summary table is read-only here; population is
/// out of scope, so an absent
/// row is a legitimate `Ok(None)` (mapped to 404 by the HTTP layer), not an
/// error.
pub async fn get_account_timeline_summary(
    pool: &PgPool,
    account_id: &str,
) -> Result<Option<eventlog_core::account_summary::AccountTimelineSummary>, QueryError> {
    let row = sqlx::query(
        "SELECT account_id, first_event_time, last_event_time, total_events, \
         systems_touched, recent_correlation_ids \
         FROM account_timeline_summary WHERE account_id = $1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let systems_touched: serde_json::Value = row.get("systems_touched");
        let recent_correlation_ids: serde_json::Value = row.get("recent_correlation_ids");
        eventlog_core::account_summary::AccountTimelineSummary {
            account_id: row.get("account_id"),
            first_event_time: row.get("first_event_time"),
            last_event_time: row.get("last_event_time"),
            total_events: row.get("total_events"),
            systems_touched: serde_json::from_value(systems_touched).unwrap_or_default(),
            recent_correlation_ids: serde_json::from_value(recent_correlation_ids)
                .unwrap_or_default(),
        }
    }))
}
