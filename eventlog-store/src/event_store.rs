//! Transactional batched insert with idempotency dedup. Grounded in
//! `ingestion/src/web_ingestion_service.rs`'s insert handlers (one sqlx
//! query per write, bound field-by-field) generalized to a single batch
//! algorithm: a single indexed idempotency-key lookup, a bulk insert
//! of the new rows, and a per-row fallback so one bad row can't sink the
//! whole batch.

use std::collections::HashMap;

use eventlog_core::batch::ItemError;
use eventlog_core::event::Event;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{classify_insert_error, StoreError};

const EVENT_COLUMNS: &str = "execution_id, correlation_id, trace_id, span_id, parent_span_id, \
span_links, account_id, batch_id, application_id, originating_system, target_system, \
process_name, step_sequence, step_name, event_type, event_status, identifiers, metadata, \
summary, result, event_timestamp, endpoint, http_method, http_status_code, request_payload, \
response_payload, error_code, error_message, execution_time_ms, idempotency_key, is_deleted";
const EVENT_COLUMN_COUNT: usize = 31;

#[derive(Debug, Clone, Default)]
pub struct BatchInsertOutcome {
    /// One entry per input event, in input order.
    pub execution_ids: Vec<Option<Uuid>>,
    pub errors: Vec<ItemError>,
}

#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a single event, honoring idempotency. Implemented over
    /// [`Self::insert_batch`] with a one-element slice: the transactional
    /// batch path is the only insert path with defined semantics, so a
    /// single insert is just a batch of one.
    pub async fn insert_one(&self, event: &Event) -> Result<Uuid, StoreError> {
        let outcome = self.insert_batch(std::slice::from_ref(event)).await?;
        match outcome.execution_ids.into_iter().next().flatten() {
            Some(id) => Ok(id),
            None => {
                let message = outcome
                    .errors
                    .into_iter()
                    .next()
                    .map(|e| e.error)
                    .unwrap_or_else(|| "insert failed".to_string());
                Err(StoreError::Other(anyhow::anyhow!(message)))
            }
        }
    }

    /// Inserts a batch of events inside one transaction.
    pub async fn insert_batch(&self, events: &[Event]) -> Result<BatchInsertOutcome, StoreError> {
        if events.is_empty() {
            return Ok(BatchInsertOutcome::default());
        }

        let mut tr = self.pool.begin().await?;

        let keys: Vec<String> = events
            .iter()
            .filter_map(|e| e.idempotency_key.clone())
            .collect();
        let existing = if keys.is_empty() {
            HashMap::new()
        } else {
            lookup_idempotency_keys(&mut tr, &keys).await?
        };

        let mut execution_ids: Vec<Option<Uuid>> = vec![None; events.len()];
        let mut to_insert: Vec<(usize, Uuid)> = Vec::new();
        for (index, event) in events.iter().enumerate() {
            if let Some(key) = &event.idempotency_key {
                if let Some(id) = existing.get(key) {
                    execution_ids[index] = Some(*id);
                    continue;
                }
            }
            let id = Uuid::new_v4();
            execution_ids[index] = Some(id);
            to_insert.push((index, id));
        }

        let mut errors = Vec::new();
        if !to_insert.is_empty() {
            let bulk_result = bulk_insert(&mut tr, events, &to_insert).await;
            if bulk_result.is_err() {
                tracing::warn!(
                    error = %bulk_result.as_ref().unwrap_err(),
                    "bulk insert failed, falling back to per-row inserts"
                );
                tr.rollback().await.ok();
                tr = self.pool.begin().await?;
                for (index, id) in &to_insert {
                    match insert_row(&mut tr, &events[*index], *id).await {
                        Ok(()) => {}
                        Err(e) => {
                            let classified = classify_insert_error(e);
                            if let (StoreError::UniqueConflict(_), Some(key)) =
                                (&classified, &events[*index].idempotency_key)
                            {
                                // Another writer raced us on the same
                                // idempotency key between our lookup and
                                // this insert; echo its id instead of
                                // failing the row.
                                if let Some(id) = lookup_idempotency_keys(
                                    &mut tr,
                                    std::slice::from_ref(key),
                                )
                                .await
                                .ok()
                                .and_then(|m| m.get(key).copied())
                                {
                                    execution_ids[*index] = Some(id);
                                    continue;
                                }
                            }
                            execution_ids[*index] = None;
                            errors.push(ItemError {
                                index: *index,
                                error: classified.to_string(),
                            });
                        }
                    }
                }
            }
        }

        tr.commit().await?;
        Ok(BatchInsertOutcome {
            execution_ids,
            errors,
        })
    }
}

async fn lookup_idempotency_keys(
    tr: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    keys: &[String],
) -> Result<HashMap<String, Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT idempotency_key, execution_id FROM events \
         WHERE idempotency_key = ANY($1) AND is_deleted = FALSE",
    )
    .bind(keys)
    .fetch_all(&mut **tr)
    .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let key: String = row.get("idempotency_key");
        let id: Uuid = row.get("execution_id");
        map.insert(key, id);
    }
    Ok(map)
}

fn build_bulk_insert_sql(row_count: usize) -> String {
    let mut placeholder_rows = Vec::with_capacity(row_count);
    let mut next_param = 1;
    for _ in 0..row_count {
        let placeholders: Vec<String> = (0..EVENT_COLUMN_COUNT)
            .map(|_| {
                let p = format!("${next_param}");
                next_param += 1;
                p
            })
            .collect();
        placeholder_rows.push(format!("({})", placeholders.join(", ")));
    }
    format!(
        "INSERT INTO events ({EVENT_COLUMNS}) VALUES {}",
        placeholder_rows.join(", ")
    )
}

async fn bulk_insert(
    tr: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    events: &[Event],
    to_insert: &[(usize, Uuid)],
) -> Result<(), sqlx::Error> {
    let sql = build_bulk_insert_sql(to_insert.len());
    let mut query = sqlx::query(&sql);
    for (index, id) in to_insert {
        query = bind_event_row(query, &events[*index], *id);
    }
    query.execute(&mut **tr).await?;
    Ok(())
}

async fn insert_row(
    tr: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &Event,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    let sql = build_bulk_insert_sql(1);
    let query = bind_event_row(sqlx::query(&sql), event, id);
    query.execute(&mut **tr).await?;
    Ok(())
}

fn bind_event_row<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    event: &'q Event,
    id: Uuid,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(id)
        .bind(&event.correlation_id)
        .bind(&event.trace_id)
        .bind(&event.span_id)
        .bind(&event.parent_span_id)
        .bind(event.span_links.as_ref().map(|links| {
            serde_json::to_value(links).expect("span_links serialize to json")
        }))
        .bind(&event.account_id)
        .bind(&event.batch_id)
        .bind(&event.application_id)
        .bind(&event.originating_system)
        .bind(&event.target_system)
        .bind(&event.process_name)
        .bind(event.step_sequence)
        .bind(&event.step_name)
        .bind(event.event_type.as_str())
        .bind(event.event_status.as_str())
        .bind(serde_json::to_value(&event.identifiers).expect("identifiers serialize to json"))
        .bind(&event.metadata)
        .bind(&event.summary)
        .bind(&event.result)
        .bind(event.event_timestamp)
        .bind(&event.endpoint)
        .bind(event.http_method.map(|m| m.as_str()))
        .bind(event.http_status_code.map(i32::from))
        .bind(&event.request_payload)
        .bind(&event.response_payload)
        .bind(&event.error_code)
        .bind(&event.error_message)
        .bind(event.execution_time_ms)
        .bind(&event.idempotency_key)
        .bind(event.is_deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row_sql_has_31_placeholders() {
        let sql = build_bulk_insert_sql(1);
        assert!(sql.contains("$1"));
        assert!(sql.contains("$31"));
        assert!(!sql.contains("$32"));
    }

    #[test]
    fn three_row_sql_has_93_placeholders_and_three_groups() {
        let sql = build_bulk_insert_sql(3);
        assert_eq!(sql.matches('(').count(), 3);
        assert!(sql.contains("$93"));
        assert!(!sql.contains("$94"));
    }
}
