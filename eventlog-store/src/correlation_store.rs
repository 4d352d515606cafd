//! Correlation link persistence. One writer per `correlation_id`; repeated
//! inserts for the same id are idempotent by upserting rather than erroring
//! — re-linking the same correlation is a no-op, not a conflict.

use eventlog_core::correlation::CorrelationLink;
use sqlx::{PgPool, Row};

use crate::error::StoreError;

#[derive(Clone)]
pub struct CorrelationLinkStore {
    pool: PgPool,
}

impl CorrelationLinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, link: &CorrelationLink) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO correlation_links \
             (correlation_id, account_id, application_id, customer_id, card_last4) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (correlation_id) DO UPDATE SET \
             account_id = EXCLUDED.account_id, \
             application_id = EXCLUDED.application_id, \
             customer_id = EXCLUDED.customer_id, \
             card_last4 = EXCLUDED.card_last4",
        )
        .bind(&link.correlation_id)
        .bind(&link.account_id)
        .bind(&link.application_id)
        .bind(&link.customer_id)
        .bind(&link.card_last4)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, correlation_id: &str) -> Result<Option<CorrelationLink>, StoreError> {
        let row = sqlx::query(
            "SELECT correlation_id, account_id, application_id, customer_id, card_last4 \
             FROM correlation_links WHERE correlation_id = $1",
        )
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| CorrelationLink {
            correlation_id: row.get("correlation_id"),
            account_id: row.get("account_id"),
            application_id: row.get("application_id"),
            customer_id: row.get("customer_id"),
            card_last4: row.get("card_last4"),
        }))
    }
}
