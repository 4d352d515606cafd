//! Static process-definition catalog.
//! Off the hot path by design — read for description/SLA display only.

use eventlog_core::process_definition::ProcessDefinition;
use sqlx::{PgPool, Row};

use crate::error::StoreError;

#[derive(Clone)]
pub struct ProcessDefinitionStore {
    pool: PgPool,
}

impl ProcessDefinitionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, def: &ProcessDefinition) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO process_definitions \
             (process_name, owning_team, expected_step_count, sla_ms) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (process_name) DO UPDATE SET \
             owning_team = EXCLUDED.owning_team, \
             expected_step_count = EXCLUDED.expected_step_count, \
             sla_ms = EXCLUDED.sla_ms",
        )
        .bind(&def.process_name)
        .bind(&def.owning_team)
        .bind(def.expected_step_count)
        .bind(def.sla_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, process_name: &str) -> Result<Option<ProcessDefinition>, StoreError> {
        let row = sqlx::query(
            "SELECT process_name, owning_team, expected_step_count, sla_ms \
             FROM process_definitions WHERE process_name = $1",
        )
        .bind(process_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ProcessDefinition {
            process_name: row.get("process_name"),
            owning_team: row.get("owning_team"),
            expected_step_count: row.get("expected_step_count"),
            sla_ms: row.get("sla_ms"),
        }))
    }
}
