//! Spillover sink: a pluggable capability with one operation, `spill`. The
//! reference implementation writes newline-delimited JSON to dated files
//! under a directory, debounced: flush at 100 buffered events or after
//! 100 ms of idleness.
//!
//! `tokio::fs`/`AsyncWriteExt` usage follows
//! `public/src/client/perfetto_trace_client.rs`'s binary-file writer, adapted
//! to an append-only, debounced text sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use eventlog_core::Event;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const FLUSH_EVENT_COUNT: usize = 100;
const FLUSH_IDLE: std::time::Duration = std::time::Duration::from_millis(100);

#[async_trait]
pub trait SpillSink: Send + Sync {
    async fn spill(&self, event: &Event) -> Result<()>;
}

/// Replay from spilled files is optional; this reference sink does not
/// implement it — it only ever appends.
pub struct FileSpillSink {
    directory: PathBuf,
    buffer: Arc<Mutex<Vec<String>>>,
}

impl FileSpillSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let sink = Self {
            directory: directory.into(),
            buffer: Arc::new(Mutex::new(Vec::with_capacity(FLUSH_EVENT_COUNT))),
        };
        sink.spawn_idle_flusher();
        sink
    }

    fn spawn_idle_flusher(&self) {
        let buffer = self.buffer.clone();
        let directory = self.directory.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(FLUSH_IDLE).await;
                let mut guard = buffer.lock().await;
                if guard.is_empty() {
                    continue;
                }
                let lines = std::mem::take(&mut *guard);
                drop(guard);
                if let Err(e) = write_lines(&directory, &lines).await {
                    tracing::error!("spillover flush failed: {e:?}");
                }
            }
        });
    }

    fn dated_path(directory: &Path) -> PathBuf {
        directory.join(format!("events-{}.ndjson", Utc::now().format("%Y-%m-%d")))
    }
}

async fn write_lines(directory: &Path, lines: &[String]) -> Result<()> {
    tokio::fs::create_dir_all(directory)
        .await
        .with_context(|| format!("creating spillover directory {}", directory.display()))?;
    let path = FileSpillSink::dated_path(directory);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .with_context(|| format!("opening spillover file {}", path.display()))?;
    for line in lines {
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
    }
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl SpillSink for FileSpillSink {
    async fn spill(&self, event: &Event) -> Result<()> {
        let line = serde_json::to_string(event).context("serializing spilled event")?;
        let mut guard = self.buffer.lock().await;
        guard.push(line);
        if guard.len() >= FLUSH_EVENT_COUNT {
            let lines = std::mem::take(&mut *guard);
            drop(guard);
            write_lines(&self.directory, &lines).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventlog_core::event::{EventStatus, EventType};
    use std::collections::HashMap;

    fn sample_event() -> Event {
        Event {
            execution_id: None,
            correlation_id: "corr-1".into(),
            trace_id: "trace-1".into(),
            span_id: None,
            parent_span_id: None,
            span_links: None,
            account_id: None,
            batch_id: None,
            application_id: "app".into(),
            originating_system: "svc-a".into(),
            target_system: "svc-b".into(),
            process_name: "onboarding".into(),
            step_sequence: None,
            step_name: None,
            event_type: EventType::Step,
            event_status: EventStatus::Success,
            identifiers: HashMap::new(),
            metadata: None,
            summary: "did a thing".into(),
            result: None,
            event_timestamp: Utc::now(),
            endpoint: None,
            http_method: None,
            http_status_code: None,
            request_payload: None,
            response_payload: None,
            error_code: None,
            error_message: None,
            execution_time_ms: None,
            idempotency_key: None,
            is_deleted: false,
        }
    }

    #[tokio::test]
    async fn spill_flushes_at_event_count_threshold() {
        let dir = std::env::temp_dir().join(format!("eventlog-sink-spill-test-{}", uuid::Uuid::new_v4()));
        let sink = FileSpillSink::new(&dir);
        for _ in 0..FLUSH_EVENT_COUNT {
            sink.spill(&sample_event()).await.unwrap();
        }
        let entries: Vec<_> = tokio::fs::read_dir(&dir).await.unwrap().next_entry().await.unwrap().into_iter().collect();
        assert!(!entries.is_empty());
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
