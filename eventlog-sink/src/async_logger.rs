//! Async Logger — the producer-side core: bounded queue, `N` sender worker
//! tasks, scheduled jittered retry, circuit breaker, spillover on
//! back-pressure and permanent failure, graceful shutdown.
//!
//! `sender_threads` tokio tasks share one `tokio::sync::mpsc::Receiver`
//! behind an `Arc<Mutex<_>>`: tokio's mpsc is single-consumer, so concurrent
//! workers pull batches by briefly holding the receiver lock, not by each
//! owning a receiver.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eventlog_core::Event;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::LoggerConfig;
use crate::retry::compute_backoff;
use crate::spill::SpillSink;
use crate::transport::{HttpTransport, SendOutcome};

/// Reason tag for [`AsyncLogger::on_event_loss`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    QueueFull,
    RetriesExhausted,
    PostShutdown,
}

impl LossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::QueueFull => "queue_full",
            LossReason::RetriesExhausted => "retries_exhausted",
            LossReason::PostShutdown => "post_shutdown",
        }
    }
}

/// Snapshot returned by [`AsyncLogger::metrics`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    pub queued: u64,
    pub sent: u64,
    pub failed: u64,
    pub spilled: u64,
    pub queue_depth: u64,
    pub circuit_open: bool,
}

struct QueueItem {
    event: Event,
    attempts: u32,
}

type LossCallback = dyn Fn(&Event, LossReason) + Send + Sync;

struct Counters {
    queued: AtomicU64,
    sent: AtomicU64,
    failed: AtomicU64,
    spilled: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Self {
            queued: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            spilled: AtomicU64::new(0),
        }
    }
}

struct Shared {
    config: LoggerConfig,
    transport: HttpTransport,
    breaker: CircuitBreaker,
    spill_sink: Option<Arc<dyn SpillSink>>,
    loss_callback: Mutex<Option<Arc<LossCallback>>>,
    counters: Counters,
    closed: AtomicBool,
}

impl Shared {
    async fn spill_or_drop(&self, event: Event, reason: LossReason) {
        if let Some(sink) = &self.spill_sink {
            if let Err(e) = sink.spill(&event).await {
                tracing::error!("spillover write failed: {e:?}");
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                self.invoke_loss(&event, reason).await;
                return;
            }
            self.counters.spilled.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            self.invoke_loss(&event, reason).await;
        }
    }

    async fn invoke_loss(&self, event: &Event, reason: LossReason) {
        if let Some(cb) = self.loss_callback.lock().await.clone() {
            cb(event, reason);
        }
    }
}

/// Accepts `log()`/`log_many()` with never-blocking semantics, fans batches
/// out to `sender_threads` workers, and owns the lifetime of the transport
/// and sink it was constructed with.
pub struct AsyncLogger {
    shared: Arc<Shared>,
    sender: mpsc::Sender<QueueItem>,
    receiver: Arc<Mutex<mpsc::Receiver<QueueItem>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl AsyncLogger {
    pub fn new(
        config: LoggerConfig,
        transport: HttpTransport,
        spill_sink: Option<Arc<dyn SpillSink>>,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let breaker = CircuitBreaker::new(config.circuit_breaker_threshold, config.circuit_breaker_reset_ms);
        let shared = Arc::new(Shared {
            config: config.clone(),
            transport,
            breaker,
            spill_sink,
            loss_callback: Mutex::new(None),
            counters: Counters::new(),
            closed: AtomicBool::new(false),
        });
        let logger = Arc::new(Self {
            shared,
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            workers: Mutex::new(Vec::new()),
        });
        logger.spawn_workers();
        logger
    }

    fn spawn_workers(self: &Arc<Self>) {
        let mut handles = Vec::with_capacity(self.shared.config.sender_threads);
        for id in 0..self.shared.config.sender_threads.max(1) {
            let logger = self.clone();
            handles.push(tokio::spawn(async move {
                logger.worker_loop(id).await;
            }));
        }
        // Workers are spawned from `new`, before any caller can observe
        // `self.workers` — `try_lock` cannot fail here.
        if let Ok(mut guard) = self.workers.try_lock() {
            *guard = handles;
        }
    }

    /// Registers a callback invoked once per dropped/spilled event.
    pub async fn on_event_loss(&self, callback: impl Fn(&Event, LossReason) + Send + Sync + 'static) {
        *self.shared.loss_callback.lock().await = Some(Arc::new(callback));
    }

    /// Never blocks, never throws on back-pressure. Returns `false` only
    /// when the event could not be queued or spilled.
    #[tracing::instrument(skip(self, event), fields(correlation_id = %event.correlation_id))]
    pub async fn log(&self, event: Event) -> bool {
        if self.shared.closed.load(Ordering::Acquire) {
            self.shared.invoke_loss(&event, LossReason::PostShutdown).await;
            return false;
        }

        match self.sender.try_send(QueueItem { event, attempts: 0 }) {
            Ok(()) => {
                self.shared.counters.queued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(item)) => {
                self.shared.spill_or_drop(item.event, LossReason::QueueFull).await;
                self.shared.spill_sink.is_some()
            }
            Err(mpsc::error::TrySendError::Closed(item)) => {
                self.shared.invoke_loss(&item.event, LossReason::PostShutdown).await;
                false
            }
        }
    }

    /// Returns the count of events accepted (queued or spilled).
    pub async fn log_many(&self, events: Vec<Event>) -> usize {
        let mut accepted = 0;
        for event in events {
            if self.log(event).await {
                accepted += 1;
            }
        }
        accepted
    }

    /// Waits up to `timeout` for the queue to empty.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.sender.capacity() == self.shared.config.queue_capacity {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Idempotent. Stops accepting new events, flushes with a bounded
    /// deadline, spills whatever remains.
    pub async fn shutdown(&self, deadline: Duration) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return; // already shut down
        }

        self.flush(deadline).await;

        for handle in self.workers.lock().await.drain(..) {
            handle.abort();
        }

        let mut receiver = self.receiver.lock().await;
        receiver.close();
        while let Ok(item) = receiver.try_recv() {
            self.shared.spill_or_drop(item.event, LossReason::RetriesExhausted).await;
        }
    }

    pub fn metrics(&self) -> Metrics {
        let queue_depth = self.shared.config.queue_capacity as u64
            - self.sender.capacity() as u64;
        Metrics {
            queued: self.shared.counters.queued.load(Ordering::Relaxed),
            sent: self.shared.counters.sent.load(Ordering::Relaxed),
            failed: self.shared.counters.failed.load(Ordering::Relaxed),
            spilled: self.shared.counters.spilled.load(Ordering::Relaxed),
            queue_depth,
            circuit_open: self.shared.breaker.is_open(),
        }
    }

    async fn worker_loop(self: Arc<Self>, _worker_id: usize) {
        loop {
            let batch = self.drain_batch().await;
            if batch.is_empty() {
                if self.shared.closed.load(Ordering::Acquire) {
                    return;
                }
                continue;
            }
            self.send_batch(batch).await;
        }
    }

    /// Blocks up to `max_batch_wait_ms` for the first item, then drains the
    /// rest non-blockingly up to `batch_size`.
    async fn drain_batch(&self) -> Vec<QueueItem> {
        let mut receiver = self.receiver.lock().await;
        let wait = Duration::from_millis(self.shared.config.max_batch_wait_ms);

        let first = match tokio::time::timeout(wait, receiver.recv()).await {
            Ok(Some(item)) => item,
            Ok(None) => return Vec::new(), // channel closed, no items
            Err(_elapsed) => return Vec::new(),
        };

        let mut batch = vec![first];
        while batch.len() < self.shared.config.batch_size {
            match receiver.try_recv() {
                Ok(item) => batch.push(item),
                Err(_) => break,
            }
        }
        batch
    }

    async fn send_batch(&self, batch: Vec<QueueItem>) {
        if !self.shared.breaker.allow_send() {
            // Breaker Open: requeue without attempting a send.
            self.requeue_or_spill(batch).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            return;
        }

        let events: Vec<Event> = batch.iter().map(|item| item.event.clone()).collect();
        match self.shared.transport.send_batch(&events).await {
            SendOutcome::Success(response) => {
                self.shared.breaker.record_success();
                let failed_indices: std::collections::HashSet<usize> =
                    response.errors.iter().map(|e| e.index).collect();
                let mut to_retry = Vec::new();
                for (index, item) in batch.into_iter().enumerate() {
                    if failed_indices.contains(&index) {
                        to_retry.push(item);
                    } else {
                        self.shared.counters.sent.fetch_add(1, Ordering::Relaxed);
                    }
                }
                self.retry_or_spill(to_retry).await;
            }
            SendOutcome::Retryable(reason) => {
                tracing::debug!("retryable batch failure: {reason}");
                self.shared.breaker.record_failure();
                self.retry_or_spill(batch).await;
            }
            SendOutcome::Terminal(reason) => {
                tracing::debug!("terminal batch failure: {reason}");
                self.shared.breaker.record_failure();
                for item in batch {
                    self.shared
                        .spill_or_drop(item.event, LossReason::RetriesExhausted)
                        .await;
                }
            }
        }
    }

    /// Requeues items that haven't exhausted their retry budget after a
    /// jittered delay; spills the rest.
    async fn retry_or_spill(&self, items: Vec<QueueItem>) {
        if items.is_empty() {
            return;
        }
        let max_retries = self.shared.config.max_retries;
        let base = self.shared.config.base_retry_delay_ms;
        let max_delay = self.shared.config.max_retry_delay_ms;

        let mut to_reschedule = Vec::new();
        for mut item in items {
            item.attempts += 1;
            if item.attempts > max_retries {
                self.shared
                    .spill_or_drop(item.event, LossReason::RetriesExhausted)
                    .await;
            } else {
                to_reschedule.push(item);
            }
        }
        if to_reschedule.is_empty() {
            return;
        }

        let delay = compute_backoff(base, to_reschedule[0].attempts, max_delay);
        let sender = self.sender.clone();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for item in to_reschedule {
                if let Err(mpsc::error::TrySendError::Full(item))
                | Err(mpsc::error::TrySendError::Closed(item)) = sender.try_send(item)
                {
                    shared.spill_or_drop(item.event, LossReason::QueueFull).await;
                } else {
                    shared.counters.queued.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    }

    /// Used when the breaker is Open: put items back on the queue without
    /// counting a retry attempt, or spill if the queue is at capacity.
    async fn requeue_or_spill(&self, items: Vec<QueueItem>) {
        for item in items {
            if let Err(mpsc::error::TrySendError::Full(item))
            | Err(mpsc::error::TrySendError::Closed(item)) = self.sender.try_send(item)
            {
                self.shared.spill_or_drop(item.event, LossReason::QueueFull).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_reason_strings_match_spec_tags() {
        assert_eq!(LossReason::QueueFull.as_str(), "queue_full");
        assert_eq!(LossReason::RetriesExhausted.as_str(), "retries_exhausted");
        assert_eq!(LossReason::PostShutdown.as_str(), "post_shutdown");
    }
}
