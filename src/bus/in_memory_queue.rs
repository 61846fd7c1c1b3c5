//! In-memory queue broker for testing and single-process scenarios.
//!
//! This module provides a thread-safe broker holding any number of named
//! queues. It implements `QueueTransport` with the same delivery model a
//! hosted queue has, which makes it useful for:
//! - Unit and integration testing without external dependencies
//! - Single-process applications and demos (see `without_recording`)
//! - Exercising redelivery and failure paths deterministically

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::message::{RawMessage, ReceiptHandle};
use super::transport::{QueueTransport, TransportError};

/// Visibility window applied when none is configured.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// In-memory queue broker.
///
/// Features:
/// - Cloneable handle; all clones share the same queues
/// - Long polling that wakes as soon as a message is sent
/// - Visibility window: received messages that are not deleted in time are
///   redelivered with an incremented `receive_count` and a fresh receipt
/// - Records every send and delete for assertions, until drained with
///   [`take_sent`](Self::take_sent) / [`take_deleted`](Self::take_deleted)
///   or switched off with [`without_recording`](Self::without_recording)
/// - Fault injection for receive and send failures
///
/// ## Example
///
/// ```ignore
/// use std::time::Duration;
/// use profile_relay::bus::{InMemoryQueue, QueueTransport};
///
/// let queue = InMemoryQueue::new();
/// queue.create_queue("requests");
///
/// queue.send("requests", r#"{"eventType":"PING"}"#.to_string()).await?;
///
/// let batch = queue.receive("requests", 10, Duration::from_secs(1)).await?;
/// assert_eq!(batch.len(), 1);
/// queue.delete("requests", &batch[0].receipt).await?;
/// ```
#[derive(Clone)]
pub struct InMemoryQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<BrokerState>,
    notify: Notify,
}

struct BrokerState {
    queues: HashMap<String, QueueState>,
    visibility_timeout: Duration,
    next_sequence: u64,
    failing_receives: usize,
    rejected_sends: HashSet<String>,
    recording: bool,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<ReceiptHandle, InFlight>,
    deleted: Vec<ReceiptHandle>,
    sent: Vec<String>,
}

#[derive(Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: u32,
}

struct InFlight {
    message: StoredMessage,
    visible_at: Instant,
}

impl QueueState {
    /// Move in-flight messages whose window has passed back to the ready list.
    fn requeue_expired(&mut self, now: Instant) {
        let expired: Vec<ReceiptHandle> = self
            .in_flight
            .iter()
            .filter(|(_, flight)| flight.visible_at <= now)
            .map(|(receipt, _)| receipt.clone())
            .collect();

        for receipt in expired {
            if let Some(flight) = self.in_flight.remove(&receipt) {
                self.ready.push_back(flight.message);
            }
        }
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.in_flight.values().map(|flight| flight.visible_at).min()
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    /// Create an empty broker with the default visibility window.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BrokerState {
                    queues: HashMap::new(),
                    visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
                    next_sequence: 0,
                    failing_receives: 0,
                    rejected_sends: HashSet::new(),
                    recording: true,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Set the visibility window for messages received from now on.
    pub fn with_visibility_timeout(self, timeout: Duration) -> Self {
        self.state().visibility_timeout = timeout;
        self
    }

    /// Stop recording sends and deletes.
    ///
    /// For long-running processes, where the recordings would otherwise
    /// keep a copy of every body ever sent.
    pub fn without_recording(self) -> Self {
        self.state().recording = false;
        self
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a queue. Creating an existing queue is a no-op.
    pub fn create_queue(&self, name: &str) {
        self.state().queues.entry(name.to_string()).or_default();
    }

    /// Whether a queue with this name exists.
    pub fn has_queue(&self, name: &str) -> bool {
        self.state().queues.contains_key(name)
    }

    /// Bodies currently waiting to be received, in delivery order.
    pub fn messages(&self, queue: &str) -> Vec<String> {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.ready.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of messages received but neither deleted nor redelivered yet.
    pub fn in_flight(&self, queue: &str) -> usize {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.in_flight.len())
            .unwrap_or_default()
    }

    /// Receipts deleted from `queue` since the last drain, in deletion order.
    pub fn deleted(&self, queue: &str) -> Vec<ReceiptHandle> {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.deleted.clone())
            .unwrap_or_default()
    }

    /// Every body sent to `queue` since the last drain, including ones
    /// already consumed.
    pub fn sent(&self, queue: &str) -> Vec<String> {
        self.state()
            .queues
            .get(queue)
            .map(|q| q.sent.clone())
            .unwrap_or_default()
    }

    /// Drain the recorded sends of `queue`.
    pub fn take_sent(&self, queue: &str) -> Vec<String> {
        self.state()
            .queues
            .get_mut(queue)
            .map(|q| std::mem::take(&mut q.sent))
            .unwrap_or_default()
    }

    /// Drain the recorded deletes of `queue`.
    pub fn take_deleted(&self, queue: &str) -> Vec<ReceiptHandle> {
        self.state()
            .queues
            .get_mut(queue)
            .map(|q| std::mem::take(&mut q.deleted))
            .unwrap_or_default()
    }

    /// Make every in-flight message of `queue` visible again immediately.
    ///
    /// Equivalent to waiting out the visibility window.
    pub fn expire_in_flight(&self, queue: &str) {
        let mut state = self.state();
        if let Some(q) = state.queues.get_mut(queue) {
            for flight in q.in_flight.values_mut() {
                flight.visible_at = Instant::now();
            }
        }
        drop(state);
        self.inner.notify.notify_waiters();
    }

    /// Make the next `count` calls to `receive` fail with `ConnectionFailed`.
    pub fn fail_next_receives(&self, count: usize) {
        self.state().failing_receives = count;
    }

    /// Make every send to `queue` fail with `Rejected` until accepted again.
    pub fn reject_sends_to(&self, queue: &str) {
        self.state().rejected_sends.insert(queue.to_string());
    }

    /// Undo [`reject_sends_to`](Self::reject_sends_to).
    pub fn accept_sends_to(&self, queue: &str) {
        self.state().rejected_sends.remove(queue);
    }

    /// Try to take a batch without waiting.
    ///
    /// Returns the batch (possibly empty) and the instant at which the next
    /// in-flight message becomes visible again, if any.
    fn take_batch(
        &self,
        queue: &str,
        max_messages: usize,
    ) -> Result<(Vec<RawMessage>, Option<Instant>), TransportError> {
        let mut guard = self.state();
        let state = &mut *guard;

        if state.failing_receives > 0 {
            state.failing_receives -= 1;
            return Err(TransportError::ConnectionFailed(
                "injected receive failure".to_string(),
            ));
        }

        let q = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

        let now = Instant::now();
        q.requeue_expired(now);

        let mut batch = Vec::new();
        while batch.len() < max_messages {
            let Some(mut message) = q.ready.pop_front() else {
                break;
            };
            message.receive_count += 1;
            state.next_sequence += 1;

            let receipt = ReceiptHandle::new(format!(
                "{}:{}",
                message.message_id, state.next_sequence
            ));
            batch.push(RawMessage {
                message_id: message.message_id.clone(),
                receipt: receipt.clone(),
                body: message.body.clone(),
                receive_count: message.receive_count,
            });
            q.in_flight.insert(
                receipt,
                InFlight {
                    message,
                    visible_at: now + state.visibility_timeout,
                },
            );
        }

        Ok((batch, q.next_expiry()))
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueue {
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<RawMessage>, TransportError> {
        let deadline = Instant::now() + wait;
        let max_messages = max_messages.max(1);

        loop {
            // Register for wakeups before looking, so a send racing with
            // the check below is not missed.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let (batch, next_expiry) = self.take_batch(queue, max_messages)?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            if Instant::now() >= deadline {
                return Ok(batch);
            }

            let wake_at = next_expiry.map_or(deadline, |expiry| expiry.min(deadline));
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete(&self, queue: &str, receipt: &ReceiptHandle) -> Result<(), TransportError> {
        let mut state = self.state();
        let recording = state.recording;
        let q = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

        match q.in_flight.remove(receipt) {
            Some(_) => {
                if recording {
                    q.deleted.push(receipt.clone());
                }
                Ok(())
            }
            None => Err(TransportError::InvalidReceipt(receipt.to_string())),
        }
    }

    async fn send(&self, queue: &str, body: String) -> Result<(), TransportError> {
        {
            let mut state = self.state();
            if state.rejected_sends.contains(queue) {
                return Err(TransportError::Rejected(format!(
                    "sends to '{}' are rejected",
                    queue
                )));
            }

            let recording = state.recording;
            let q = state
                .queues
                .get_mut(queue)
                .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

            if recording {
                q.sent.push(body.clone());
            }
            q.ready.push_back(StoredMessage {
                message_id: uuid::Uuid::new_v4().to_string(),
                body,
                receive_count: 0,
            });
        }

        self.inner.notify.notify_waiters();
        Ok(())
    }
}
