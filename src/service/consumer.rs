//! Long-polling consumer for the request queue.
//!
//! `Consumer` pulls batches from a `QueueTransport`, parses each message as
//! an [`Envelope`], dispatches it to the handler registered for its event
//! type, and decides from the outcome whether the message is deleted or
//! left for redelivery:
//!
//! | outcome                         | message   |
//! |---------------------------------|-----------|
//! | body does not parse (poison)    | deleted   |
//! | no handler for the event type   | deleted   |
//! | handler returned `Ok`           | deleted   |
//! | handler returned `Err`          | retained  |
//!
//! Retention is the only retry mechanism: the transport redelivers the
//! message once its visibility window expires.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::bus::{QueueTransport, RawMessage};
use crate::config::ConsumerConfig;

use super::envelope::Envelope;
use super::registry::HandlerRegistry;

/// What happened to one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handler succeeded, message deleted.
    Handled,
    /// Body could not be parsed, message deleted.
    Poisoned,
    /// No handler for the event type, message deleted.
    Unroutable,
    /// Handler failed, message left for redelivery.
    Retained,
    /// Processing concluded but the delete failed; the message will be
    /// delivered again.
    Unacknowledged,
}

/// Result of one poll + dispatch cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The receive call failed; nothing was dispatched.
    pub poll_failed: bool,
    /// One entry per received message, in batch order.
    pub dispositions: Vec<Disposition>,
}

/// Counters accumulated by a running consumer.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerStats {
    /// Poll cycles started.
    pub polls: usize,
    /// Receive calls that failed.
    pub poll_errors: usize,
    /// Messages received.
    pub received: usize,
    pub handled: usize,
    pub poisoned: usize,
    pub unroutable: usize,
    pub retained: usize,
    pub unacknowledged: usize,
}

impl ConsumerStats {
    /// Fold one cycle into the totals.
    pub fn record(&mut self, cycle: &CycleReport) {
        self.polls += 1;
        if cycle.poll_failed {
            self.poll_errors += 1;
        }
        self.received += cycle.dispositions.len();
        for disposition in &cycle.dispositions {
            match disposition {
                Disposition::Handled => self.handled += 1,
                Disposition::Poisoned => self.poisoned += 1,
                Disposition::Unroutable => self.unroutable += 1,
                Disposition::Retained => self.retained += 1,
                Disposition::Unacknowledged => self.unacknowledged += 1,
            }
        }
    }
}

/// Polling and dispatch loop over one request queue.
///
/// ## Example
///
/// ```ignore
/// use std::sync::Arc;
/// use profile_relay::config::ConsumerConfig;
/// use profile_relay::service::{Consumer, HandlerRegistry};
///
/// let consumer = Consumer::new(
///     Arc::new(transport),
///     Arc::new(registry),
///     ConsumerConfig::new("user-profile-requests"),
/// );
///
/// let handle = consumer.spawn();
/// // ...
/// let stats = handle.stop().await;
/// println!("Handled {} messages", stats.handled);
/// ```
pub struct Consumer {
    transport: Arc<dyn QueueTransport>,
    registry: Arc<HandlerRegistry>,
    config: ConsumerConfig,
}

impl Consumer {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        registry: Arc<HandlerRegistry>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Start the polling loop on a tokio task.
    ///
    /// The returned handle stops the loop. Stopping is cooperative: the stop
    /// signal is checked once per cycle, so a cycle in progress (its poll and
    /// every handler call of its batch) runs to completion first.
    pub fn spawn(self) -> ConsumerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (stats_tx, stats_rx) = watch::channel(ConsumerStats::default());

        let handle = tokio::spawn(async move { self.run(stop_rx, stats_tx).await });

        ConsumerHandle {
            stop_tx,
            stats: stats_rx,
            handle: Some(handle),
        }
    }

    async fn run(
        &self,
        mut stop: watch::Receiver<bool>,
        stats_tx: watch::Sender<ConsumerStats>,
    ) -> ConsumerStats {
        let mut stats = ConsumerStats::default();

        tracing::info!(
            queue = %self.config.queue,
            max_messages = self.config.max_messages,
            wait_seconds = self.config.wait_time.as_secs(),
            event_types = ?self.registry.event_types(),
            "Consumer listening"
        );

        while !stop_requested(&stop) {
            let cycle = self.poll_once().await;
            stats.record(&cycle);
            stats_tx.send_replace(stats.clone());

            if cycle.poll_failed {
                // Back off so a broken transport does not spin the loop.
                tokio::select! {
                    _ = tokio::time::sleep(self.config.error_backoff) => {}
                    _ = stop.changed() => {}
                }
            }
        }

        tracing::info!(
            queue = %self.config.queue,
            polls = stats.polls,
            handled = stats.handled,
            retained = stats.retained,
            "Consumer stopped"
        );

        stats
    }

    /// Run one cycle: a single long poll, then concurrent dispatch of the
    /// whole batch.
    ///
    /// A receive failure is logged and reported, never returned as an error.
    pub async fn poll_once(&self) -> CycleReport {
        let messages = match self
            .transport
            .receive(
                &self.config.queue,
                self.config.max_messages,
                self.config.wait_time,
            )
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(
                    queue = %self.config.queue,
                    error = %e,
                    "Poll failed"
                );
                return CycleReport {
                    poll_failed: true,
                    dispositions: Vec::new(),
                };
            }
        };

        let dispositions = join_all(
            messages
                .into_iter()
                .map(|message| self.process_message(message)),
        )
        .await;

        CycleReport {
            poll_failed: false,
            dispositions,
        }
    }

    /// Parse, dispatch and settle a single message.
    pub async fn process_message(&self, message: RawMessage) -> Disposition {
        let envelope = match Envelope::parse(&message.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    message_id = %message.message_id,
                    error = %e,
                    body = %message.body,
                    "Discarding unparseable message"
                );
                return self.settle(&message, Disposition::Poisoned).await;
            }
        };

        let Some(handler) = self.registry.lookup(&envelope.event_type) else {
            tracing::warn!(
                message_id = %message.message_id,
                event_type = %envelope.event_type,
                "No handler registered for event type, discarding message"
            );
            return self.settle(&message, Disposition::Unroutable).await;
        };

        match handler.handle(&envelope).await {
            Ok(()) => {
                tracing::debug!(
                    message_id = %message.message_id,
                    event_type = %envelope.event_type,
                    correlation_id = ?envelope.correlation_id,
                    "Message handled"
                );
                self.settle(&message, Disposition::Handled).await
            }
            Err(e) => {
                tracing::error!(
                    message_id = %message.message_id,
                    event_type = %envelope.event_type,
                    correlation_id = ?envelope.correlation_id,
                    receive_count = message.receive_count,
                    error = %e,
                    "Handler failed, message retained for redelivery"
                );
                Disposition::Retained
            }
        }
    }

    /// Delete a message whose processing has concluded.
    async fn settle(&self, message: &RawMessage, disposition: Disposition) -> Disposition {
        match self
            .transport
            .delete(&self.config.queue, &message.receipt)
            .await
        {
            Ok(()) => disposition,
            Err(e) => {
                tracing::error!(
                    message_id = %message.message_id,
                    outcome = ?disposition,
                    error = %e,
                    "Failed to delete message, it will be redelivered"
                );
                Disposition::Unacknowledged
            }
        }
    }
}

fn stop_requested(stop: &watch::Receiver<bool>) -> bool {
    // A dropped sender counts as a stop request.
    *stop.borrow() || stop.has_changed().is_err()
}

/// Handle to a spawned consumer. Drop or call `stop()` to shut down.
pub struct ConsumerHandle {
    stop_tx: watch::Sender<bool>,
    stats: watch::Receiver<ConsumerStats>,
    handle: Option<JoinHandle<ConsumerStats>>,
}

impl ConsumerHandle {
    /// Stop the consumer and wait for its current cycle to finish.
    /// Returns the final statistics.
    pub async fn stop(mut self) -> ConsumerStats {
        self.stop_tx.send_replace(true);
        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(stats) => stats,
                Err(e) => {
                    tracing::error!(error = %e, "Consumer task did not finish cleanly");
                    self.stats()
                }
            },
            None => self.stats(),
        }
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Statistics as of the last completed cycle.
    pub fn stats(&self) -> ConsumerStats {
        self.stats.borrow().clone()
    }

    /// A receiver that observes the statistics after every cycle.
    pub fn subscribe_stats(&self) -> watch::Receiver<ConsumerStats> {
        self.stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}
