//! Queue bus - transport abstraction and reply publishing.
//!
//! This module provides the queue capability the consumer is built on and
//! the publisher handlers use to answer on a caller's reply queue.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Publisher (per service)                  │
//! │  - serialize(response) -> send(reply queue)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   QueueTransport trait                      │
//! │  receive(queue, max, wait) / delete(queue, receipt)         │
//! │  send(queue, body)                                          │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                     │
//!          ▼                  ▼                     ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────┐
//! │InMemoryQueue│    │  SqsQueue   │    │   RabbitMqQueue     │
//! │ (included)  │    │ (external)  │    │    (external)       │
//! └─────────────┘    └─────────────┘    └─────────────────────┘
//! ```
//!
//! Delivery is at-least-once: a message that is received but not deleted
//! within the transport's visibility window is delivered again.

mod in_memory_queue;
mod message;
mod publisher;
mod transport;

pub use in_memory_queue::{InMemoryQueue, DEFAULT_VISIBILITY_TIMEOUT};
pub use message::{RawMessage, ReceiptHandle};
pub use publisher::{PublishError, Publisher};
pub use transport::{QueueTransport, TransportError};
