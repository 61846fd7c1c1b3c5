//! Request service - handler registration, dispatch and request/reply.
//!
//! This module provides the message-consumption side of the crate: a
//! registry of handlers keyed by event type, and a `Consumer` that polls a
//! request queue and dispatches each envelope to its handler. Handlers reply
//! on the reply queue named inside the request, echoing its correlation id.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use profile_relay::bus::{InMemoryQueue, Publisher};
//! use profile_relay::config::ConsumerConfig;
//! use profile_relay::profile::UserProfileRequestedHandler;
//! use profile_relay::service::{Consumer, HandlerRegistry};
//!
//! let queue = Arc::new(InMemoryQueue::new());
//! let publisher = Publisher::new(queue.clone());
//!
//! let registry = HandlerRegistry::builder()
//!     .register(UserProfileRequestedHandler::new(resolver, publisher))?
//!     .build();
//!
//! let handle = Consumer::new(queue, Arc::new(registry), ConsumerConfig::new("requests")).spawn();
//! // ...
//! let stats = handle.stop().await;
//! ```

mod consumer;
mod envelope;
mod error;
mod handler;
#[cfg(feature = "http")]
pub mod http;
mod registry;
mod requester;
mod response;

pub use consumer::{Consumer, ConsumerHandle, ConsumerStats, CycleReport, Disposition};
pub use envelope::{Envelope, EnvelopeError, ReplyChannel};
pub use error::{HandlerError, RegistryError};
pub use handler::MessageHandler;
pub use registry::{build_handler_registry, HandlerRegistry, RegistryBuilder};
pub use requester::{RequestError, Requester};
pub use response::{resolved_event_type, ErrorCode, ResolvedResponse, ResponseError};
