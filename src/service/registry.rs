//! Handler registry - the startup-time dispatch table.
//!
//! A `HandlerRegistry` maps event types to the handler responsible for them.
//! It is built once at the composition root, then handed to the consumer
//! behind an `Arc` and never mutated again.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use profile_relay::service::HandlerRegistry;
//!
//! let registry = HandlerRegistry::builder()
//!     .register(user_profile_requested)?
//!     .build();
//!
//! assert!(registry.lookup("USER_PROFILE_REQUESTED").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::RegistryError;
use super::handler::MessageHandler;

/// Immutable mapping from event type to handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

/// Builder for [`HandlerRegistry`]. Rejects duplicate event types.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl RegistryBuilder {
    /// Register a handler under its own event type.
    pub fn register<H>(self, handler: H) -> Result<Self, RegistryError>
    where
        H: MessageHandler + 'static,
    {
        self.register_arc(Arc::new(handler))
    }

    /// Register an already shared handler under its own event type.
    pub fn register_arc(
        mut self,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Self, RegistryError> {
        let event_type = handler.event_type().to_string();
        if self.handlers.contains_key(&event_type) {
            return Err(RegistryError::DuplicateHandler(event_type));
        }
        self.handlers.insert(event_type, handler);
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The handler for `event_type`, by exact match.
    pub fn lookup(&self, event_type: &str) -> Option<&Arc<dyn MessageHandler>> {
        self.handlers.get(event_type)
    }

    /// Registered event types, sorted.
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("event_types", &self.event_types())
            .finish()
    }
}

/// Build the dispatch table from the handlers wired at the composition root.
///
/// Add new handlers at the call site as new event types are introduced.
/// Fails on the first event type claimed twice.
pub fn build_handler_registry<I>(handlers: I) -> Result<HandlerRegistry, RegistryError>
where
    I: IntoIterator<Item = Arc<dyn MessageHandler>>,
{
    handlers
        .into_iter()
        .try_fold(HandlerRegistry::builder(), RegistryBuilder::register_arc)
        .map(RegistryBuilder::build)
}
