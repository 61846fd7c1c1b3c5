pub mod bus;
pub mod config;
pub mod profile;
pub mod service;

pub use bus::{InMemoryQueue, Publisher, QueueTransport};
pub use config::{ConsumerConfig, QueueSettings, RoleIds};
pub use profile::{FullProfileResolver, ProfileResolver, UserProfileRequestedHandler};
pub use service::{
    build_handler_registry, Consumer, ConsumerHandle, Envelope, HandlerRegistry, MessageHandler,
    ResolvedResponse,
};
