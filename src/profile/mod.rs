//! User profiles - domain model, resolution, and the request handler.
//!
//! `UserProfileRequestedHandler` answers `USER_PROFILE_REQUESTED` events
//! with the user's full profile. Resolution goes through the
//! [`ProfileResolver`] trait so the handler does not depend on storage;
//! [`FullProfileResolver`] implements it over any [`ProfileStore`].

mod handler;
mod in_memory;
mod model;
mod resolver;

pub use handler::{UserProfileRequestedHandler, USER_PROFILE_REQUESTED};
pub use in_memory::InMemoryProfileStore;
pub use model::{Client, Professional, ProfileExtension, ProfileType, User, UserFullProfile};
pub use resolver::{FullProfileResolver, ProfileResolver, ProfileStore, ResolveError, StoreError};
