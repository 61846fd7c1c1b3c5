//! Full-profile resolution over a profile store.

use std::error::Error;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::RoleIds;

use super::model::{Client, Professional, ProfileExtension, User, UserFullProfile};

/// Error raised by a profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Other error
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

/// Error raised while resolving a profile.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The requested record does not exist
    #[error("{resource} with identifier '{id}' not found")]
    NotFound { resource: &'static str, id: i64 },
    /// The store failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Other error
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

/// Resolves a user id to the user's full profile.
///
/// Supplied by the domain layer and consumed by the profile-request
/// handler.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    /// Fails with [`ResolveError::NotFound`] when the user does not exist.
    async fn resolve_full_profile(&self, user_id: i64) -> Result<UserFullProfile, ResolveError>;
}

/// Read access to users and their role-specific extensions.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_client_by_user_id(&self, user_id: i64) -> Result<Option<Client>, StoreError>;

    async fn find_professional_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Option<Professional>, StoreError>;
}

/// Resolves profiles by reading the user, then the extension matching the
/// user's role.
///
/// Clients get their client row, professionals their professional row.
/// Any other role, or a missing extension row, yields a profile without an
/// extension.
pub struct FullProfileResolver<S> {
    store: S,
    roles: RoleIds,
}

impl<S: ProfileStore> FullProfileResolver<S> {
    pub fn new(store: S, roles: RoleIds) -> Self {
        Self { store, roles }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileResolver for FullProfileResolver<S> {
    async fn resolve_full_profile(&self, user_id: i64) -> Result<UserFullProfile, ResolveError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(ResolveError::NotFound {
                resource: "User",
                id: user_id,
            })?;

        let extension = if user.role_id == self.roles.client {
            self.store
                .find_client_by_user_id(user_id)
                .await?
                .map(ProfileExtension::Client)
        } else if user.role_id == self.roles.professional {
            self.store
                .find_professional_by_user_id(user_id)
                .await?
                .map(ProfileExtension::Professional)
        } else {
            None
        };

        Ok(UserFullProfile::new(user, extension))
    }
}
