//! In-memory profile store for testing and demos.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::model::{Client, Professional, User};
use super::resolver::{ProfileStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    clients: HashMap<i64, Client>,
    professionals: HashMap<i64, Professional>,
}

/// Thread-safe in-memory `ProfileStore`.
///
/// Clones share the same tables. Extensions are keyed by the owning user's
/// id, so inserting a second extension for a user replaces the first.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.write()?.users.insert(user.id, user);
        Ok(())
    }

    pub fn insert_client(&self, client: Client) -> Result<(), StoreError> {
        self.write()?.clients.insert(client.user_id, client);
        Ok(())
    }

    pub fn insert_professional(&self, professional: Professional) -> Result<(), StoreError> {
        self.write()?
            .professionals
            .insert(professional.user_id, professional);
        Ok(())
    }

    pub fn user_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.users.len())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("profile store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("profile store lock poisoned".into()))
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_client_by_user_id(&self, user_id: i64) -> Result<Option<Client>, StoreError> {
        Ok(self.read()?.clients.get(&user_id).cloned())
    }

    async fn find_professional_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Option<Professional>, StoreError> {
        Ok(self.read()?.professionals.get(&user_id).cloned())
    }
}
