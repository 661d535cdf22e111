use crate::data::compile_pattern;
use crate::domain::repository::{StoreResult, UserRepository, parse_record_id};
use crate::domain::user::{User, UserField, UserPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Default)]
struct UserTable {
    rows: HashMap<String, User>,
    // insertion order, so listings come back the way a collection scan would
    order: Vec<String>,
}

impl UserTable {
    fn scan(&self) -> impl Iterator<Item = &User> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<UserTable>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn create(&self, mut user: User) -> StoreResult<User> {
        user.id = parse_record_id(&user.id)?;
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        if storage.rows.insert(user.id.clone(), user.clone()).is_none() {
            storage.order.push(user.id.clone());
        }
        debug!(user_id = %user.id, "User saved to memory storage");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_one(&self, field: UserField, value: &str) -> StoreResult<Option<User>> {
        let storage = self.storage.read().await;
        let user = storage.scan().find(|u| u.field(field) == value).cloned();
        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in storage"),
            None => trace!("User not found in storage"),
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let key = parse_record_id(id)?;
        let storage = self.storage.read().await;
        Ok(storage.rows.get(&key).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_pattern(&self, field: UserField, pattern: &str) -> StoreResult<Vec<User>> {
        let matcher = compile_pattern(pattern)?;
        let storage = self.storage.read().await;
        let users: Vec<User> = storage
            .scan()
            .filter(|u| matcher.is_match(u.field(field)))
            .cloned()
            .collect();
        debug!(count = users.len(), "Pattern lookup finished");
        Ok(users)
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(&self, id: &str, patch: UserPatch) -> StoreResult<Option<User>> {
        let key = parse_record_id(id)?;
        let mut storage = self.storage.write().await;
        let Some(user) = storage.rows.get_mut(&key) else {
            trace!("Nothing to update");
            return Ok(None);
        };
        user.apply_patch(patch);
        debug!(user_id = %user.id, "User updated in memory storage");
        Ok(Some(user.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let key = parse_record_id(id)?;
        let mut storage = self.storage.write().await;
        if storage.rows.remove(&key).is_none() {
            return Ok(false);
        }
        storage.order.retain(|existing| *existing != key);
        debug!(user_id = %key, "User removed from memory storage");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> StoreResult<Vec<User>> {
        let storage = self.storage.read().await;
        Ok(storage.scan().cloned().collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
