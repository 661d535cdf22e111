use crate::domain::book::Book;
use crate::domain::error::StoreError;
use crate::domain::user::{User, UserField, UserPatch};
use async_trait::async_trait;

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a user whose id is already assigned.
    async fn create(&self, user: User) -> StoreResult<User>;
    /// Exact, case-sensitive match on one field.
    async fn find_one(&self, field: UserField, value: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    /// Case-insensitive regex match; an empty pattern matches everything.
    async fn find_by_pattern(&self, field: UserField, pattern: &str) -> StoreResult<Vec<User>>;
    async fn update_by_id(&self, id: &str, patch: UserPatch) -> StoreResult<Option<User>>;
    /// `true` iff a record existed and was removed.
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool>;
    async fn find_all(&self) -> StoreResult<Vec<User>>;
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn create(&self, book: Book) -> StoreResult<Book>;
}

/// Record ids are UUIDs; anything else is rejected before touching storage.
///
/// Every spelling `Uuid` accepts (uppercase, simple, `urn:uuid:`) maps to the
/// lowercase hyphenated key the stores are indexed by.
pub fn parse_record_id(id: &str) -> StoreResult<String> {
    uuid::Uuid::parse_str(id)
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|e| StoreError::InvalidId(format!("{id}: {e}")))
}
