//! MongoDB-backed record store.

use crate::domain::book::Book;
use crate::domain::error::StoreError;
use crate::domain::repository::{BookRepository, StoreResult, UserRepository, parse_record_id};
use crate::domain::user::{User, UserField, UserPatch};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tracing::{debug, info, instrument};

const USERS_COLLECTION: &str = "users";
const BOOKS_COLLECTION: &str = "books";

// server code for "Regular expression is invalid"
const INVALID_REGEX_CODE: i32 = 51091;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
                StoreError::Serialization(err.to_string())
            }
            ErrorKind::Command(command) if command.code == INVALID_REGEX_CODE => {
                StoreError::InvalidPattern(command.message.clone())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Build a client for `uri` and select `database`.
///
/// The driver connects lazily, so this only fails on a malformed URI;
/// reachability is checked with [`UserRepository::ping`].
pub async fn connect(uri: &str, database: &str) -> StoreResult<Database> {
    info!(database = database, "Configuring MongoDB client");

    let mut options = ClientOptions::parse(uri).await?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    options.connect_timeout = Some(Duration::from_secs(10));
    options.server_selection_timeout = Some(Duration::from_secs(10));

    let client = Client::with_options(options)?;
    Ok(client.database(database))
}

async fn ping(database: &Database) -> StoreResult<()> {
    database.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}

#[derive(Clone)]
pub struct MongoUserRepository {
    database: Database,
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(database: Database) -> Self {
        let collection = database.collection::<User>(USERS_COLLECTION);
        Self {
            database,
            collection,
        }
    }

    fn exact_filter(field: UserField, value: &str) -> Document {
        let mut filter = Document::new();
        filter.insert(field.as_str(), value);
        filter
    }

    fn pattern_filter(field: UserField, pattern: &str) -> Document {
        let mut filter = Document::new();
        filter.insert(field.as_str(), doc! { "$regex": pattern, "$options": "i" });
        filter
    }

    fn set_document(patch: &UserPatch) -> Document {
        let mut set = doc! {};
        if let Some(ref name) = patch.name {
            set.insert("name", name.as_str());
        }
        if let Some(ref email) = patch.email {
            set.insert("email", email.as_str());
        }
        if let Some(ref password_hash) = patch.password_hash {
            set.insert("password_hash", password_hash.as_str());
        }
        set
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id, email = %user.email))]
    async fn create(&self, mut user: User) -> StoreResult<User> {
        user.id = parse_record_id(&user.id)?;
        self.collection.insert_one(&user).await?;
        debug!("User inserted");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_one(&self, field: UserField, value: &str) -> StoreResult<Option<User>> {
        let user = self
            .collection
            .find_one(Self::exact_filter(field, value))
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let key = parse_record_id(id)?;
        let user = self.collection.find_one(doc! { "_id": key }).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_pattern(&self, field: UserField, pattern: &str) -> StoreResult<Vec<User>> {
        // the server's PCRE engine validates the pattern
        let cursor = self
            .collection
            .find(Self::pattern_filter(field, pattern))
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;
        debug!(count = users.len(), "Pattern lookup finished");
        Ok(users)
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(&self, id: &str, patch: UserPatch) -> StoreResult<Option<User>> {
        let key = parse_record_id(id)?;
        if patch.is_empty() {
            return self.find_by_id(&key).await;
        }

        let user = self
            .collection
            .find_one_and_update(
                doc! { "_id": key },
                doc! { "$set": Self::set_document(&patch) },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let key = parse_record_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": key }).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> StoreResult<Vec<User>> {
        let cursor = self.collection.find(doc! {}).await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users)
    }

    async fn ping(&self) -> StoreResult<()> {
        ping(&self.database).await
    }
}

#[derive(Clone)]
pub struct MongoBookRepository {
    collection: Collection<Book>,
}

impl MongoBookRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection::<Book>(BOOKS_COLLECTION),
        }
    }
}

#[async_trait]
impl BookRepository for MongoBookRepository {
    #[instrument(skip(self, book), fields(book_id = %book.id))]
    async fn create(&self, mut book: Book) -> StoreResult<Book> {
        book.id = parse_record_id(&book.id)?;
        self.collection.insert_one(&book).await?;
        debug!("Book inserted");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_filter_is_case_insensitive_regex() {
        let filter = MongoUserRepository::pattern_filter(UserField::Name, "jo");
        let inner = filter.get_document("name").unwrap();
        assert_eq!(inner.get_str("$regex").unwrap(), "jo");
        assert_eq!(inner.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_exact_filter_targets_field() {
        let filter = MongoUserRepository::exact_filter(UserField::Email, "a@x.com");
        assert_eq!(filter.get_str("email").unwrap(), "a@x.com");
    }

    #[test]
    fn test_set_document_only_has_supplied_fields() {
        let set = MongoUserRepository::set_document(&UserPatch {
            email: Some("b@x.com".to_string()),
            ..Default::default()
        });
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("email").unwrap(), "b@x.com");
    }

    #[test]
    fn test_set_document_empty_patch() {
        assert!(MongoUserRepository::set_document(&UserPatch::default()).is_empty());
    }

    #[test]
    fn test_pcre_only_patterns_reach_the_server() {
        let pattern = "^(?!Mark)";
        assert!(crate::data::compile_pattern(pattern).is_err());

        let filter = MongoUserRepository::pattern_filter(UserField::Name, pattern);
        let inner = filter.get_document("name").unwrap();
        assert_eq!(inner.get_str("$regex").unwrap(), pattern);
    }

    #[test]
    fn test_bson_failures_are_serialization_errors() {
        let bson_err = mongodb::bson::to_document(&42).unwrap_err();
        let err = StoreError::from(mongodb::error::Error::from(bson_err));
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_io_failures_mean_store_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::from(mongodb::error::Error::from(io_err));
        assert!(matches!(err, StoreError::Unavailable(msg) if msg.contains("refused")));
    }
}
