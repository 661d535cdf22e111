use crate::domain::book::Book;
use crate::domain::error::DomainResult;
use crate::domain::repository::BookRepository;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Store the posted fields as-is under a fresh id. Client-supplied
    /// `id`/`_id` keys are dropped.
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    pub async fn create_book(&self, mut fields: Map<String, Value>) -> DomainResult<Book> {
        fields.remove("id");
        fields.remove("_id");

        let book = Book {
            id: Uuid::new_v4().to_string(),
            fields,
        };
        let book = self.repository.create(book).await?;

        info!(book_id = %book.id, "Book created");
        Ok(book)
    }
}
