use crate::domain::book::Book;
use crate::domain::repository::{BookRepository, StoreResult, parse_record_id};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[derive(Clone, Default)]
pub struct InMemoryBookRepository {
    storage: Arc<RwLock<HashMap<String, Book>>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    #[instrument(skip(self, book), fields(book_id = %book.id))]
    async fn create(&self, mut book: Book) -> StoreResult<Book> {
        book.id = parse_record_id(&book.id)?;
        let mut storage = self.storage.write().await;
        storage.insert(book.id.clone(), book.clone());
        debug!("Book saved to memory storage");
        Ok(book)
    }
}
