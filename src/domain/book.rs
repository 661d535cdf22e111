use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A book is whatever object the client posted, plus the assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookResponse {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            fields: book.fields,
        }
    }
}
