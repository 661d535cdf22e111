use crate::domain::book::BookResponse;
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde_json::{Map, Value};
use tracing::{error, info, instrument};

#[instrument(skip(state, req))]
pub async fn create_book(
    state: web::Data<AppState>,
    req: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, ApiError> {
    let book = state
        .books
        .create_book(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create book");
            ApiError::from(e)
        })?;

    info!(book_id = %book.id, "Book created successfully");
    Ok(HttpResponse::Created().json(BookResponse::from(book)))
}
