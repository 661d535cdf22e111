use crate::application::book_service::BookService;
use crate::application::user_service::UserService;
use crate::domain::error::DomainError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub struct AppState {
    pub users: UserService,
    pub books: BookService,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ServerErrorResponse {
    message: &'static str,
    error: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Server error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            ApiError::BadRequest(msg) => {
                warn!(error = %msg, status = %status, "Bad request");
                HttpResponse::build(status).json(MessageResponse::new(msg.as_str()))
            }
            ApiError::NotFound(msg) => {
                warn!(error = %msg, status = %status, "Resource not found");
                HttpResponse::build(status).json(MessageResponse::new(msg.as_str()))
            }
            // the raw cause goes back to the caller unredacted
            ApiError::Internal(msg) => {
                error!(error = %msg, status = %status, "Server error");
                HttpResponse::build(status).json(ServerErrorResponse {
                    message: "Server error",
                    error: msg.clone(),
                })
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::NotFound => ApiError::NotFound(message),
            DomainError::UnknownEmail | DomainError::EmailTaken | DomainError::InvalidPassword => {
                ApiError::BadRequest(message)
            }
            DomainError::Store(_) | DomainError::Credential(_) => ApiError::Internal(message),
        }
    }
}

/// Malformed or mistyped JSON bodies get the same `{message}` shape as
/// every other client error.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

#[instrument]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hello World!")
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store: String,
    timestamp: String,
}

#[instrument(skip(state))]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    info!("Health check requested");
    let timestamp = Utc::now().to_rfc3339();

    match state.users.repository().ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ok",
            store: "ok".to_string(),
            timestamp,
        }),
        Err(e) => {
            warn!(error = %e, "Store ping failed");
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "degraded",
                store: e.to_string(),
                timestamp,
            })
        }
    }
}
