pub mod book_service;
pub mod user_service;
