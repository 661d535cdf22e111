pub mod book_repository;
pub mod mongo;
pub mod user_repository;

use crate::domain::error::StoreError;
use crate::domain::repository::StoreResult;
use regex::{Regex, RegexBuilder};

pub(crate) fn compile_pattern(pattern: &str) -> StoreResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| StoreError::InvalidPattern(e.to_string()))
}
