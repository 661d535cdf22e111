use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid record id: {0}")]
    InvalidId(String),
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Malformed password digest: {0}")]
    Format(String),
    #[error("Failed to hash password: {0}")]
    Hashing(String),
    #[error("Credential task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found")]
    NotFound,
    /// Login against an email nobody registered.
    #[error("User not found")]
    UnknownEmail,
    #[error("User already exists")]
    EmailTaken,
    #[error("Invalid password")]
    InvalidPassword,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

pub type DomainResult<T> = Result<T, DomainError>;
