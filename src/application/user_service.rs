use crate::domain::error::{CredentialError, DomainError, DomainResult};
use crate::domain::repository::UserRepository;
use crate::domain::user::{LoginRequest, RegisterUser, UpdateUser, User, UserField, UserPatch};
use crate::infrastructure::security::{hash_password, verify_password};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

// Argon2 runs on the blocking pool, never on an async worker.
async fn off_thread<T, F>(work: F) -> Result<T, CredentialError>
where
    F: FnOnce() -> Result<T, CredentialError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CredentialError::Task(e.to_string()))?
}

async fn hash_off_thread(password: String) -> Result<String, CredentialError> {
    off_thread(move || hash_password(&password)).await
}

async fn verify_off_thread(password: String, digest: String) -> Result<bool, CredentialError> {
    off_thread(move || verify_password(&password, &digest)).await
}

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn UserRepository> {
        &self.repository
    }

    /// Register a new user.
    ///
    /// The email check and the insert are two separate store calls. Two
    /// concurrent registrations for the same address can both pass the check;
    /// only a unique index in the backing store would close that window.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterUser) -> DomainResult<User> {
        trace!("Starting user registration");

        if self
            .repository
            .find_one(UserField::Email, &req.email)
            .await?
            .is_some()
        {
            warn!("User already exists");
            return Err(DomainError::EmailTaken);
        }

        let password_hash = hash_off_thread(req.password).await.map_err(|e| {
            error!(error = %e, "Failed to hash password");
            e
        })?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            email: req.email,
            password_hash,
        };

        debug!(user_id = %user.id, "Saving user to repository");
        let user = self.repository.create(user).await?;

        info!(user_id = %user.id, "User registered successfully");
        Ok(user)
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> DomainResult<User> {
        trace!("Starting login");

        let user = self
            .repository
            .find_one(UserField::Email, &req.email)
            .await?
            .ok_or_else(|| {
                warn!("User not found during login");
                DomainError::UnknownEmail
            })?;

        let is_valid = verify_off_thread(req.password, user.password_hash.clone())
            .await
            .map_err(|e| {
                error!(user_id = %user.id, error = %e, "Failed to verify password");
                e
            })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during login");
            return Err(DomainError::InvalidPassword);
        }

        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        let users = self.repository.find_all().await?;
        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Case-insensitive regex match on the name; no pattern means every user.
    #[instrument(skip(self))]
    pub async fn filter_by_name(&self, pattern: Option<&str>) -> DomainResult<Vec<User>> {
        let users = self
            .repository
            .find_by_pattern(UserField::Name, pattern.unwrap_or_default())
            .await?;
        debug!(count = users.len(), "Filtered users by name");
        Ok(users)
    }

    /// Overwrite whichever fields are present. A new password is hashed
    /// before it reaches the store; nothing else is checked.
    #[instrument(skip(self, req))]
    pub async fn update_user(&self, id: &str, req: UpdateUser) -> DomainResult<User> {
        let password_hash = match req.password {
            Some(password) => Some(hash_off_thread(password).await?),
            None => None,
        };

        let patch = UserPatch {
            name: req.name,
            email: req.email,
            password_hash,
        };

        let user = self
            .repository
            .update_by_id(id, patch)
            .await?
            .ok_or(DomainError::NotFound)?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> DomainResult<()> {
        if !self.repository.delete_by_id(id).await? {
            return Err(DomainError::NotFound);
        }
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::InMemoryUserRepository;
    use crate::domain::error::StoreError;
    use crate::domain::repository::MockUserRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryUserRepository::new()))
    }

    fn ann() -> RegisterUser {
        RegisterUser {
            name: "Ann".to_string(),
            email: "a@x.com".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let service = service();
        let user = service.register(ann()).await.unwrap();

        assert_ne!(user.password_hash, "secret");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert!(Uuid::parse_str(&user.id).is_ok());

        let stored = service.get_user(&user.id).await.unwrap();
        assert_eq!(stored, user);
    }

    #[tokio::test]
    async fn test_register_twice_keeps_one_record() {
        let service = service();
        service.register(ann()).await.unwrap();

        let second = service.register(ann()).await;
        assert!(matches!(second, Err(DomainError::EmailTaken)));
        assert_eq!(service.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let service = service();
        let registered = service.register(ann()).await.unwrap();

        let wrong = service
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "wrong".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(DomainError::InvalidPassword)));

        let unknown = service
            .login(LoginRequest {
                email: "nobody@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(DomainError::UnknownEmail)));

        let user = service
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_update_rehashes_password() {
        let service = service();
        let user = service.register(ann()).await.unwrap();

        let updated = service
            .update_user(
                &user.id,
                UpdateUser {
                    password: Some("new-secret".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_ne!(updated.password_hash, "new-secret");
        assert_ne!(updated.password_hash, user.password_hash);
        assert_eq!(updated.name, "Ann");

        let logged_in = service
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "new-secret".to_string(),
            })
            .await;
        assert!(logged_in.is_ok());
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let service = service();
        let id = Uuid::new_v4().to_string();

        assert!(matches!(service.get_user(&id).await, Err(DomainError::NotFound)));
        assert!(matches!(
            service.update_user(&id, UpdateUser::default()).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(service.delete_user(&id).await, Err(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn test_filter_without_pattern_returns_everyone() {
        let service = service();
        service.register(ann()).await.unwrap();
        service
            .register(RegisterUser {
                name: "Mark".to_string(),
                email: "m@x.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(service.filter_by_name(None).await.unwrap().len(), 2);
        assert_eq!(service.filter_by_name(Some("an")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_surfaces_store_failure() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_one()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".to_string())));
        repo.expect_create().never();

        let service = UserService::new(Arc::new(repo));
        let result = service.register(ann()).await;

        match result {
            Err(DomainError::Store(StoreError::Unavailable(msg))) => {
                assert_eq!(msg, "connection refused")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_never_hashes_or_creates() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_one().times(1).returning(|_, _| {
            Ok(Some(User {
                id: Uuid::new_v4().to_string(),
                name: "Ann".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "$argon2id$existing".to_string(),
            }))
        });
        repo.expect_create().never();

        let service = UserService::new(Arc::new(repo));
        assert!(matches!(
            service.register(ann()).await,
            Err(DomainError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_with_corrupt_digest_is_credential_error() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_one().returning(|_, _| {
            Ok(Some(User {
                id: Uuid::new_v4().to_string(),
                name: "Ann".to_string(),
                email: "a@x.com".to_string(),
                password_hash: "plaintext-leftover".to_string(),
            }))
        });

        let service = UserService::new(Arc::new(repo));
        let result = service
            .login(LoginRequest {
                email: "a@x.com".to_string(),
                password: "secret".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Credential(CredentialError::Format(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_sends_hashed_password_to_store() {
        let mut repo = MockUserRepository::new();
        repo.expect_update_by_id()
            .withf(|_, patch| {
                patch.name.is_none()
                    && patch
                        .password_hash
                        .as_deref()
                        .is_some_and(|h| h.starts_with("$argon2id$") && h != "hunter2")
            })
            .times(1)
            .returning(|id, patch| {
                Ok(Some(User {
                    id: id.to_string(),
                    name: "Ann".to_string(),
                    email: "a@x.com".to_string(),
                    password_hash: patch.password_hash.unwrap_or_default(),
                }))
            });

        let service = UserService::new(Arc::new(repo));
        let id = Uuid::new_v4().to_string();
        let updated = service
            .update_user(
                &id,
                UpdateUser {
                    password: Some("hunter2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, id);
    }

    #[tokio::test]
    async fn test_crashed_credential_task_is_not_reported_as_hashing() {
        let result: Result<bool, CredentialError> =
            off_thread(|| panic!("verifier crashed")).await;

        let err = result.unwrap_err();
        assert!(matches!(err, CredentialError::Task(_)));
        assert!(!err.to_string().contains("hash"));
    }
}
