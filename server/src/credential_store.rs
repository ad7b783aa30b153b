use crate::error::{Result, ServerError};
use crate::password::CredentialHasher;
use crate::user_repository::{UserId, UserRepository};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const MAX_USERNAME_CHARS: usize = 80;

/// Signup and login over a [`UserRepository`].
///
/// Hashing runs on the blocking pool; it is deliberately slow and is never
/// cached.
pub struct CredentialStore {
    repository: Arc<dyn UserRepository>,
    hasher: CredentialHasher,
}

impl CredentialStore {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: CredentialHasher) -> Self {
        Self { repository, hasher }
    }

    #[instrument(skip(self, password))]
    pub async fn create_user(&self, username: &str, password: &str) -> Result<UserId> {
        validate_username(username)?;
        validate_password(password)?;

        if self.repository.find_by_username(username).await?.is_some() {
            return Err(ServerError::AlreadyExists(username.to_string()));
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        // The repository's uniqueness check covers a concurrent signup that
        // slipped in between the lookup above and this insert.
        let id = self.repository.insert(username, &password_hash).await?;
        info!("User {} created with id {}", username, id);
        Ok(id)
    }

    /// Succeeds only for a matching pair. Unknown users and wrong passwords
    /// produce the same [`ServerError::InvalidCredentials`] at the same cost.
    #[instrument(skip(self, password))]
    pub async fn verify(&self, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ServerError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let stored = self.repository.find_by_username(username).await?;
        let hasher = self.hasher.clone();
        let password = password.to_string();

        let matched = tokio::task::spawn_blocking(move || match stored {
            Some(user) => hasher.verify(&password, &user.password_hash).unwrap_or_else(|e| {
                warn!("Stored hash for user id {} is unusable: {}", user.id, e);
                false
            }),
            None => {
                // Throwaway hash so an unknown user costs the same as a wrong password.
                hasher.hash(&password).ok();
                false
            }
        })
        .await?;

        if matched {
            info!("Login succeeded for {}", username);
            Ok(())
        } else {
            info!("Login rejected for {}", username);
            Err(ServerError::InvalidCredentials)
        }
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.repository.count().await
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(ServerError::Validation("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ServerError::Validation(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(ServerError::Validation("Password is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::fast_config;
    use crate::user_repository::{MemoryUserRepository, SqliteUserRepository};
    use tempfile::TempDir;

    fn memory_store() -> (CredentialStore, Arc<MemoryUserRepository>) {
        let repository = Arc::new(MemoryUserRepository::new());
        let store = CredentialStore::new(
            repository.clone(),
            CredentialHasher::new(&fast_config()).unwrap(),
        );
        (store, repository)
    }

    #[tokio::test]
    async fn create_then_verify_succeeds() {
        let (store, _) = memory_store();
        store.create_user("alice", "secret").await.unwrap();
        store.verify("alice", "secret").await.unwrap();
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_password() {
        let (store, repository) = memory_store();
        store.create_user("alice", "secret").await.unwrap();
        let row = repository.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(row.password_hash, "secret");
        assert!(!row.password_hash.contains("secret"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_identically() {
        let (store, _) = memory_store();
        store.create_user("alice", "secret").await.unwrap();

        let wrong = store.verify("alice", "wrong").await.unwrap_err();
        let unknown = store.verify("mallory", "secret").await.unwrap_err();

        assert!(matches!(wrong, ServerError::InvalidCredentials));
        assert!(matches!(unknown, ServerError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.status_code(), unknown.status_code());
        assert_eq!(wrong.client_message(), unknown.client_message());
    }

    #[tokio::test]
    async fn unusable_stored_hash_is_rejected_as_invalid_credentials() {
        let (store, repository) = memory_store();
        repository.insert("alice", "garbage").await.unwrap();

        let err = store.verify("alice", "secret").await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidCredentials));
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn username_match_is_case_sensitive() {
        let (store, _) = memory_store();
        store.create_user("alice", "secret").await.unwrap();
        assert!(matches!(
            store.verify("Alice", "secret").await,
            Err(ServerError::InvalidCredentials)
        ));
        store.create_user("Alice", "other").await.unwrap();
        assert_eq!(store.user_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn second_signup_with_same_username_is_rejected() {
        let (store, _) = memory_store();
        store.create_user("alice", "secret").await.unwrap();
        let err = store.create_user("alice", "different").await.unwrap_err();

        assert!(matches!(err, ServerError::AlreadyExists(_)));
        assert_eq!(store.user_count().await.unwrap(), 1);
        store.verify("alice", "secret").await.unwrap();
    }

    #[tokio::test]
    async fn empty_fields_are_validation_errors() {
        let (store, _) = memory_store();
        assert!(matches!(
            store.create_user("", "secret").await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            store.create_user("alice", "").await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            store.verify("", "secret").await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            store.verify("alice", "").await,
            Err(ServerError::Validation(_))
        ));
        assert_eq!(store.user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn username_length_limit_counts_characters() {
        let (store, _) = memory_store();
        let at_limit = "é".repeat(MAX_USERNAME_CHARS);
        store.create_user(&at_limit, "secret").await.unwrap();

        let over_limit = "a".repeat(MAX_USERNAME_CHARS + 1);
        assert!(matches!(
            store.create_user(&over_limit, "secret").await,
            Err(ServerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_signups_create_exactly_one_row() {
        let dir = TempDir::new().unwrap();
        let repository = Arc::new(
            SqliteUserRepository::connect(dir.path().join("users.db"))
                .await
                .unwrap(),
        );
        let store = Arc::new(CredentialStore::new(
            repository,
            CredentialHasher::new(&fast_config()).unwrap(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create_user("alice", &format!("pw-{i}")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert!(matches!(e, ServerError::AlreadyExists(_)), "{e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sqlite_backed_round_trip() {
        let dir = TempDir::new().unwrap();
        let repository = Arc::new(
            SqliteUserRepository::connect(dir.path().join("users.db"))
                .await
                .unwrap(),
        );
        let store = CredentialStore::new(repository, CredentialHasher::new(&fast_config()).unwrap());

        store.create_user("alice", "secret").await.unwrap();
        store.verify("alice", "secret").await.unwrap();
        assert!(matches!(
            store.verify("alice", "wrong").await,
            Err(ServerError::InvalidCredentials)
        ));
    }
}
