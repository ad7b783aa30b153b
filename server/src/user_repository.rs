use crate::entity::user;
use crate::error::{Result, ServerError};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sea_orm::*;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{info, instrument};

pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// Storage for user rows. Implementations must reject a second row with the
/// same username with [`ServerError::AlreadyExists`], even under concurrent
/// inserts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, username: &str, password_hash: &str) -> Result<UserId>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn count(&self) -> Result<u64>;
}

pub struct SqliteUserRepository {
    db: DatabaseConnection,
}

impl SqliteUserRepository {
    #[instrument(skip(database_path))]
    pub async fn connect<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let database_path = database_path.as_ref();

        if let Some(parent) = database_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let db = Database::connect(&database_url).await?;

        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        "#;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            create_table_sql.to_string(),
        ))
        .await?;

        info!("Connected to SQLite database: {}", database_path.display());

        Ok(Self { db })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[instrument(skip(self, password_hash))]
    async fn insert(&self, username: &str, password_hash: &str) -> Result<UserId> {
        let row = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        match user::Entity::insert(row).exec(&self.db).await {
            Ok(result) => Ok(result.last_insert_id),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ServerError::AlreadyExists(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(row.map(|u| UserRecord {
            id: u.id,
            username: u.username,
            password_hash: u.password_hash,
        }))
    }

    async fn count(&self) -> Result<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }
}

/// Process-local repository; rows vanish on restart.
pub struct MemoryUserRepository {
    users: DashMap<String, UserRecord>,
    next_id: AtomicI64,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, username: &str, password_hash: &str) -> Result<UserId> {
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(ServerError::AlreadyExists(username.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                slot.insert(UserRecord {
                    id,
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                });
                Ok(id)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn sqlite_repo(dir: &TempDir) -> SqliteUserRepository {
        SqliteUserRepository::connect(dir.path().join("users.db"))
            .await
            .unwrap()
    }

    async fn exercise_insert_and_find(repo: &dyn UserRepository) {
        let id = repo.insert("alice", "hash-a").await.unwrap();
        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.password_hash, "hash-a");
        assert!(repo.find_by_username("Alice").await.unwrap().is_none());
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    async fn exercise_duplicate_rejected(repo: &dyn UserRepository) {
        repo.insert("alice", "hash-a").await.unwrap();
        let err = repo.insert("alice", "hash-b").await.unwrap_err();
        assert!(matches!(err, ServerError::AlreadyExists(name) if name == "alice"));
        assert_eq!(repo.count().await.unwrap(), 1);
        let kept = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(kept.password_hash, "hash-a");
    }

    async fn exercise_monotonic_ids(repo: &dyn UserRepository) {
        let first = repo.insert("a", "h").await.unwrap();
        let second = repo.insert("b", "h").await.unwrap();
        let third = repo.insert("c", "h").await.unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn sqlite_insert_and_find() {
        let dir = TempDir::new().unwrap();
        exercise_insert_and_find(&sqlite_repo(&dir).await).await;
    }

    #[tokio::test]
    async fn sqlite_duplicate_username_is_rejected() {
        let dir = TempDir::new().unwrap();
        exercise_duplicate_rejected(&sqlite_repo(&dir).await).await;
    }

    #[tokio::test]
    async fn sqlite_ids_are_monotonic() {
        let dir = TempDir::new().unwrap();
        exercise_monotonic_ids(&sqlite_repo(&dir).await).await;
    }

    #[tokio::test]
    async fn sqlite_rows_survive_reconnect() {
        let dir = TempDir::new().unwrap();
        {
            let repo = sqlite_repo(&dir).await;
            repo.insert("alice", "hash-a").await.unwrap();
        }
        let repo = sqlite_repo(&dir).await;
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.find_by_username("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sqlite_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("users.db");
        SqliteUserRepository::connect(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn memory_insert_and_find() {
        exercise_insert_and_find(&MemoryUserRepository::new()).await;
    }

    #[tokio::test]
    async fn memory_duplicate_username_is_rejected() {
        exercise_duplicate_rejected(&MemoryUserRepository::new()).await;
    }

    #[tokio::test]
    async fn memory_ids_are_monotonic() {
        exercise_monotonic_ids(&MemoryUserRepository::new()).await;
    }

    #[tokio::test]
    async fn memory_concurrent_inserts_keep_one_row() {
        let repo = Arc::new(MemoryUserRepository::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.insert("alice", &format!("hash-{i}")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
