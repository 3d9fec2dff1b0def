use async_trait::async_trait;
use snippetbox_core::{hash_password, verify_password};
use sqlx::PgPool;
use tracing::instrument;

use crate::store::StoreError;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_uc_email";

/// Persistence and credential checks for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Hashes `password` and stores a new user.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the email is taken, in
    /// any letter case.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError>;

    /// Returns the user's id if `email` exists and `password` matches its hash.
    ///
    /// Both an unknown email and a wrong password yield
    /// [`StoreError::InvalidCredentials`].
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError>;

    async fn exists(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, password))]
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError> {
        let hashed_password =
            hash_password(password).map_err(|e| StoreError::Internal(e.error))?;

        let result = sqlx::query(
            "INSERT INTO users (name, email, hashed_password, created)
             VALUES ($1, $2, $3, NOW())",
        )
        .bind(name)
        .bind(email)
        .bind(&hashed_password)
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) =>
            {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError> {
        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT id, hashed_password FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        let Some((id, hashed_password)) = row else {
            return Err(StoreError::InvalidCredentials);
        };

        let ok = verify_password(password, hashed_password.trim_end())
            .map_err(|e| StoreError::Internal(e.error))?;
        if !ok {
            return Err(StoreError::InvalidCredentials);
        }

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT true FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        Ok(exists)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryUserStore;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use async_trait::async_trait;
    use chrono::Utc;
    use snippetbox_core::{hash_password_with_cost, verify_password};
    use snippetbox_models::User;
    use tokio::sync::RwLock;

    use super::UserStore;
    use crate::store::StoreError;

    /// bcrypt's minimum work factor, to keep test signups fast.
    const TEST_COST: u32 = 4;

    /// In-process [`UserStore`] for tests.
    #[derive(Debug, Default)]
    pub struct MemoryUserStore {
        users: RwLock<Vec<User>>,
    }

    impl MemoryUserStore {
        pub async fn count(&self) -> usize {
            self.users.read().await.len()
        }

        pub async fn find_by_email(&self, email: &str) -> Option<User> {
            self.users
                .read()
                .await
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), StoreError> {
            let hashed_password = hash_password_with_cost(password, TEST_COST)
                .map_err(|e| StoreError::Internal(e.error))?;

            let mut users = self.users.write().await;
            if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
                return Err(StoreError::DuplicateEmail);
            }
            let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
            users.push(User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                hashed_password,
                created: Utc::now(),
            });
            Ok(())
        }

        async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError> {
            let Some(user) = self.find_by_email(email).await else {
                return Err(StoreError::InvalidCredentials);
            };

            let ok = verify_password(password, &user.hashed_password)
                .map_err(|e| StoreError::Internal(e.error))?;
            if !ok {
                return Err(StoreError::InvalidCredentials);
            }
            Ok(user.id)
        }

        async fn exists(&self, id: i64) -> Result<bool, StoreError> {
            Ok(self.users.read().await.iter().any(|u| u.id == id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_authenticate() {
        let store = MemoryUserStore::default();
        store
            .insert("Alice", "alice@example.com", "pa$$word")
            .await
            .unwrap();

        let id = store
            .authenticate("alice@example.com", "pa$$word")
            .await
            .unwrap();
        assert!(store.exists(id).await.unwrap());

        let user = store.find_by_email("alice@example.com").await.unwrap();
        assert_ne!(user.hashed_password, "pa$$word");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_without_new_row() {
        let store = MemoryUserStore::default();
        store.insert("Alice", "alice@example.com", "pa$$word").await.unwrap();

        let err = store
            .insert("Other", "alice@example.com", "different1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count().await, 1);

        store.insert("Bob", "bob@example.com", "pa$$word").await.unwrap();
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let store = MemoryUserStore::default();
        store.insert("Alice", "alice@example.com", "pa$$word").await.unwrap();

        assert!(matches!(
            store.authenticate("alice@example.com", "wrong-pass").await,
            Err(StoreError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate("nobody@example.com", "pa$$word").await,
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_email_matching_ignores_case() {
        let store = MemoryUserStore::default();
        store.insert("Alice", "Alice@Example.com", "pa$$word").await.unwrap();

        let err = store
            .insert("Alice", "alice@example.com", "pa$$word")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.count().await, 1);

        assert!(store.authenticate("ALICE@example.COM", "pa$$word").await.is_ok());
    }

    #[tokio::test]
    async fn test_exists_for_unknown_id() {
        let store = MemoryUserStore::default();
        assert!(!store.exists(42).await.unwrap());
    }
}
