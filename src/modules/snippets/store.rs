use async_trait::async_trait;
use snippetbox_models::Snippet;
use sqlx::PgPool;
use tracing::instrument;

use crate::store::StoreError;

/// Persistence for snippets.
///
/// Reads only ever return snippets whose expiry is still in the future.
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Inserts a snippet expiring `expires_days` from now and returns its id.
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, StoreError>;

    /// Fetches one unexpired snippet, or [`StoreError::NoRecord`].
    async fn get(&self, id: i64) -> Result<Snippet, StoreError>;

    /// The ten most recently created unexpired snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>, StoreError>;
}

#[derive(Clone, Debug)]
pub struct PgSnippetStore {
    db: PgPool,
}

impl PgSnippetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    #[instrument(skip(self, content))]
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
    ) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO snippets (title, content, created, expires)
             VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
             RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(&self.db)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires
             FROM snippets
             WHERE expires > NOW() AND id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NoRecord)
    }

    #[instrument(skip(self))]
    async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let snippets = sqlx::query_as::<_, Snippet>(
            "SELECT id, title, content, created, expires
             FROM snippets
             WHERE expires > NOW()
             ORDER BY id DESC
             LIMIT 10",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(snippets)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemorySnippetStore;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use snippetbox_models::Snippet;
    use tokio::sync::RwLock;

    use super::SnippetStore;
    use crate::store::StoreError;

    /// In-process [`SnippetStore`] for tests.
    #[derive(Debug, Default)]
    pub struct MemorySnippetStore {
        snippets: RwLock<Vec<Snippet>>,
    }

    impl MemorySnippetStore {
        /// Stores `snippet` as-is, keeping its id and timestamps. Lets tests
        /// plant already-expired rows.
        pub async fn seed(&self, snippet: Snippet) {
            self.snippets.write().await.push(snippet);
        }

        pub async fn count(&self) -> usize {
            self.snippets.read().await.len()
        }
    }

    #[async_trait]
    impl SnippetStore for MemorySnippetStore {
        async fn insert(
            &self,
            title: &str,
            content: &str,
            expires_days: i32,
        ) -> Result<i64, StoreError> {
            let mut snippets = self.snippets.write().await;
            let id = snippets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
            let created = Utc::now();
            snippets.push(Snippet {
                id,
                title: title.to_string(),
                content: content.to_string(),
                created,
                expires: created + Duration::days(i64::from(expires_days)),
            });
            Ok(id)
        }

        async fn get(&self, id: i64) -> Result<Snippet, StoreError> {
            let now = Utc::now();
            self.snippets
                .read()
                .await
                .iter()
                .find(|s| s.id == id && s.expires > now)
                .cloned()
                .ok_or(StoreError::NoRecord)
        }

        async fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
            let now = Utc::now();
            let mut live: Vec<Snippet> = self
                .snippets
                .read()
                .await
                .iter()
                .filter(|s| s.expires > now)
                .cloned()
                .collect();
            live.sort_by(|a, b| b.id.cmp(&a.id));
            live.truncate(10);
            Ok(live)
        }
    }
}
