use std::sync::Arc;

use snippetbox_db::PgPool;

use crate::modules::snippets::store::{PgSnippetStore, SnippetStore};
use crate::modules::users::store::{PgUserStore, UserStore};

/// Shared handler state, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub snippets: Arc<dyn SnippetStore>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(snippets: Arc<dyn SnippetStore>, users: Arc<dyn UserStore>) -> Self {
        Self { snippets, users }
    }

    /// Postgres-backed stores sharing one pool.
    pub fn from_pool(db: PgPool) -> Self {
        Self::new(
            Arc::new(PgSnippetStore::new(db.clone())),
            Arc::new(PgUserStore::new(db)),
        )
    }
}
