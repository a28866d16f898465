use std::sync::Arc;

use diesel::SqliteConnection;

use crate::auth::TokenKeys;
use crate::error::{internal_error, ApiError};

#[derive(Clone)]
pub struct AppState {
    pub pool: deadpool_diesel::sqlite::Pool,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(pool: deadpool_diesel::sqlite::Pool, tokens: TokenKeys) -> Self {
        Self {
            pool,
            tokens: Arc::new(tokens),
        }
    }

    /// Runs `f` on a pooled connection off the async executor. The connection
    /// goes back to the pool before this returns.
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await.map_err(internal_error)?;
        conn.interact(f).await.map_err(internal_error)?
    }
}
