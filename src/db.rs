use deadpool::managed::{HookError, HookErrorCause};
use deadpool_diesel::sqlite::{Hook, Manager, Pool};
use diesel::connection::SimpleConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

// this embeds the migrations into the application binary
// the migration path is relative to the `CARGO_MANIFEST_DIR`
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("could not build connection pool: {0}")]
    Pool(String),
    #[error("could not check out a connection: {0}")]
    Connection(String),
    #[error("migration task failed: {0}")]
    Interact(String),
    #[error("could not run migrations: {0}")]
    Migration(String),
}

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Builds the connection pool. Every new connection waits up to
/// [`BUSY_TIMEOUT_MS`] for competing writers, and file databases run in WAL
/// mode so readers never block the single writer.
pub fn build_pool(database_url: &str, max_size: usize) -> Result<Pool, SetupError> {
    let manager = Manager::new(database_url, deadpool_diesel::Runtime::Tokio1);
    Pool::builder(manager)
        .max_size(max_size)
        .post_create(Hook::async_fn(|conn, _| {
            Box::pin(async move {
                conn.interact(|conn| {
                    conn.batch_execute(&format!(
                        "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}; PRAGMA journal_mode = WAL;"
                    ))
                })
                .await
                .map_err(|err| err.to_string())
                .and_then(|applied| applied.map_err(|err| err.to_string()))
                .map_err(pragma_failed)
            })
        }))
        .build()
        .map_err(|err| SetupError::Pool(err.to_string()))
}

fn pragma_failed(message: String) -> HookError<deadpool_diesel::Error> {
    HookError::Abort(HookErrorCause::Message(message))
}

pub async fn run_migrations(pool: &Pool) -> Result<(), SetupError> {
    let conn = pool
        .get()
        .await
        .map_err(|err| SetupError::Connection(err.to_string()))?;
    let applied = conn
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|err| err.to_string())
        })
        .await
        .map_err(|err| SetupError::Interact(err.to_string()))?
        .map_err(SetupError::Migration)?;
    tracing::debug!(applied, "database migrations are up to date");
    Ok(())
}

#[cfg(test)]
pub(crate) fn memory_connection() -> diesel::SqliteConnection {
    use diesel::Connection;

    let mut conn = diesel::SqliteConnection::establish(":memory:").unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    conn
}
