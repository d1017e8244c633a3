//! SQLite-backed user registry for the Folio bot.
//!
//! An append-only set of every `userId` seen at least once. Recording is
//! idempotent; the session layer calls it on each session start and never
//! reads it back — the table exists for operators, not for control flow.

use async_trait::async_trait;
use folio_core::{FolioError, FolioResult, UserId};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// The user registry collaborator.
#[async_trait]
pub trait UserRegistry: Send + Sync {
    /// Records that `user` has been seen. Idempotent.
    async fn record_user(&self, user: UserId) -> FolioResult<()>;
}

/// [`UserRegistry`] backed by a single-table SQLite database.
///
/// Connections are opened per call on the blocking thread pool; the write
/// volume (one insert per `/photos` command) does not justify pooling.
#[derive(Debug, Clone)]
pub struct SqliteUserRegistry {
    db_path: PathBuf,
}

impl SqliteUserRegistry {
    /// Opens (and if needed creates) the registry database at `db_path`.
    pub async fn open(db_path: impl AsRef<Path>) -> FolioResult<Self> {
        let registry = Self {
            db_path: db_path.as_ref().to_path_buf(),
        };
        registry
            .with_connection(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS users (user INTEGER PRIMARY KEY)",
                    [],
                )?;
                Ok(())
            })
            .await?;
        Ok(registry)
    }

    /// Number of distinct users ever recorded.
    pub async fn user_count(&self) -> FolioResult<u64> {
        self.with_connection(|conn| {
            let count: u64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
    }

    async fn with_connection<T, F>(&self, func: F) -> FolioResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)
                .map_err(|e| FolioError::Registry(format!("open {}: {e}", db_path.display())))?;
            func(&conn).map_err(|e| FolioError::Registry(e.to_string()))
        })
        .await
        .map_err(|e| FolioError::Registry(format!("registry task failed: {e}")))?
    }
}

#[async_trait]
impl UserRegistry for SqliteUserRegistry {
    async fn record_user(&self, user: UserId) -> FolioResult<()> {
        let inserted = self
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO users (user) VALUES (?1)",
                    params![user.0],
                )
            })
            .await?;
        if inserted > 0 {
            tracing::info!(%user, "new user registered");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn recording_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let registry = SqliteUserRegistry::open(tmp.path().join("users.db"))
            .await
            .unwrap();

        registry.record_user(UserId(42)).await.unwrap();
        registry.record_user(UserId(42)).await.unwrap();
        registry.record_user(UserId(7)).await.unwrap();

        assert_eq!(registry.user_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn registry_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users.db");

        {
            let registry = SqliteUserRegistry::open(&path).await.unwrap();
            registry.record_user(UserId(1)).await.unwrap();
        }

        let registry = SqliteUserRegistry::open(&path).await.unwrap();
        assert_eq!(registry.user_count().await.unwrap(), 1);
    }
}
