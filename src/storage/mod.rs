use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking request handling indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
pub(crate) async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

/// An owning identity a roadmap belongs to. The access-token hash is kept
/// in the table but never selected into this row.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct OwnerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// Process-wide persistence backend: one SQLite pool, opened explicitly at
/// startup and passed by reference into the layers that need it.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding
    /// it are logged at WARN level. Set to 0 to disable.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("roadmapd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            use sqlx::ConnectOptions as _;
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create RoadmapStorage that shares the same SQLite connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        let stmts = [
            "CREATE TABLE IF NOT EXISTS owners (
                 id TEXT PRIMARY KEY,
                 name TEXT NOT NULL,
                 email TEXT NOT NULL UNIQUE,
                 token_hash TEXT NOT NULL UNIQUE,
                 created_at TEXT NOT NULL
             )",
            "CREATE TABLE IF NOT EXISTS roadmaps (
                 id TEXT PRIMARY KEY,
                 owner_id TEXT NOT NULL REFERENCES owners(id),
                 title TEXT NOT NULL,
                 description TEXT NOT NULL DEFAULT '',
                 markdown_content TEXT NOT NULL,
                 sections TEXT NOT NULL,
                 versions TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 last_updated TEXT NOT NULL,
                 revision INTEGER NOT NULL DEFAULT 0
             )",
            // Listing is always per-owner, newest activity first.
            "CREATE INDEX IF NOT EXISTS idx_roadmaps_owner_updated
                 ON roadmaps(owner_id, last_updated DESC)",
        ];
        for stmt in stmts {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("failed to run schema migration")?;
        }
        Ok(())
    }

    // ─── Owners ─────────────────────────────────────────────────────────────

    pub async fn create_owner(
        &self,
        id: &str,
        name: &str,
        email: &str,
        token_hash: &str,
    ) -> Result<OwnerRow> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO owners (id, name, email, token_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(token_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_owner(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("owner not found after insert"))
    }

    pub async fn get_owner(&self, id: &str) -> Result<Option<OwnerRow>> {
        Ok(
            sqlx::query_as("SELECT id, name, email, created_at FROM owners WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn get_owner_by_token_hash(&self, token_hash: &str) -> Result<Option<OwnerRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT id, name, email, created_at FROM owners WHERE token_hash = ?",
            )
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?)
        })
        .await
    }
}
