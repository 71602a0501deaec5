//! SQLite-backed roadmap store.
//!
//! Every operation is scoped by `owner_id`; a roadmap that exists but
//! belongs to someone else is indistinguishable from one that does not
//! exist. Sections and version history are stored as JSON columns —
//! they are only ever read and written as a whole document.
//!
//! Writes use optimistic concurrency: each row carries a `revision`
//! counter and read-modify-write cycles re-check it on commit, retrying a
//! bounded number of times before giving up.

use anyhow::Context as _;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::ServiceError;
use crate::storage::with_timeout;

use super::model::Roadmap;

/// Attempts per read-modify-write cycle before reporting contention.
const MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, sqlx::FromRow)]
struct RoadmapRow {
    id: String,
    owner_id: String,
    title: String,
    description: String,
    markdown_content: String,
    sections: String,
    versions: String,
    created_at: String,
    last_updated: String,
    revision: i64,
}

impl RoadmapRow {
    fn into_roadmap(self) -> Result<Roadmap, ServiceError> {
        let sections = serde_json::from_str(&self.sections)
            .context("corrupt sections column")
            .map_err(ServiceError::Persistence)?;
        let versions = serde_json::from_str(&self.versions)
            .context("corrupt versions column")
            .map_err(ServiceError::Persistence)?;
        Ok(Roadmap {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            markdown_content: self.markdown_content,
            sections,
            versions,
            created_at: self.created_at,
            last_updated: self.last_updated,
        })
    }
}

#[derive(Clone)]
pub struct RoadmapStorage {
    pool: SqlitePool,
}

impl RoadmapStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a freshly constructed roadmap. Returns its id.
    pub async fn create(&self, roadmap: &Roadmap) -> Result<String, ServiceError> {
        sqlx::query(
            "INSERT INTO roadmaps
                 (id, owner_id, title, description, markdown_content,
                  sections, versions, created_at, last_updated, revision)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(&roadmap.id)
        .bind(&roadmap.owner_id)
        .bind(&roadmap.title)
        .bind(&roadmap.description)
        .bind(&roadmap.markdown_content)
        .bind(serde_json::to_string(&roadmap.sections)?)
        .bind(serde_json::to_string(&roadmap.versions)?)
        .bind(&roadmap.created_at)
        .bind(&roadmap.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(roadmap.id.clone())
    }

    /// All roadmaps for one owner, most recently updated first.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Roadmap>, ServiceError> {
        let rows: Vec<RoadmapRow> = with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM roadmaps WHERE owner_id = ? ORDER BY last_updated DESC",
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
        .map_err(ServiceError::Persistence)?;

        rows.into_iter().map(RoadmapRow::into_roadmap).collect()
    }

    /// Fetch one roadmap by id, scoped to its owner.
    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Option<Roadmap>, ServiceError> {
        match self.fetch_row(owner_id, id).await? {
            Some(row) => Ok(Some(row.into_roadmap()?)),
            None => Ok(None),
        }
    }

    /// Load, toggle one section's completion flag, and persist.
    ///
    /// Fails with `NotFound` when the roadmap is absent or owned by someone
    /// else, and `Validation` when the index is out of range.
    pub async fn update_section_completion(
        &self,
        owner_id: &str,
        id: &str,
        section_index: usize,
        completed: bool,
    ) -> Result<(), ServiceError> {
        for attempt in 0..MAX_WRITE_ATTEMPTS {
            let row = self
                .fetch_row(owner_id, id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Roadmap not found".to_string()))?;
            let revision = row.revision;
            let mut roadmap = row.into_roadmap()?;
            roadmap.set_section_completed(section_index, completed)?;

            if self.commit(&roadmap, revision).await? {
                return Ok(());
            }
            debug!(roadmap = %id, attempt, "revision conflict on section update, retrying");
        }
        Err(ServiceError::Persistence(anyhow::anyhow!(
            "section update lost {MAX_WRITE_ATTEMPTS} revision races, giving up"
        )))
    }

    /// Load, append a content version (re-deriving sections), and persist.
    pub async fn append_version(
        &self,
        owner_id: &str,
        id: &str,
        content: &str,
        prompt: Option<&str>,
    ) -> Result<(), ServiceError> {
        for attempt in 0..MAX_WRITE_ATTEMPTS {
            let row = self
                .fetch_row(owner_id, id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Roadmap not found".to_string()))?;
            let revision = row.revision;
            let mut roadmap = row.into_roadmap()?;
            roadmap.append_version(content.to_string(), prompt.map(str::to_string));

            if self.commit(&roadmap, revision).await? {
                return Ok(());
            }
            debug!(roadmap = %id, attempt, "revision conflict on version append, retrying");
        }
        Err(ServiceError::Persistence(anyhow::anyhow!(
            "version append lost {MAX_WRITE_ATTEMPTS} revision races, giving up"
        )))
    }

    async fn fetch_row(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<RoadmapRow>, ServiceError> {
        Ok(
            sqlx::query_as("SELECT * FROM roadmaps WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Write back the mutable document state, guarded by the revision the
    /// row was read at. Returns false when another writer got there first.
    async fn commit(&self, roadmap: &Roadmap, read_revision: i64) -> Result<bool, ServiceError> {
        let last_updated = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE roadmaps
             SET markdown_content = ?, sections = ?, versions = ?,
                 last_updated = ?, revision = revision + 1
             WHERE id = ? AND owner_id = ? AND revision = ?",
        )
        .bind(&roadmap.markdown_content)
        .bind(serde_json::to_string(&roadmap.sections)?)
        .bind(serde_json::to_string(&roadmap.versions)?)
        .bind(&last_updated)
        .bind(&roadmap.id)
        .bind(&roadmap.owner_id)
        .bind(read_revision)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
