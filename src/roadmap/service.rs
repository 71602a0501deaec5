//! Orchestration layer behind the roadmap HTTP boundary.
//!
//! Every operation resolves the caller's identity first, then delegates
//! to the store; responses go out through the presentation mapping in
//! [`super::view`].

use sqlx::SqlitePool;
use tracing::info;

use crate::config::PresentationConfig;
use crate::error::ServiceError;
use crate::identity::Resolver;

use super::model::{NewRoadmap, Roadmap};
use super::storage::RoadmapStorage;
use super::view::{self, RoadmapSummary, RoadmapView};

#[derive(Clone)]
pub struct RoadmapService {
    storage: RoadmapStorage,
    resolver: Resolver,
    presentation: PresentationConfig,
}

impl RoadmapService {
    pub fn new(pool: SqlitePool, resolver: Resolver, presentation: PresentationConfig) -> Self {
        Self {
            storage: RoadmapStorage::new(pool),
            resolver,
            presentation,
        }
    }

    /// Build a roadmap document from a generation result and persist it.
    /// Returns the new roadmap's id.
    pub async fn create_roadmap(
        &self,
        authorization: Option<&str>,
        draft: NewRoadmap,
    ) -> Result<String, ServiceError> {
        let owner = self.resolver.resolve(authorization).await?;
        if draft.title.trim().is_empty() {
            return Err(ServiceError::Validation("title must not be empty".to_string()));
        }
        if draft.markdown_content.is_empty() {
            return Err(ServiceError::Validation(
                "markdownContent must not be empty".to_string(),
            ));
        }

        let roadmap = Roadmap::new(&owner.id, draft);
        let id = self.storage.create(&roadmap).await?;
        info!(
            owner = %owner.id,
            roadmap = %id,
            sections = roadmap.sections.len(),
            "roadmap created"
        );
        Ok(id)
    }

    /// The caller's roadmaps as listing summaries, newest activity first.
    pub async fn list_roadmaps(
        &self,
        authorization: Option<&str>,
    ) -> Result<Vec<RoadmapSummary>, ServiceError> {
        let owner = self.resolver.resolve(authorization).await?;
        let roadmaps = self.storage.list_by_owner(&owner.id).await?;
        Ok(roadmaps
            .iter()
            .map(|r| view::summarize(r, &self.presentation))
            .collect())
    }

    /// One roadmap in full, including sections and version history.
    pub async fn get_roadmap(
        &self,
        authorization: Option<&str>,
        id: &str,
    ) -> Result<RoadmapView, ServiceError> {
        let owner = self.resolver.resolve(authorization).await?;
        let roadmap = self
            .storage
            .get(&owner.id, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Roadmap not found".to_string()))?;
        Ok(view::full_view(roadmap, &self.presentation))
    }

    /// Toggle one section's completion flag.
    pub async fn patch_section(
        &self,
        authorization: Option<&str>,
        id: &str,
        section_index: usize,
        completed: bool,
    ) -> Result<(), ServiceError> {
        let owner = self.resolver.resolve(authorization).await?;
        self.storage
            .update_section_completion(&owner.id, id, section_index, completed)
            .await?;
        info!(
            owner = %owner.id,
            roadmap = %id,
            section = section_index,
            completed,
            "section completion updated"
        );
        Ok(())
    }

    /// Submit an edit: append an immutable content version and re-derive
    /// the section structure from the new markdown.
    pub async fn submit_edit(
        &self,
        authorization: Option<&str>,
        id: &str,
        content: &str,
        prompt: Option<&str>,
    ) -> Result<(), ServiceError> {
        let owner = self.resolver.resolve(authorization).await?;
        if content.is_empty() {
            return Err(ServiceError::Validation(
                "markdownContent must not be empty".to_string(),
            ));
        }
        self.storage
            .append_version(&owner.id, id, content, prompt)
            .await?;
        info!(owner = %owner.id, roadmap = %id, "roadmap version appended");
        Ok(())
    }
}
