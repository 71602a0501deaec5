//! Presentation mapping from canonical roadmap documents to the typed
//! records the HTTP boundary returns.
//!
//! Display metadata the document model does not carry (`language`,
//! `languageColor`, `stars`, `forks`) comes from a fixed defaults
//! configuration rather than being filled in ad hoc at the boundary.

use serde::Serialize;

use crate::config::PresentationConfig;

use super::model::{Roadmap, RoadmapSection, RoadmapVersion};

/// Listing entry: metadata only, no document body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapSummary {
    pub id: String,
    /// Stable slug derived from the title, repo-name style.
    pub name: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub language_color: String,
    pub stars: i64,
    pub forks: i64,
    pub created_at: String,
    pub last_updated: String,
}

/// Full document view: sections and version history included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapView {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub last_updated: String,
    pub markdown_content: String,
    pub sections: Vec<RoadmapSection>,
    pub versions: Vec<RoadmapVersion>,
    pub language: String,
    pub language_color: String,
}

pub fn summarize(roadmap: &Roadmap, defaults: &PresentationConfig) -> RoadmapSummary {
    RoadmapSummary {
        id: roadmap.id.clone(),
        name: title_slug(&roadmap.title),
        title: roadmap.title.clone(),
        description: roadmap.description.clone(),
        language: defaults.language.clone(),
        language_color: defaults.language_color.clone(),
        stars: defaults.stars,
        forks: defaults.forks,
        created_at: roadmap.created_at.clone(),
        last_updated: roadmap.last_updated.clone(),
    }
}

pub fn full_view(roadmap: Roadmap, defaults: &PresentationConfig) -> RoadmapView {
    RoadmapView {
        id: roadmap.id,
        owner_id: roadmap.owner_id,
        title: roadmap.title,
        description: roadmap.description,
        created_at: roadmap.created_at,
        last_updated: roadmap.last_updated,
        markdown_content: roadmap.markdown_content,
        sections: roadmap.sections,
        versions: roadmap.versions,
        language: defaults.language.clone(),
        language_color: defaults.language_color.clone(),
    }
}

/// Derive a repo-name-style slug from a free-text title: alphanumeric
/// runs joined by single hyphens, original casing preserved.
fn title_slug(title: &str) -> String {
    let parts: Vec<&str> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        "roadmap".to_string()
    } else {
        parts.join("-")
    }
}
