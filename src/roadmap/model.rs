//! Roadmap document model.
//!
//! A [`Roadmap`] is a user-owned markdown document plus the structure
//! derived from it: ordered sections with independent completion flags,
//! and an append-only version history. Construction and mutation here are
//! pure — persistence lives in [`super::storage`].

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

use super::parser;

/// An external learning resource extracted from a markdown link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

/// A contiguous, titled slice of a roadmap's markdown with an independent
/// completion flag. Sections are addressed by their position in the
/// roadmap's `sections` sequence and are never reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapSection {
    /// `"{dayRange}: {focusArea}"`.
    pub title: String,
    /// Raw markdown slice owned by this section, heading included.
    pub content: String,
    pub day_range: String,
    pub focus_area: String,
    pub topics: Vec<String>,
    pub resources: Vec<Resource>,
    pub completed: bool,
}

/// An immutable snapshot of the full markdown content at one point in
/// time, plus the instruction that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapVersion {
    pub content: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub prompt: Option<String>,
}

/// Request payload for creating (or editing) a roadmap document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoadmap {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub markdown_content: String,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    /// Current canonical markdown — equal to the latest version's content.
    pub markdown_content: String,
    pub sections: Vec<RoadmapSection>,
    /// Append-only, oldest first.
    pub versions: Vec<RoadmapVersion>,
    pub created_at: String,
    pub last_updated: String,
}

impl Roadmap {
    /// Build a new roadmap for `owner_id`: parse the markdown into
    /// sections and seed the version history with a single entry.
    pub fn new(owner_id: &str, draft: NewRoadmap) -> Self {
        let now = Utc::now().to_rfc3339();
        let sections = parser::parse(&draft.markdown_content);
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: draft.title,
            description: draft.description,
            sections,
            versions: vec![RoadmapVersion {
                content: draft.markdown_content.clone(),
                timestamp: now.clone(),
                prompt: draft.prompt,
            }],
            markdown_content: draft.markdown_content,
            created_at: now.clone(),
            last_updated: now,
        }
    }

    /// Set the completion flag of the section at `index`.
    ///
    /// An out-of-range index is rejected with a `Validation` error; state
    /// is left untouched.
    pub fn set_section_completed(
        &mut self,
        index: usize,
        completed: bool,
    ) -> Result<(), ServiceError> {
        let len = self.sections.len();
        let section = self.sections.get_mut(index).ok_or_else(|| {
            ServiceError::Validation(format!(
                "section index {index} out of range (roadmap has {len} sections)"
            ))
        })?;
        section.completed = completed;
        self.last_updated = Utc::now().to_rfc3339();
        Ok(())
    }

    /// Append a new content version and make it current.
    ///
    /// Sections are re-derived from the new content. Completion state
    /// carries forward by day-range key: a re-parsed section whose
    /// `dayRange` matches a previously completed section starts completed;
    /// everything else starts pending.
    pub fn append_version(&mut self, content: String, prompt: Option<String>) {
        let now = Utc::now().to_rfc3339();
        self.versions.push(RoadmapVersion {
            content: content.clone(),
            timestamp: now.clone(),
            prompt,
        });
        self.markdown_content = content;

        let completed_ranges: HashSet<String> = self
            .sections
            .iter()
            .filter(|s| s.completed)
            .map(|s| s.day_range.clone())
            .collect();
        let mut sections = parser::parse(&self.markdown_content);
        for section in &mut sections {
            if completed_ranges.contains(&section.day_range) {
                section.completed = true;
            }
        }
        self.sections = sections;
        self.last_updated = now;
    }
}
