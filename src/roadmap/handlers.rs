//! Roadmap REST routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::roadmap::model::NewRoadmap;
use crate::roadmap::view::{RoadmapSummary, RoadmapView};
use crate::AppContext;

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

pub async fn create_roadmap(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Result<Json<NewRoadmap>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let Json(body) = body?;
    let id = ctx
        .roadmaps
        .create_roadmap(authorization(&headers), body)
        .await?;
    Ok(Json(json!({ "success": true, "roadmapId": id })))
}

pub async fn list_roadmaps(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> Result<Json<Vec<RoadmapSummary>>, ServiceError> {
    let summaries = ctx.roadmaps.list_roadmaps(authorization(&headers)).await?;
    Ok(Json(summaries))
}

pub async fn get_roadmap(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<RoadmapView>, ServiceError> {
    let view = ctx
        .roadmaps
        .get_roadmap(authorization(&headers), &id)
        .await?;
    Ok(Json(view))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSectionRequest {
    pub section_index: usize,
    pub completed: bool,
}

pub async fn patch_section(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<PatchSectionRequest>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let Json(body) = body?;
    ctx.roadmaps
        .patch_section(
            authorization(&headers),
            &id,
            body.section_index,
            body.completed,
        )
        .await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub markdown_content: String,
    pub prompt: Option<String>,
}

pub async fn submit_edit(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let Json(body) = body?;
    ctx.roadmaps
        .submit_edit(
            authorization(&headers),
            &id,
            &body.markdown_content,
            body.prompt.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "success": true })))
}
