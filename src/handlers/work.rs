use super::{created, deleted, success};
use crate::error::Result;
use crate::models::{
    AuthUser, CreateWorkRequest, FolderScope, MoveToRequest, RenameWorkRequest, UpdateWorkRequest, WorkSummary,
};
use crate::services::WorkService;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WorkQuery {
    pub folder_id: Option<Uuid>,
    /// Only works filed at the top level. Ignored when `folder_id` is set.
    #[serde(default)]
    pub top_level: bool,
}

impl WorkQuery {
    pub fn scope(&self) -> FolderScope {
        match (self.folder_id, self.top_level) {
            (Some(id), _) => FolderScope::Folder(id),
            (None, true) => FolderScope::Root,
            (None, false) => FolderScope::All,
        }
    }
}

/// Listing cards with plain-text previews, newest first.
pub async fn list_works(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WorkQuery>,
) -> Result<Json<Value>> {
    let works = work_service.works(user.id, query.scope()).await?;
    let preview_length = work_service.preview_length();
    let cards: Vec<WorkSummary> = works
        .iter()
        .map(|work| WorkSummary::from_work(work, preview_length))
        .collect();
    Ok(success(cards))
}

pub async fn get_work(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    Path(work_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let work = work_service.get_work(user.id, work_id).await?;
    Ok(success(work))
}

pub async fn create_work(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    JsonExtractor(request): JsonExtractor<CreateWorkRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let work = work_service.create_work(user.id, request).await?;
    Ok(created(work))
}

pub async fn update_work(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    Path(work_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<UpdateWorkRequest>,
) -> Result<Json<Value>> {
    let work = work_service.update_work(user.id, work_id, request).await?;
    Ok(success(work))
}

pub async fn rename_work(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    Path(work_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<RenameWorkRequest>,
) -> Result<Json<Value>> {
    let work = work_service.rename_work(user.id, work_id, request).await?;
    Ok(success(work))
}

pub async fn move_work(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    Path(work_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<MoveToRequest>,
) -> Result<Json<Value>> {
    let work = work_service.move_work(user.id, work_id, request.destination_id).await?;
    Ok(success(work))
}

pub async fn delete_work(
    State(work_service): State<Arc<WorkService>>,
    Extension(user): Extension<AuthUser>,
    Path(work_id): Path<Uuid>,
) -> Result<Json<Value>> {
    work_service.delete_work(user.id, work_id).await?;
    Ok(deleted("Work deleted"))
}
