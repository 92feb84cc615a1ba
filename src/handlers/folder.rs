use super::{created, deleted, success};
use crate::error::Result;
use crate::models::{AuthUser, CreateFolderRequest, MoveToRequest, RenameFolderRequest};
use crate::services::FolderService;
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
pub struct FolderQuery {
    /// Restricts the listing to direct children. Omitted means every folder.
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub top_level: bool,
}

#[derive(Debug, Deserialize)]
pub struct DestinationQuery {
    pub exclude: Option<Uuid>,
}

pub async fn list_folders(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Value>> {
    let folders = if query.top_level || query.parent_id.is_some() {
        folder_service.child_folders(user.id, query.parent_id).await?
    } else {
        folder_service.folders(user.id).await?
    };
    Ok(success(folders))
}

pub async fn get_folder_tree(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>> {
    let tree = folder_service.folder_tree(user.id).await?;
    Ok(success(tree))
}

pub async fn get_folder(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let folder = folder_service.get_folder(user.id, folder_id).await?;
    Ok(success(folder))
}

pub async fn get_folder_breadcrumbs(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let path = folder_service.breadcrumbs(user.id, folder_id).await?;
    Ok(success(path))
}

pub async fn get_move_destinations(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DestinationQuery>,
) -> Result<Json<Value>> {
    let rows = folder_service.move_destinations(user.id, query.exclude).await?;
    Ok(success(rows))
}

pub async fn create_folder(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    JsonExtractor(request): JsonExtractor<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let folder = folder_service.create_folder(user.id, request).await?;
    Ok(created(folder))
}

pub async fn rename_folder(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Path(folder_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<RenameFolderRequest>,
) -> Result<Json<Value>> {
    let folder = folder_service.rename_folder(user.id, folder_id, request).await?;
    Ok(success(folder))
}

pub async fn move_folder(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Path(folder_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<MoveToRequest>,
) -> Result<Json<Value>> {
    let folder = folder_service
        .move_folder(user.id, folder_id, request.destination_id)
        .await?;
    Ok(success(folder))
}

pub async fn delete_folder(
    State(folder_service): State<Arc<FolderService>>,
    Extension(user): Extension<AuthUser>,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<Value>> {
    folder_service.delete_folder(user.id, folder_id).await?;
    Ok(deleted("Folder deleted"))
}
