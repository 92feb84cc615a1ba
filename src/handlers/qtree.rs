use super::{created, deleted, success};
use crate::error::Result;
use crate::handlers::work::WorkQuery;
use crate::models::{
    AuthUser, CreateNodeRequest, CreateQTreeRequest, MoveToRequest, QTreeSummary, RenameQTreeRequest,
    UpdateQuestionRequest,
};
use crate::services::QTreeService;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_qtrees(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WorkQuery>,
) -> Result<Json<Value>> {
    let roots = qtree_service.qtrees(user.id, query.scope()).await?;
    let preview_length = qtree_service.preview_length();
    let cards: Vec<QTreeSummary> = roots
        .iter()
        .map(|root| QTreeSummary::from_root(root, preview_length))
        .collect();
    Ok(success(cards))
}

pub async fn get_qtree(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let root = qtree_service.get_root(user.id, root_id).await?;
    Ok(success(root))
}

/// The rendered tree: root, its preview and the nested node cards.
pub async fn get_qtree_view(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let view = qtree_service.node_tree(user.id, root_id).await?;
    Ok(success(view))
}

pub async fn create_qtree(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    JsonExtractor(request): JsonExtractor<CreateQTreeRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let root = qtree_service.create_root(user.id, request).await?;
    Ok(created(root))
}

pub async fn update_qtree(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<UpdateQuestionRequest>,
) -> Result<Json<Value>> {
    let root = qtree_service.update_root(user.id, root_id, request).await?;
    Ok(success(root))
}

pub async fn rename_qtree(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<RenameQTreeRequest>,
) -> Result<Json<Value>> {
    let root = qtree_service.rename_root(user.id, root_id, request).await?;
    Ok(success(root))
}

pub async fn move_qtree(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<MoveToRequest>,
) -> Result<Json<Value>> {
    let root = qtree_service
        .move_qtree(user.id, root_id, request.destination_id)
        .await?;
    Ok(success(root))
}

pub async fn delete_qtree(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
) -> Result<Json<Value>> {
    qtree_service.delete_root(user.id, root_id).await?;
    Ok(deleted("Q-tree deleted"))
}

pub async fn create_node(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path(root_id): Path<Uuid>,
    JsonExtractor(request): JsonExtractor<CreateNodeRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let node = qtree_service.create_node(user.id, root_id, request).await?;
    Ok(created(node))
}

pub async fn get_node(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path((root_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>> {
    let node = qtree_service.get_node(user.id, root_id, node_id).await?;
    Ok(success(node))
}

pub async fn update_node(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path((root_id, node_id)): Path<(Uuid, Uuid)>,
    JsonExtractor(request): JsonExtractor<UpdateQuestionRequest>,
) -> Result<Json<Value>> {
    let node = qtree_service.update_node(user.id, root_id, node_id, request).await?;
    Ok(success(node))
}

pub async fn delete_node(
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Path((root_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>> {
    qtree_service.delete_node(user.id, root_id, node_id).await?;
    Ok(deleted("Node deleted"))
}
