use crate::error::{AppError, Result};
use crate::models::{
    build_node_tree, node_depth, CreateNodeRequest, CreateQTreeRequest, FolderScope, NodeParent, QTreeNode, QTreeNodeCard,
    QTreeRoot, QTreeView, RenameQTreeRequest, RichTextDocument, UpdateQuestionRequest, DEFAULT_PREVIEW_LENGTH,
    MAX_TREE_DEPTH,
};
use crate::repositories::{FolderStore, QTreeStore, QuestionChanges};
use crate::services::cache::CollectionCache;
use crate::services::events::{ChangeAction, EntityKind, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

type ScopeKey = (Uuid, FolderScope);

/// Q-tree roots and nodes.
///
/// Root listings are cached per scope and patched after mutations. Nodes are
/// always read through to the store since the tree view is rebuilt from a
/// full fetch anyway.
pub struct QTreeService {
    store: Arc<dyn QTreeStore>,
    folders: Arc<dyn FolderStore>,
    cache: CollectionCache<ScopeKey, QTreeRoot>,
    events: Option<EventBus>,
    preview_length: usize,
}

impl QTreeService {
    pub fn new(store: Arc<dyn QTreeStore>, folders: Arc<dyn FolderStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            folders,
            cache: CollectionCache::new(cache_ttl),
            events: None,
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }

    pub fn preview_length(&self) -> usize {
        self.preview_length
    }

    pub async fn fetch_qtrees(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<QTreeRoot>> {
        let roots = self.store.list_roots(user_id, scope).await?;
        self.cache.replace((user_id, scope), roots.clone()).await;
        Ok(roots)
    }

    pub async fn qtrees(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<QTreeRoot>> {
        match self.cache.fresh(&(user_id, scope)).await {
            Some(roots) => Ok(roots),
            None => self.fetch_qtrees(user_id, scope).await,
        }
    }

    pub async fn get_root(&self, user_id: Uuid, root_id: Uuid) -> Result<QTreeRoot> {
        self.store
            .find_root(user_id, root_id)
            .await?
            .ok_or_else(|| AppError::not_found_redirect("Q-tree", "/"))
    }

    pub async fn fetch_nodes(&self, user_id: Uuid, root_id: Uuid) -> Result<Vec<QTreeNode>> {
        Ok(self.store.list_nodes(user_id, root_id).await?)
    }

    /// A node addressed through its root. A node of another tree is reported
    /// as missing, with a redirect back to the requested tree.
    pub async fn get_node(&self, user_id: Uuid, root_id: Uuid, node_id: Uuid) -> Result<QTreeNode> {
        self.store
            .find_node(user_id, node_id)
            .await?
            .filter(|node| node.qtree_root_id == root_id)
            .ok_or_else(|| AppError::not_found_redirect("Node", format!("/qtree/{}", root_id)))
    }

    pub async fn node_tree(&self, user_id: Uuid, root_id: Uuid) -> Result<QTreeView> {
        let root = self.get_root(user_id, root_id).await?;
        let nodes = self.fetch_nodes(user_id, root_id).await?;

        let preview_length = self.preview_length;
        let to_card = |node: QTreeNode| QTreeNodeCard::from_node(&node, preview_length);
        let forest = build_node_tree(root_id, &nodes)
            .into_iter()
            .map(|tree| tree.map(&to_card))
            .collect();

        Ok(QTreeView {
            preview: root.answer.plain_text(preview_length),
            root,
            nodes: forest,
        })
    }

    pub async fn create_root(&self, user_id: Uuid, request: CreateQTreeRequest) -> Result<QTreeRoot> {
        request.validate()?;
        if let Some(folder_id) = request.folder_id {
            if self.folders.find_folder(user_id, folder_id).await?.is_none() {
                return Err(AppError::not_found("Folder"));
            }
        }

        let root = self
            .store
            .insert_root(user_id, request.question.trim(), request.folder_id, &RichTextDocument::default())
            .await?;
        info!(user_id = %user_id, root_id = %root.id, "Q-tree created");

        self.cache.invalidate_where(|(owner, _)| *owner == user_id).await;
        self.publish(user_id, EntityKind::QTreeRoot, ChangeAction::Created, root.id);
        Ok(root)
    }

    /// Adds a node directly below the root or below another node of the
    /// same tree.
    pub async fn create_node(&self, user_id: Uuid, root_id: Uuid, request: CreateNodeRequest) -> Result<QTreeNode> {
        request.validate()?;
        let parent = request
            .parent(root_id)
            .ok_or_else(|| AppError::Validation("parent_root_id must reference this q-tree".to_string()))?;

        self.get_root(user_id, root_id).await?;
        if let NodeParent::Node(parent_id) = parent {
            let parent_node = self
                .store
                .find_node(user_id, parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("Parent node"))?;
            if parent_node.qtree_root_id != root_id {
                return Err(AppError::Validation(
                    "parent node belongs to another q-tree".to_string(),
                ));
            }

            let nodes = self.fetch_nodes(user_id, root_id).await?;
            if node_depth(&nodes, parent_id) >= MAX_TREE_DEPTH {
                return Err(AppError::Validation(format!(
                    "Questions cannot be nested more than {} levels deep",
                    MAX_TREE_DEPTH
                )));
            }
        }

        let node = self
            .store
            .insert_node(user_id, root_id, parent, request.question.trim(), &RichTextDocument::default())
            .await?;
        info!(user_id = %user_id, root_id = %root_id, node_id = %node.id, "Node created");

        self.publish(user_id, EntityKind::QTreeNode, ChangeAction::Created, node.id);
        Ok(node)
    }

    pub async fn update_root(&self, user_id: Uuid, root_id: Uuid, request: UpdateQuestionRequest) -> Result<QTreeRoot> {
        request.validate()?;

        let changes = QuestionChanges {
            question: request.question.map(|q| q.trim().to_string()),
            answer: request.answer,
        };
        let root = self
            .store
            .update_root(user_id, root_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Q-tree"))?;
        debug!(user_id = %user_id, root_id = %root_id, "Q-tree updated");

        self.replace_cached(&root).await;
        self.publish(user_id, EntityKind::QTreeRoot, ChangeAction::Updated, root_id);
        Ok(root)
    }

    pub async fn update_node(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        node_id: Uuid,
        request: UpdateQuestionRequest,
    ) -> Result<QTreeNode> {
        request.validate()?;
        self.get_node(user_id, root_id, node_id).await?;

        let changes = QuestionChanges {
            question: request.question.map(|q| q.trim().to_string()),
            answer: request.answer,
        };
        let node = self
            .store
            .update_node(user_id, node_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Node"))?;
        debug!(user_id = %user_id, node_id = %node_id, "Node updated");

        self.publish(user_id, EntityKind::QTreeNode, ChangeAction::Updated, node_id);
        Ok(node)
    }

    pub async fn rename_root(&self, user_id: Uuid, root_id: Uuid, request: RenameQTreeRequest) -> Result<QTreeRoot> {
        request.validate()?;

        let changes = QuestionChanges {
            question: Some(request.question.trim().to_string()),
            answer: None,
        };
        let root = self
            .store
            .update_root(user_id, root_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Q-tree"))?;
        info!(user_id = %user_id, root_id = %root_id, "Q-tree renamed");

        self.replace_cached(&root).await;
        self.publish(user_id, EntityKind::QTreeRoot, ChangeAction::Renamed, root_id);
        Ok(root)
    }

    pub async fn move_qtree(&self, user_id: Uuid, root_id: Uuid, destination_id: Option<Uuid>) -> Result<QTreeRoot> {
        if let Some(destination) = destination_id {
            if self.folders.find_folder(user_id, destination).await?.is_none() {
                return Err(AppError::not_found("Destination folder"));
            }
        }

        let root = self
            .store
            .set_root_folder(user_id, root_id, destination_id)
            .await?
            .ok_or_else(|| AppError::not_found("Q-tree"))?;
        info!(user_id = %user_id, root_id = %root_id, destination = ?destination_id, "Q-tree moved");

        let mut stale = Vec::new();
        self.cache
            .patch_where(
                |(owner, _)| *owner == user_id,
                |key, roots| {
                    if key.1.contains(root.folder_id) {
                        match roots.iter().position(|r| r.id == root.id) {
                            Some(index) => roots[index] = root.clone(),
                            None => stale.push(*key),
                        }
                    } else {
                        roots.retain(|r| r.id != root.id);
                    }
                },
            )
            .await;
        for key in stale {
            self.cache.invalidate(&key).await;
        }

        self.publish(user_id, EntityKind::QTreeRoot, ChangeAction::Moved, root_id);
        Ok(root)
    }

    /// Deletes a root together with all of its nodes.
    pub async fn delete_root(&self, user_id: Uuid, root_id: Uuid) -> Result<()> {
        if !self.store.delete_root(user_id, root_id).await? {
            return Err(AppError::not_found("Q-tree"));
        }
        info!(user_id = %user_id, root_id = %root_id, "Q-tree deleted");

        self.cache
            .patch_where(
                |(owner, _)| *owner == user_id,
                |_, roots| roots.retain(|r| r.id != root_id),
            )
            .await;
        self.publish(user_id, EntityKind::QTreeRoot, ChangeAction::Deleted, root_id);
        Ok(())
    }

    /// Deletes a node and its whole subtree.
    pub async fn delete_node(&self, user_id: Uuid, root_id: Uuid, node_id: Uuid) -> Result<()> {
        self.get_node(user_id, root_id, node_id).await?;
        if !self.store.delete_node(user_id, node_id).await? {
            return Err(AppError::not_found("Node"));
        }
        info!(user_id = %user_id, root_id = %root_id, node_id = %node_id, "Node deleted");

        self.publish(user_id, EntityKind::QTreeNode, ChangeAction::Deleted, node_id);
        Ok(())
    }

    pub async fn invalidate_user(&self, user_id: Uuid) {
        self.cache.invalidate_where(|(owner, _)| *owner == user_id).await;
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_where(|_| true).await;
    }

    async fn replace_cached(&self, root: &QTreeRoot) {
        self.cache
            .patch_where(
                |(owner, _)| *owner == root.user_id,
                |_, roots| {
                    if let Some(index) = roots.iter().position(|r| r.id == root.id) {
                        roots[index] = root.clone();
                        roots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                    }
                },
            )
            .await;
    }

    fn publish(&self, user_id: Uuid, entity: EntityKind, action: ChangeAction, entity_id: Uuid) {
        if let Some(events) = &self.events {
            events.publish(user_id, entity, action, entity_id);
        }
    }
}
