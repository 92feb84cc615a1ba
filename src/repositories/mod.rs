//! Table access against the remote data service.
//!
//! Every query is scoped by the owner's `user_id`, mirroring the access
//! policy the hosted service enforces on its side. Deleting a row relies on
//! the service's referential behavior for descendants; nothing here detaches
//! or reparents children.

pub mod folder;
pub mod memory;
pub mod qtree;
pub mod work;

pub use folder::PgFolderRepository;
pub use memory::MemoryStore;
pub use qtree::PgQTreeRepository;
pub use work::PgWorkRepository;

use crate::models::{Folder, FolderScope, NodeParent, QTreeNode, QTreeRoot, RichTextDocument, Work};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Partial update of a work. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct WorkChanges {
    pub title: Option<String>,
    pub content: Option<RichTextDocument>,
}

/// Partial update of a q-tree root or node.
#[derive(Debug, Clone, Default)]
pub struct QuestionChanges {
    pub question: Option<String>,
    pub answer: Option<RichTextDocument>,
}

#[async_trait]
pub trait FolderStore: Send + Sync {
    /// All folders of the user, ordered by name.
    async fn list_folders(&self, user_id: Uuid) -> Result<Vec<Folder>>;
    async fn find_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<Option<Folder>>;
    async fn insert_folder(&self, user_id: Uuid, name: &str, parent_id: Option<Uuid>) -> Result<Folder>;
    async fn rename_folder(&self, user_id: Uuid, folder_id: Uuid, name: &str) -> Result<Option<Folder>>;
    async fn set_folder_parent(
        &self,
        user_id: Uuid,
        folder_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Folder>>;
    async fn delete_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait WorkStore: Send + Sync {
    /// Works in `scope`, most recently updated first.
    async fn list_works(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<Work>>;
    async fn find_work(&self, user_id: Uuid, work_id: Uuid) -> Result<Option<Work>>;
    async fn insert_work(
        &self,
        user_id: Uuid,
        title: &str,
        folder_id: Option<Uuid>,
        content: &RichTextDocument,
    ) -> Result<Work>;
    async fn update_work(&self, user_id: Uuid, work_id: Uuid, changes: WorkChanges) -> Result<Option<Work>>;
    async fn set_work_folder(&self, user_id: Uuid, work_id: Uuid, folder_id: Option<Uuid>) -> Result<Option<Work>>;
    async fn delete_work(&self, user_id: Uuid, work_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait QTreeStore: Send + Sync {
    /// Roots in `scope`, most recently updated first.
    async fn list_roots(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<QTreeRoot>>;
    async fn find_root(&self, user_id: Uuid, root_id: Uuid) -> Result<Option<QTreeRoot>>;
    async fn insert_root(
        &self,
        user_id: Uuid,
        question: &str,
        folder_id: Option<Uuid>,
        answer: &RichTextDocument,
    ) -> Result<QTreeRoot>;
    async fn update_root(&self, user_id: Uuid, root_id: Uuid, changes: QuestionChanges) -> Result<Option<QTreeRoot>>;
    async fn set_root_folder(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> Result<Option<QTreeRoot>>;
    async fn delete_root(&self, user_id: Uuid, root_id: Uuid) -> Result<bool>;

    /// Every node of one tree, in creation order.
    async fn list_nodes(&self, user_id: Uuid, root_id: Uuid) -> Result<Vec<QTreeNode>>;
    async fn find_node(&self, user_id: Uuid, node_id: Uuid) -> Result<Option<QTreeNode>>;
    async fn insert_node(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        parent: NodeParent,
        question: &str,
        answer: &RichTextDocument,
    ) -> Result<QTreeNode>;
    async fn update_node(&self, user_id: Uuid, node_id: Uuid, changes: QuestionChanges) -> Result<Option<QTreeNode>>;
    async fn delete_node(&self, user_id: Uuid, node_id: Uuid) -> Result<bool>;
}

/// Parent columns of a node row for `parent`.
pub(crate) fn parent_columns(root_id: Uuid, parent: NodeParent) -> (Option<Uuid>, Option<Uuid>) {
    match parent {
        NodeParent::Root => (Some(root_id), None),
        NodeParent::Node(node_id) => (None, Some(node_id)),
    }
}
