//! In-process stand-in for the remote data service.
//!
//! Keeps the four tables in memory with the same owner scoping, ordering and
//! cascading deletes as the hosted schema in `migrations/`. Used by tests and
//! by `DATA_BACKEND=memory` local runs.

use super::{parent_columns, FolderStore, QTreeStore, QuestionChanges, WorkChanges, WorkStore};
use crate::models::{
    excluded_destinations, Folder, FolderScope, NodeParent, QTreeNode, QTreeRoot, RichTextDocument, Work,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    folders: Vec<Folder>,
    works: Vec<Work>,
    qtree_roots: Vec<QTreeRoot>,
    qtree_nodes: Vec<QTreeNode>,
}

impl Tables {
    fn remove_folders(&mut self, ids: &HashSet<Uuid>) {
        self.folders.retain(|f| !ids.contains(&f.id));
        self.works
            .retain(|w| !w.folder_id.is_some_and(|id| ids.contains(&id)));

        let doomed_roots: HashSet<Uuid> = self
            .qtree_roots
            .iter()
            .filter(|r| r.folder_id.is_some_and(|id| ids.contains(&id)))
            .map(|r| r.id)
            .collect();
        self.remove_roots(&doomed_roots);
    }

    fn remove_roots(&mut self, ids: &HashSet<Uuid>) {
        self.qtree_roots.retain(|r| !ids.contains(&r.id));
        self.qtree_nodes.retain(|n| !ids.contains(&n.qtree_root_id));
    }

    fn remove_node_subtree(&mut self, node_id: Uuid) {
        let mut doomed = HashSet::from([node_id]);
        loop {
            let before = doomed.len();
            for node in &self.qtree_nodes {
                if node.parent_node_id.is_some_and(|parent| doomed.contains(&parent)) {
                    doomed.insert(node.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        self.qtree_nodes.retain(|n| !doomed.contains(&n.id));
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails as an unreachable service would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("data service unavailable"));
        }
        Ok(())
    }
}

fn sorted_by_recency<T, F>(mut rows: Vec<T>, updated_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by_key(|row| std::cmp::Reverse(updated_at(row)));
    rows
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn list_folders(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut folders: Vec<Folder> = tables.folders.iter().filter(|f| f.user_id == user_id).cloned().collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn find_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<Option<Folder>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .folders
            .iter()
            .find(|f| f.id == folder_id && f.user_id == user_id)
            .cloned())
    }

    async fn insert_folder(&self, user_id: Uuid, name: &str, parent_id: Option<Uuid>) -> Result<Folder> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if let Some(parent) = parent_id {
            if !tables.folders.iter().any(|f| f.id == parent) {
                return Err(anyhow!("insert violates foreign key folders.parent_id"));
            }
        }

        let now = Utc::now();
        let folder = Folder {
            id: Uuid::new_v4(),
            user_id,
            parent_id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.folders.push(folder.clone());
        Ok(folder)
    }

    async fn rename_folder(&self, user_id: Uuid, folder_id: Uuid, name: &str) -> Result<Option<Folder>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .folders
            .iter_mut()
            .find(|f| f.id == folder_id && f.user_id == user_id)
            .map(|folder| {
                folder.name = name.to_string();
                folder.updated_at = Utc::now();
                folder.clone()
            }))
    }

    async fn set_folder_parent(
        &self,
        user_id: Uuid,
        folder_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Folder>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if let Some(parent) = parent_id {
            if !tables.folders.iter().any(|f| f.id == parent) {
                return Err(anyhow!("update violates foreign key folders.parent_id"));
            }
        }

        Ok(tables
            .folders
            .iter_mut()
            .find(|f| f.id == folder_id && f.user_id == user_id)
            .map(|folder| {
                folder.parent_id = parent_id;
                folder.updated_at = Utc::now();
                folder.clone()
            }))
    }

    async fn delete_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.folders.iter().any(|f| f.id == folder_id && f.user_id == user_id) {
            return Ok(false);
        }

        let doomed = excluded_destinations(&tables.folders, folder_id);
        tables.remove_folders(&doomed);
        Ok(true)
    }
}

#[async_trait]
impl WorkStore for MemoryStore {
    async fn list_works(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<Work>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let works: Vec<Work> = tables
            .works
            .iter()
            .filter(|w| w.user_id == user_id && scope.contains(w.folder_id))
            .cloned()
            .collect();
        Ok(sorted_by_recency(works, |w: &Work| w.updated_at))
    }

    async fn find_work(&self, user_id: Uuid, work_id: Uuid) -> Result<Option<Work>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .works
            .iter()
            .find(|w| w.id == work_id && w.user_id == user_id)
            .cloned())
    }

    async fn insert_work(
        &self,
        user_id: Uuid,
        title: &str,
        folder_id: Option<Uuid>,
        content: &RichTextDocument,
    ) -> Result<Work> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if let Some(folder) = folder_id {
            if !tables.folders.iter().any(|f| f.id == folder) {
                return Err(anyhow!("insert violates foreign key works.folder_id"));
            }
        }

        let now = Utc::now();
        let work = Work {
            id: Uuid::new_v4(),
            user_id,
            folder_id,
            title: title.to_string(),
            content: content.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.works.push(work.clone());
        Ok(work)
    }

    async fn update_work(&self, user_id: Uuid, work_id: Uuid, changes: WorkChanges) -> Result<Option<Work>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .works
            .iter_mut()
            .find(|w| w.id == work_id && w.user_id == user_id)
            .map(|work| {
                if let Some(title) = changes.title {
                    work.title = title;
                }
                if let Some(content) = changes.content {
                    work.content = content;
                }
                work.updated_at = Utc::now();
                work.clone()
            }))
    }

    async fn set_work_folder(&self, user_id: Uuid, work_id: Uuid, folder_id: Option<Uuid>) -> Result<Option<Work>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if let Some(folder) = folder_id {
            if !tables.folders.iter().any(|f| f.id == folder) {
                return Err(anyhow!("update violates foreign key works.folder_id"));
            }
        }

        Ok(tables
            .works
            .iter_mut()
            .find(|w| w.id == work_id && w.user_id == user_id)
            .map(|work| {
                work.folder_id = folder_id;
                work.updated_at = Utc::now();
                work.clone()
            }))
    }

    async fn delete_work(&self, user_id: Uuid, work_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let before = tables.works.len();
        tables.works.retain(|w| !(w.id == work_id && w.user_id == user_id));
        Ok(tables.works.len() < before)
    }
}

#[async_trait]
impl QTreeStore for MemoryStore {
    async fn list_roots(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<QTreeRoot>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let roots: Vec<QTreeRoot> = tables
            .qtree_roots
            .iter()
            .filter(|r| r.user_id == user_id && scope.contains(r.folder_id))
            .cloned()
            .collect();
        Ok(sorted_by_recency(roots, |r: &QTreeRoot| r.updated_at))
    }

    async fn find_root(&self, user_id: Uuid, root_id: Uuid) -> Result<Option<QTreeRoot>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .qtree_roots
            .iter()
            .find(|r| r.id == root_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_root(
        &self,
        user_id: Uuid,
        question: &str,
        folder_id: Option<Uuid>,
        answer: &RichTextDocument,
    ) -> Result<QTreeRoot> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if let Some(folder) = folder_id {
            if !tables.folders.iter().any(|f| f.id == folder) {
                return Err(anyhow!("insert violates foreign key qtree_roots.folder_id"));
            }
        }

        let now = Utc::now();
        let root = QTreeRoot {
            id: Uuid::new_v4(),
            user_id,
            folder_id,
            question: question.to_string(),
            answer: answer.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.qtree_roots.push(root.clone());
        Ok(root)
    }

    async fn update_root(&self, user_id: Uuid, root_id: Uuid, changes: QuestionChanges) -> Result<Option<QTreeRoot>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .qtree_roots
            .iter_mut()
            .find(|r| r.id == root_id && r.user_id == user_id)
            .map(|root| {
                if let Some(question) = changes.question {
                    root.question = question;
                }
                if let Some(answer) = changes.answer {
                    root.answer = answer;
                }
                root.updated_at = Utc::now();
                root.clone()
            }))
    }

    async fn set_root_folder(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> Result<Option<QTreeRoot>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if let Some(folder) = folder_id {
            if !tables.folders.iter().any(|f| f.id == folder) {
                return Err(anyhow!("update violates foreign key qtree_roots.folder_id"));
            }
        }

        Ok(tables
            .qtree_roots
            .iter_mut()
            .find(|r| r.id == root_id && r.user_id == user_id)
            .map(|root| {
                root.folder_id = folder_id;
                root.updated_at = Utc::now();
                root.clone()
            }))
    }

    async fn delete_root(&self, user_id: Uuid, root_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.qtree_roots.iter().any(|r| r.id == root_id && r.user_id == user_id) {
            return Ok(false);
        }
        tables.remove_roots(&HashSet::from([root_id]));
        Ok(true)
    }

    async fn list_nodes(&self, user_id: Uuid, root_id: Uuid) -> Result<Vec<QTreeNode>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .qtree_nodes
            .iter()
            .filter(|n| n.qtree_root_id == root_id && n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_node(&self, user_id: Uuid, node_id: Uuid) -> Result<Option<QTreeNode>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .qtree_nodes
            .iter()
            .find(|n| n.id == node_id && n.user_id == user_id)
            .cloned())
    }

    async fn insert_node(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        parent: NodeParent,
        question: &str,
        answer: &RichTextDocument,
    ) -> Result<QTreeNode> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.qtree_roots.iter().any(|r| r.id == root_id) {
            return Err(anyhow!("insert violates foreign key qtree_nodes.qtree_root_id"));
        }
        if let NodeParent::Node(parent_id) = parent {
            if !tables.qtree_nodes.iter().any(|n| n.id == parent_id) {
                return Err(anyhow!("insert violates foreign key qtree_nodes.parent_node_id"));
            }
        }

        let (parent_root_id, parent_node_id) = parent_columns(root_id, parent);
        let now = Utc::now();
        let node = QTreeNode {
            id: Uuid::new_v4(),
            user_id,
            qtree_root_id: root_id,
            parent_root_id,
            parent_node_id,
            question: question.to_string(),
            answer: answer.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.qtree_nodes.push(node.clone());
        Ok(node)
    }

    async fn update_node(&self, user_id: Uuid, node_id: Uuid, changes: QuestionChanges) -> Result<Option<QTreeNode>> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .qtree_nodes
            .iter_mut()
            .find(|n| n.id == node_id && n.user_id == user_id)
            .map(|node| {
                if let Some(question) = changes.question {
                    node.question = question;
                }
                if let Some(answer) = changes.answer {
                    node.answer = answer;
                }
                node.updated_at = Utc::now();
                node.clone()
            }))
    }

    async fn delete_node(&self, user_id: Uuid, node_id: Uuid) -> Result<bool> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.qtree_nodes.iter().any(|n| n.id == node_id && n.user_id == user_id) {
            return Ok(false);
        }
        tables.remove_node_subtree(node_id);
        Ok(true)
    }
}
