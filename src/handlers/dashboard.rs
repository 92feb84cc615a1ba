//! The dashboard: everything filed at one level of the folder tree.

use super::success;
use crate::error::Result;
use crate::models::{AuthUser, Folder, FolderScope, QTreeSummary, WorkSummary};
use crate::services::{FolderService, QTreeService, WorkService};
use axum::{
    extract::{Extension, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSort {
    #[default]
    UpdatedAt,
    CreatedAt,
    Title,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub folder_id: Option<Uuid>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: DashboardSort,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub folder: Option<Folder>,
    pub breadcrumbs: Vec<Folder>,
    pub folders: Vec<Folder>,
    pub works: Vec<WorkSummary>,
    pub qtrees: Vec<QTreeSummary>,
}

/// Something the dashboard lists: it has a label and two timestamps.
trait Listed {
    fn label(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

impl Listed for Folder {
    fn label(&self) -> &str {
        &self.name
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Listed for WorkSummary {
    fn label(&self) -> &str {
        &self.title
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Listed for QTreeSummary {
    fn label(&self) -> &str {
        &self.question
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Case-insensitive label filter followed by the requested ordering.
fn arrange<T: Listed>(mut items: Vec<T>, needle: Option<&str>, sort: DashboardSort) -> Vec<T> {
    if let Some(needle) = needle.map(str::trim).filter(|n| !n.is_empty()) {
        let needle = needle.to_lowercase();
        items.retain(|item| item.label().to_lowercase().contains(&needle));
    }

    items.sort_by(|a, b| compare(a, b, sort));
    items
}

fn compare<T: Listed>(a: &T, b: &T, sort: DashboardSort) -> Ordering {
    match sort {
        DashboardSort::UpdatedAt => b.updated_at().cmp(&a.updated_at()),
        DashboardSort::CreatedAt => b.created_at().cmp(&a.created_at()),
        DashboardSort::Title => a.label().to_lowercase().cmp(&b.label().to_lowercase()),
    }
}

pub async fn get_dashboard(
    State(folder_service): State<Arc<FolderService>>,
    State(work_service): State<Arc<WorkService>>,
    State(qtree_service): State<Arc<QTreeService>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Value>> {
    let folder = match query.folder_id {
        Some(folder_id) => Some(folder_service.get_folder(user.id, folder_id).await?),
        None => None,
    };

    let scope = FolderScope::for_folder(query.folder_id);
    let breadcrumbs = async {
        match query.folder_id {
            Some(folder_id) => folder_service.breadcrumbs(user.id, folder_id).await,
            None => Ok(Vec::new()),
        }
    };

    let (breadcrumbs, folders, works, roots) = futures::try_join!(
        breadcrumbs,
        folder_service.child_folders(user.id, query.folder_id),
        work_service.works(user.id, scope),
        qtree_service.qtrees(user.id, scope),
    )?;

    let works = works
        .iter()
        .map(|work| WorkSummary::from_work(work, work_service.preview_length()))
        .collect();
    let qtrees = roots
        .iter()
        .map(|root| QTreeSummary::from_root(root, qtree_service.preview_length()))
        .collect();

    let needle = query.q.as_deref();
    Ok(success(Dashboard {
        folder,
        breadcrumbs,
        folders: arrange(folders, needle, query.sort),
        works: arrange(works, needle, query.sort),
        qtrees: arrange(qtrees, needle, query.sort),
    }))
}
