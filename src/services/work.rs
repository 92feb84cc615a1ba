use crate::error::{AppError, Result};
use crate::models::{
    CreateWorkRequest, FolderScope, RenameWorkRequest, RichTextDocument, UpdateWorkRequest, Work, DEFAULT_WORK_TITLE,
};
use crate::repositories::{FolderStore, WorkChanges, WorkStore};
use crate::services::cache::CollectionCache;
use crate::services::events::{ChangeAction, EntityKind, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

type ScopeKey = (Uuid, FolderScope);

/// Works access with per-scope cached listings.
///
/// Mutations patch the cached listings in place instead of refetching.
pub struct WorkService {
    store: Arc<dyn WorkStore>,
    folders: Arc<dyn FolderStore>,
    cache: CollectionCache<ScopeKey, Work>,
    events: Option<EventBus>,
    preview_length: usize,
}

impl WorkService {
    pub fn new(store: Arc<dyn WorkStore>, folders: Arc<dyn FolderStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            folders,
            cache: CollectionCache::new(cache_ttl),
            events: None,
            preview_length: crate::models::DEFAULT_PREVIEW_LENGTH,
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

    pub async fn fetch_works(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<Work>> {
        let works = self.store.list_works(user_id, scope).await?;
        self.cache.replace((user_id, scope), works.clone()).await;
        Ok(works)
    }

    pub async fn works(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<Work>> {
        match self.cache.fresh(&(user_id, scope)).await {
            Some(works) => Ok(works),
            None => self.fetch_works(user_id, scope).await,
        }
    }

    pub async fn get_work(&self, user_id: Uuid, work_id: Uuid) -> Result<Work> {
        self.store
            .find_work(user_id, work_id)
            .await?
            .ok_or_else(|| AppError::not_found_redirect("Work", "/"))
    }

    /// Creates a work with an empty document. A missing title becomes
    /// "Untitled".
    pub async fn create_work(&self, user_id: Uuid, request: CreateWorkRequest) -> Result<Work> {
        request.validate()?;
        self.ensure_folder(user_id, request.folder_id).await?;

        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_WORK_TITLE);

        let work = self
            .store
            .insert_work(user_id, title, request.folder_id, &RichTextDocument::default())
            .await?;
        info!(user_id = %user_id, work_id = %work.id, "Work created");

        self.cache.invalidate_where(|(owner, _)| *owner == user_id).await;
        self.publish(user_id, ChangeAction::Created, work.id);
        Ok(work)
    }

    pub async fn update_work(&self, user_id: Uuid, work_id: Uuid, request: UpdateWorkRequest) -> Result<Work> {
        request.validate()?;

        let changes = WorkChanges {
            title: request.title.map(|t| t.trim().to_string()),
            content: request.content,
        };
        let work = self
            .store
            .update_work(user_id, work_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Work"))?;
        debug!(user_id = %user_id, work_id = %work_id, "Work updated");

        self.replace_cached(&work).await;
        self.publish(user_id, ChangeAction::Updated, work_id);
        Ok(work)
    }

    pub async fn rename_work(&self, user_id: Uuid, work_id: Uuid, request: RenameWorkRequest) -> Result<Work> {
        request.validate()?;

        let changes = WorkChanges {
            title: Some(request.title.trim().to_string()),
            content: None,
        };
        let work = self
            .store
            .update_work(user_id, work_id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Work"))?;
        info!(user_id = %user_id, work_id = %work_id, "Work renamed");

        self.replace_cached(&work).await;
        self.publish(user_id, ChangeAction::Renamed, work_id);
        Ok(work)
    }

    /// Files a work into `destination_id`, or the top level for `None`.
    pub async fn move_work(&self, user_id: Uuid, work_id: Uuid, destination_id: Option<Uuid>) -> Result<Work> {
        self.ensure_folder(user_id, destination_id).await?;

        let work = self
            .store
            .set_work_folder(user_id, work_id, destination_id)
            .await?
            .ok_or_else(|| AppError::not_found("Work"))?;
        info!(user_id = %user_id, work_id = %work_id, destination = ?destination_id, "Work moved");

        let mut stale = Vec::new();
        self.cache
            .patch_where(
                |(owner, _)| *owner == user_id,
                |key, works| {
                    if key.1.contains(work.folder_id) {
                        match works.iter_mut().find(|w| w.id == work.id) {
                            Some(slot) => *slot = work.clone(),
                            None => stale.push(*key),
                        }
                    } else {
                        works.retain(|w| w.id != work.id);
                    }
                },
            )
            .await;
        for key in stale {
            self.cache.invalidate(&key).await;
        }

        self.publish(user_id, ChangeAction::Moved, work_id);
        Ok(work)
    }

    pub async fn delete_work(&self, user_id: Uuid, work_id: Uuid) -> Result<()> {
        if !self.store.delete_work(user_id, work_id).await? {
            return Err(AppError::not_found("Work"));
        }
        info!(user_id = %user_id, work_id = %work_id, "Work deleted");

        self.cache
            .patch_where(
                |(owner, _)| *owner == user_id,
                |_, works| works.retain(|w| w.id != work_id),
            )
            .await;
        self.publish(user_id, ChangeAction::Deleted, work_id);
        Ok(())
    }

    pub async fn invalidate_user(&self, user_id: Uuid) {
        self.cache.invalidate_where(|(owner, _)| *owner == user_id).await;
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_where(|_| true).await;
    }

    async fn ensure_folder(&self, user_id: Uuid, folder_id: Option<Uuid>) -> Result<()> {
        if let Some(folder_id) = folder_id {
            if self.folders.find_folder(user_id, folder_id).await?.is_none() {
                return Err(AppError::not_found("Folder"));
            }
        }
        Ok(())
    }

    async fn replace_cached(&self, work: &Work) {
        self.cache
            .patch_where(
                |(owner, _)| *owner == work.user_id,
                |_, works| {
                    if let Some(index) = works.iter().position(|w| w.id == work.id) {
                        works[index] = work.clone();
                        works.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                    }
                },
            )
            .await;
    }

    fn publish(&self, user_id: Uuid, action: ChangeAction, work_id: Uuid) {
        if let Some(events) = &self.events {
            events.publish(user_id, EntityKind::Work, action, work_id);
        }
    }
}
