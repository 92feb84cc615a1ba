use crate::error::{AppError, Result};
use crate::models::{
    build_folder_tree, excluded_destinations, folder_breadcrumbs, move_destinations, subtree_height,
    CreateFolderRequest, DestinationEntry, Folder, FolderNode, RenameFolderRequest, MAX_TREE_DEPTH,
};
use crate::repositories::FolderStore;
use crate::services::cache::CollectionCache;
use crate::services::events::{ChangeAction, EntityKind, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Folder access for one backend instance.
///
/// Holds each user's flat folder list as last fetched. Every successful
/// mutation is followed by a full refetch of that list, and the tree,
/// breadcrumbs and move destinations are derived from it on demand.
pub struct FolderService {
    store: Arc<dyn FolderStore>,
    cache: CollectionCache<Uuid, Folder>,
    events: Option<EventBus>,
}

impl FolderService {
    pub fn new(store: Arc<dyn FolderStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache: CollectionCache::new(cache_ttl),
            events: None,
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Reads the user's folders from the store and replaces the cached list.
    pub async fn fetch_folders(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        let folders = self.store.list_folders(user_id).await?;
        self.cache.replace(user_id, folders.clone()).await;
        Ok(folders)
    }

    /// Cached folder list, refetched when missing or stale.
    pub async fn folders(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        match self.cache.fresh(&user_id).await {
            Some(folders) => Ok(folders),
            None => self.fetch_folders(user_id).await,
        }
    }

    pub async fn folder_tree(&self, user_id: Uuid) -> Result<Vec<FolderNode>> {
        let folders = self.folders(user_id).await?;
        Ok(build_folder_tree(&folders))
    }

    /// Folders whose parent is exactly `parent_id` (`None` for top level).
    pub async fn child_folders(&self, user_id: Uuid, parent_id: Option<Uuid>) -> Result<Vec<Folder>> {
        let folders = self.folders(user_id).await?;
        Ok(folders.into_iter().filter(|f| f.parent_id == parent_id).collect())
    }

    pub async fn get_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<Folder> {
        self.store
            .find_folder(user_id, folder_id)
            .await?
            .ok_or_else(|| AppError::not_found_redirect("Folder", "/"))
    }

    pub async fn breadcrumbs(&self, user_id: Uuid, folder_id: Uuid) -> Result<Vec<Folder>> {
        let folders = self.folders(user_id).await?;
        Ok(folder_breadcrumbs(&folders, folder_id))
    }

    /// Picker rows for moving something. Moving a folder passes its id as
    /// `exclude` so neither it nor its descendants are offered.
    pub async fn move_destinations(&self, user_id: Uuid, exclude: Option<Uuid>) -> Result<Vec<DestinationEntry>> {
        let tree = self.folder_tree(user_id).await?;
        Ok(move_destinations(&tree, exclude))
    }

    pub async fn create_folder(&self, user_id: Uuid, request: CreateFolderRequest) -> Result<Folder> {
        request.validate()?;
        let name = request.name.trim();

        if let Some(parent_id) = request.parent_id {
            let folders = self.fetch_folders(user_id).await?;
            if !folders.iter().any(|f| f.id == parent_id) {
                return Err(AppError::not_found("Parent folder"));
            }
            check_depth(folder_breadcrumbs(&folders, parent_id).len() + 1)?;
        }

        let folder = self.store.insert_folder(user_id, name, request.parent_id).await?;
        info!(user_id = %user_id, folder_id = %folder.id, "Folder created");

        self.after_mutation(user_id, ChangeAction::Created, folder.id).await;
        Ok(folder)
    }

    pub async fn rename_folder(&self, user_id: Uuid, folder_id: Uuid, request: RenameFolderRequest) -> Result<Folder> {
        request.validate()?;

        let folder = self
            .store
            .rename_folder(user_id, folder_id, request.name.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Folder"))?;
        info!(user_id = %user_id, folder_id = %folder_id, "Folder renamed");

        self.after_mutation(user_id, ChangeAction::Renamed, folder_id).await;
        Ok(folder)
    }

    /// Re-parents a folder. `destination_id = None` makes it top-level.
    ///
    /// Rejects destinations inside the moved folder's own subtree, computed
    /// from a fresh fetch so a stale cache cannot let a cycle through.
    pub async fn move_folder(&self, user_id: Uuid, folder_id: Uuid, destination_id: Option<Uuid>) -> Result<Folder> {
        let folders = self.fetch_folders(user_id).await?;

        if !folders.iter().any(|f| f.id == folder_id) {
            return Err(AppError::not_found("Folder"));
        }

        if let Some(destination) = destination_id {
            if !folders.iter().any(|f| f.id == destination) {
                return Err(AppError::not_found("Destination folder"));
            }
            if excluded_destinations(&folders, folder_id).contains(&destination) {
                warn!(user_id = %user_id, folder_id = %folder_id, destination = %destination, "Rejected cyclic folder move");
                return Err(AppError::InvalidMove { folder: folder_id });
            }
            check_depth(folder_breadcrumbs(&folders, destination).len() + subtree_height(&folders, folder_id))?;
        }

        let folder = self
            .store
            .set_folder_parent(user_id, folder_id, destination_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder"))?;
        info!(user_id = %user_id, folder_id = %folder_id, destination = ?destination_id, "Folder moved");

        self.after_mutation(user_id, ChangeAction::Moved, folder_id).await;
        Ok(folder)
    }

    /// Deletes one folder. Descendant folders and their contents go with it
    /// through the data service's cascade.
    pub async fn delete_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<()> {
        if !self.store.delete_folder(user_id, folder_id).await? {
            return Err(AppError::not_found("Folder"));
        }
        info!(user_id = %user_id, folder_id = %folder_id, "Folder deleted");

        self.after_mutation(user_id, ChangeAction::Deleted, folder_id).await;
        Ok(())
    }

    pub async fn invalidate_user(&self, user_id: Uuid) {
        self.cache.invalidate(&user_id).await;
    }

    async fn after_mutation(&self, user_id: Uuid, action: ChangeAction, folder_id: Uuid) {
        if let Err(e) = self.fetch_folders(user_id).await {
            warn!(user_id = %user_id, error = %e, "Folder refetch after mutation failed");
            self.cache.invalidate(&user_id).await;
        }

        if let Some(events) = &self.events {
            events.publish(user_id, EntityKind::Folder, action, folder_id);
        }
    }
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(AppError::Validation(format!(
            "Folders cannot be nested more than {} levels deep",
            MAX_TREE_DEPTH
        )));
    }
    Ok(())
}
