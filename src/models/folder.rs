use super::validate_not_blank;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Folder name cannot exceed 255 characters")
    )]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameFolderRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Folder name cannot exceed 255 characters")
    )]
    pub name: String,
}

/// Destination of a move. `None` files the entity at the top level.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoveToRequest {
    #[serde(default)]
    pub destination_id: Option<Uuid>,
}

/// Which slice of a user's works or q-trees a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderScope {
    /// Everything the user owns.
    All,
    /// Only entities filed at the top level.
    Root,
    /// Entities filed directly in one folder.
    Folder(Uuid),
}

impl FolderScope {
    /// Scope for a dashboard view: a folder id, or the top level.
    pub fn for_folder(folder_id: Option<Uuid>) -> Self {
        match folder_id {
            Some(id) => Self::Folder(id),
            None => Self::Root,
        }
    }

    pub fn contains(&self, folder_id: Option<Uuid>) -> bool {
        match self {
            Self::All => true,
            Self::Root => folder_id.is_none(),
            Self::Folder(id) => folder_id == Some(*id),
        }
    }
}

/// One selectable row of the move destination picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationEntry {
    pub id: Uuid,
    pub name: String,
    pub depth: usize,
}
