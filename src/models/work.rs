use super::{validate_not_blank, RichTextDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Title given to a work created without one.
pub const DEFAULT_WORK_TITLE: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Work {
    pub id: Uuid,
    pub user_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub title: String,
    pub content: RichTextDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateWorkRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<RichTextDocument>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameWorkRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Title cannot exceed 255 characters")
    )]
    pub title: String,
}

/// Card shown in a works listing.
#[derive(Debug, Clone, Serialize)]
pub struct WorkSummary {
    pub id: Uuid,
    pub folder_id: Option<Uuid>,
    pub title: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkSummary {
    pub fn from_work(work: &Work, preview_length: usize) -> Self {
        Self {
            id: work.id,
            folder_id: work.folder_id,
            title: work.title.clone(),
            preview: work.content.plain_text(preview_length),
            created_at: work.created_at,
            updated_at: work.updated_at,
        }
    }
}
