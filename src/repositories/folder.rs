use super::FolderStore;
use crate::models::Folder;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const FOLDER_COLUMNS: &str = "id, user_id, parent_id, name, created_at, updated_at";

#[derive(Clone)]
pub struct PgFolderRepository {
    pool: PgPool,
}

impl PgFolderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for PgFolderRepository {
    async fn list_folders(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = $1 ORDER BY name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    async fn find_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1 AND user_id = $2"
        ))
        .bind(folder_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn insert_folder(&self, user_id: Uuid, name: &str, parent_id: Option<Uuid>) -> Result<Folder> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            r#"
            INSERT INTO folders (user_id, name, parent_id)
            VALUES ($1, $2, $3)
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn rename_folder(&self, user_id: Uuid, folder_id: Uuid, name: &str) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            r#"
            UPDATE folders
            SET name = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(folder_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn set_folder_parent(
        &self,
        user_id: Uuid,
        folder_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            r#"
            UPDATE folders
            SET parent_id = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(parent_id)
        .bind(folder_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn delete_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(folder_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
