use super::{WorkChanges, WorkStore};
use crate::models::{FolderScope, RichTextDocument, Work};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const WORK_COLUMNS: &str = "id, user_id, folder_id, title, content, created_at, updated_at";

#[derive(Clone)]
pub struct PgWorkRepository {
    pool: PgPool,
}

impl PgWorkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the folder filter of `scope` to a query already filtering by owner.
pub(crate) fn push_scope(query: &mut QueryBuilder<'_, Postgres>, scope: FolderScope) {
    match scope {
        FolderScope::All => {}
        FolderScope::Root => {
            query.push(" AND folder_id IS NULL");
        }
        FolderScope::Folder(folder_id) => {
            query.push(" AND folder_id = ");
            query.push_bind(folder_id);
        }
    }
}

#[async_trait]
impl WorkStore for PgWorkRepository {
    async fn list_works(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<Work>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {WORK_COLUMNS} FROM works WHERE user_id = "));
        query.push_bind(user_id);
        push_scope(&mut query, scope);
        query.push(" ORDER BY updated_at DESC");

        let works = query.build_query_as::<Work>().fetch_all(&self.pool).await?;
        Ok(works)
    }

    async fn find_work(&self, user_id: Uuid, work_id: Uuid) -> Result<Option<Work>> {
        let work = sqlx::query_as::<_, Work>(&format!(
            "SELECT {WORK_COLUMNS} FROM works WHERE id = $1 AND user_id = $2"
        ))
        .bind(work_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(work)
    }

    async fn insert_work(
        &self,
        user_id: Uuid,
        title: &str,
        folder_id: Option<Uuid>,
        content: &RichTextDocument,
    ) -> Result<Work> {
        let work = sqlx::query_as::<_, Work>(&format!(
            r#"
            INSERT INTO works (user_id, folder_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {WORK_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(folder_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(work)
    }

    async fn update_work(&self, user_id: Uuid, work_id: Uuid, changes: WorkChanges) -> Result<Option<Work>> {
        let work = sqlx::query_as::<_, Work>(&format!(
            r#"
            UPDATE works
            SET title = COALESCE($1, title),
                content = COALESCE($2, content),
                updated_at = NOW()
            WHERE id = $3 AND user_id = $4
            RETURNING {WORK_COLUMNS}
            "#
        ))
        .bind(changes.title)
        .bind(changes.content)
        .bind(work_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(work)
    }

    async fn set_work_folder(&self, user_id: Uuid, work_id: Uuid, folder_id: Option<Uuid>) -> Result<Option<Work>> {
        let work = sqlx::query_as::<_, Work>(&format!(
            r#"
            UPDATE works
            SET folder_id = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING {WORK_COLUMNS}
            "#
        ))
        .bind(folder_id)
        .bind(work_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(work)
    }

    async fn delete_work(&self, user_id: Uuid, work_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM works WHERE id = $1 AND user_id = $2")
            .bind(work_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
