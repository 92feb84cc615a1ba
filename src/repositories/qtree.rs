use super::{parent_columns, work::push_scope, QTreeStore, QuestionChanges};
use crate::models::{FolderScope, NodeParent, QTreeNode, QTreeRoot, RichTextDocument};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const ROOT_COLUMNS: &str = "id, user_id, folder_id, question, answer, created_at, updated_at";
const NODE_COLUMNS: &str =
    "id, user_id, qtree_root_id, parent_root_id, parent_node_id, question, answer, created_at, updated_at";

#[derive(Clone)]
pub struct PgQTreeRepository {
    pool: PgPool,
}

impl PgQTreeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QTreeStore for PgQTreeRepository {
    async fn list_roots(&self, user_id: Uuid, scope: FolderScope) -> Result<Vec<QTreeRoot>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {ROOT_COLUMNS} FROM qtree_roots WHERE user_id = "));
        query.push_bind(user_id);
        push_scope(&mut query, scope);
        query.push(" ORDER BY updated_at DESC");

        let roots = query.build_query_as::<QTreeRoot>().fetch_all(&self.pool).await?;
        Ok(roots)
    }

    async fn find_root(&self, user_id: Uuid, root_id: Uuid) -> Result<Option<QTreeRoot>> {
        let root = sqlx::query_as::<_, QTreeRoot>(&format!(
            "SELECT {ROOT_COLUMNS} FROM qtree_roots WHERE id = $1 AND user_id = $2"
        ))
        .bind(root_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(root)
    }

    async fn insert_root(
        &self,
        user_id: Uuid,
        question: &str,
        folder_id: Option<Uuid>,
        answer: &RichTextDocument,
    ) -> Result<QTreeRoot> {
        let root = sqlx::query_as::<_, QTreeRoot>(&format!(
            r#"
            INSERT INTO qtree_roots (user_id, folder_id, question, answer)
            VALUES ($1, $2, $3, $4)
            RETURNING {ROOT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(folder_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await?;

        Ok(root)
    }

    async fn update_root(&self, user_id: Uuid, root_id: Uuid, changes: QuestionChanges) -> Result<Option<QTreeRoot>> {
        let root = sqlx::query_as::<_, QTreeRoot>(&format!(
            r#"
            UPDATE qtree_roots
            SET question = COALESCE($1, question),
                answer = COALESCE($2, answer),
                updated_at = NOW()
            WHERE id = $3 AND user_id = $4
            RETURNING {ROOT_COLUMNS}
            "#
        ))
        .bind(changes.question)
        .bind(changes.answer)
        .bind(root_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(root)
    }

    async fn set_root_folder(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> Result<Option<QTreeRoot>> {
        let root = sqlx::query_as::<_, QTreeRoot>(&format!(
            r#"
            UPDATE qtree_roots
            SET folder_id = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING {ROOT_COLUMNS}
            "#
        ))
        .bind(folder_id)
        .bind(root_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(root)
    }

    async fn delete_root(&self, user_id: Uuid, root_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM qtree_roots WHERE id = $1 AND user_id = $2")
            .bind(root_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_nodes(&self, user_id: Uuid, root_id: Uuid) -> Result<Vec<QTreeNode>> {
        let nodes = sqlx::query_as::<_, QTreeNode>(&format!(
            r#"
            SELECT {NODE_COLUMNS}
            FROM qtree_nodes
            WHERE qtree_root_id = $1 AND user_id = $2
            ORDER BY created_at
            "#
        ))
        .bind(root_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(nodes)
    }

    async fn find_node(&self, user_id: Uuid, node_id: Uuid) -> Result<Option<QTreeNode>> {
        let node = sqlx::query_as::<_, QTreeNode>(&format!(
            "SELECT {NODE_COLUMNS} FROM qtree_nodes WHERE id = $1 AND user_id = $2"
        ))
        .bind(node_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(node)
    }

    async fn insert_node(
        &self,
        user_id: Uuid,
        root_id: Uuid,
        parent: NodeParent,
        question: &str,
        answer: &RichTextDocument,
    ) -> Result<QTreeNode> {
        let (parent_root_id, parent_node_id) = parent_columns(root_id, parent);

        let node = sqlx::query_as::<_, QTreeNode>(&format!(
            r#"
            INSERT INTO qtree_nodes (user_id, qtree_root_id, parent_root_id, parent_node_id, question, answer)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {NODE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(root_id)
        .bind(parent_root_id)
        .bind(parent_node_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await?;

        Ok(node)
    }

    async fn update_node(&self, user_id: Uuid, node_id: Uuid, changes: QuestionChanges) -> Result<Option<QTreeNode>> {
        let node = sqlx::query_as::<_, QTreeNode>(&format!(
            r#"
            UPDATE qtree_nodes
            SET question = COALESCE($1, question),
                answer = COALESCE($2, answer),
                updated_at = NOW()
            WHERE id = $3 AND user_id = $4
            RETURNING {NODE_COLUMNS}
            "#
        ))
        .bind(changes.question)
        .bind(changes.answer)
        .bind(node_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(node)
    }

    async fn delete_node(&self, user_id: Uuid, node_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM qtree_nodes WHERE id = $1 AND user_id = $2")
            .bind(node_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
