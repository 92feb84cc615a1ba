use super::{validate_not_blank, RichTextDocument, TreeNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Root of a question/answer tree, filed into a folder like a work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QTreeRoot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub question: String,
    pub answer: RichTextDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A question/answer pair below a root.
///
/// `parent_root_id` is set when the direct parent is the root itself,
/// `parent_node_id` when it is another node. Exactly one of them is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct QTreeNode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub qtree_root_id: Uuid,
    pub parent_root_id: Option<Uuid>,
    pub parent_node_id: Option<Uuid>,
    pub question: String,
    pub answer: RichTextDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Direct parent of a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeParent {
    Root,
    Node(Uuid),
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQTreeRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Question cannot exceed 255 characters")
    )]
    pub question: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_single_parent", skip_on_field_errors = false))]
pub struct CreateNodeRequest {
    #[serde(default)]
    pub parent_root_id: Option<Uuid>,
    #[serde(default)]
    pub parent_node_id: Option<Uuid>,
    #[validate(length(max = 255, message = "Question cannot exceed 255 characters"))]
    #[serde(default)]
    pub question: String,
}

impl CreateNodeRequest {
    /// Resolves the parent for a node of `root_id`. Call after validation.
    pub fn parent(&self, root_id: Uuid) -> Option<NodeParent> {
        match (self.parent_root_id, self.parent_node_id) {
            (Some(id), None) if id == root_id => Some(NodeParent::Root),
            (None, Some(node_id)) => Some(NodeParent::Node(node_id)),
            _ => None,
        }
    }
}

fn validate_single_parent(request: &CreateNodeRequest) -> Result<(), ValidationError> {
    if request.parent_root_id.is_some() == request.parent_node_id.is_some() {
        let mut error = ValidationError::new("parent");
        error.message = Some("exactly one of parent_root_id or parent_node_id must be set".into());
        return Err(error);
    }
    Ok(())
}

/// Update of a root's or node's question and answer.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(max = 255, message = "Question cannot exceed 255 characters"))]
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<RichTextDocument>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameQTreeRequest {
    #[validate(
        custom = "validate_not_blank",
        length(max = 255, message = "Question cannot exceed 255 characters")
    )]
    pub question: String,
}

/// Card shown in a q-tree listing.
#[derive(Debug, Clone, Serialize)]
pub struct QTreeSummary {
    pub id: Uuid,
    pub folder_id: Option<Uuid>,
    pub question: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QTreeSummary {
    pub fn from_root(root: &QTreeRoot, preview_length: usize) -> Self {
        Self {
            id: root.id,
            folder_id: root.folder_id,
            question: root.question.clone(),
            preview: root.answer.plain_text(preview_length),
            created_at: root.created_at,
            updated_at: root.updated_at,
        }
    }
}

/// One card of the rendered q-tree.
#[derive(Debug, Clone, Serialize)]
pub struct QTreeNodeCard {
    pub id: Uuid,
    pub question: String,
    pub preview: String,
    pub editor_path: String,
}

impl QTreeNodeCard {
    pub fn from_node(node: &QTreeNode, preview_length: usize) -> Self {
        Self {
            id: node.id,
            question: node.question.clone(),
            preview: node.answer.plain_text(preview_length),
            editor_path: format!("/qtree/{}/node/{}", node.qtree_root_id, node.id),
        }
    }
}

/// A q-tree as rendered: the root with its preview and the node forest.
#[derive(Debug, Clone, Serialize)]
pub struct QTreeView {
    pub root: QTreeRoot,
    pub preview: String,
    pub nodes: Vec<TreeNode<QTreeNodeCard>>,
}
