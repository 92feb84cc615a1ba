//! Change notifications between entity services.
//!
//! Services publish a [`ChangeEvent`] after every successful mutation.
//! Anything that shows data derived from another family subscribes instead
//! of polling.

use crate::services::{QTreeService, WorkService};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Folder,
    Work,
    QTreeRoot,
    QTreeNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Renamed,
    Moved,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity: EntityKind,
    pub action: ChangeAction,
    pub entity_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, user_id: Uuid, entity: EntityKind, action: ChangeAction, entity_id: Uuid) {
        let event = ChangeEvent {
            id: Uuid::new_v4(),
            user_id,
            entity,
            action,
            entity_id,
            timestamp: Utc::now(),
        };

        debug!(user_id = %user_id, entity = ?entity, action = ?action, entity_id = %entity_id, "Publishing change");

        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Drops cached work and q-tree listings of a user whenever one of their
/// folders moves or disappears, since contents may have cascaded with it.
pub fn spawn_cache_invalidation(
    mut receiver: broadcast::Receiver<ChangeEvent>,
    works: Arc<WorkService>,
    qtrees: Arc<QTreeService>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if event.entity == EntityKind::Folder
                        && matches!(event.action, ChangeAction::Moved | ChangeAction::Deleted)
                    {
                        works.invalidate_user(event.user_id).await;
                        qtrees.invalidate_user(event.user_id).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Cache invalidation lagged, dropping all cached listings");
                    works.invalidate_all().await;
                    qtrees.invalidate_all().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event bus closed, stopping cache invalidation");
                    break;
                }
            }
        }
    })
}
