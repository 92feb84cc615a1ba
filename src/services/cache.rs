use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Last successful fetch of one collection.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub fetched_at: Instant,
}

/// Per-key cache of fetched collections.
///
/// A snapshot is written only after a successful fetch or a successful
/// mutation, so a failed remote call leaves the previous state in place.
/// Snapshots older than the TTL are treated as stale and refetched by the
/// owning service.
pub struct CollectionCache<K, T> {
    entries: RwLock<HashMap<K, Snapshot<T>>>,
    ttl: Duration,
}

impl<K, T> CollectionCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Items of a snapshot still within the TTL.
    pub async fn fresh(&self, key: &K) -> Option<Vec<T>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|snapshot| snapshot.fetched_at.elapsed() < self.ttl)
            .map(|snapshot| snapshot.items.clone())
    }

    /// The snapshot regardless of age.
    pub async fn peek(&self, key: &K) -> Option<Snapshot<T>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn replace(&self, key: K, items: Vec<T>) {
        self.entries.write().await.insert(
            key,
            Snapshot {
                items,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Applies `patch` to every snapshot whose key matches. Returns how many
    /// snapshots were touched.
    pub async fn patch_where<P, F>(&self, matches: P, mut patch: F) -> usize
    where
        P: Fn(&K) -> bool,
        F: FnMut(&K, &mut Vec<T>),
    {
        let mut entries = self.entries.write().await;
        let mut touched = 0;
        for (key, snapshot) in entries.iter_mut().filter(|(key, _)| matches(key)) {
            patch(key, &mut snapshot.items);
            touched += 1;
        }
        touched
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn invalidate_where<P>(&self, matches: P)
    where
        P: Fn(&K) -> bool,
    {
        self.entries.write().await.retain(|key, _| !matches(key));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
