//! In-memory entity storage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;

/// A stored entity with a numeric id assigned on first save.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<u64>;
    fn set_id(&mut self, id: u64);
}

/// Entities owned by a user (profile records).
pub trait UserOwned: Entity {
    fn user_id(&self) -> Option<u64>;
}

/// Thread-safe store of entities keyed by id.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct InMemoryRepository<T> {
    items: Arc<DashMap<u64, T>>,
    next_id: Arc<AtomicU64>,
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Store `item` under a freshly assigned id, ignoring any id it carries.
    pub fn insert(&self, mut item: T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        item.set_id(id);
        self.items.insert(id, item.clone());
        item
    }

    /// Replace the entity stored under `item`'s id, or insert it if it has none.
    pub fn save(&self, item: T) -> T {
        match item.id() {
            Some(id) => {
                self.items.insert(id, item.clone());
                item
            }
            None => self.insert(item),
        }
    }

    pub fn find(&self, id: u64) -> Option<T> {
        self.items.get(&id).map(|entry| entry.value().clone())
    }

    pub fn exists(&self, id: u64) -> bool {
        self.items.contains_key(&id)
    }

    /// All entities, ordered by id.
    pub fn find_all(&self) -> Vec<T> {
        let mut items: Vec<(u64, T)> = self
            .items
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        items.sort_by_key(|(id, _)| *id);
        items.into_iter().map(|(_, item)| item).collect()
    }

    pub fn find_by(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.find_all().into_iter().filter(|item| predicate(item)).collect()
    }

    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.items.iter().any(|entry| predicate(entry.value()))
    }

    pub fn delete(&self, id: u64) -> bool {
        self.items.remove(&id).is_some()
    }

    /// Remove every entity matching `predicate`; returns how many were removed.
    pub fn delete_by(&self, predicate: impl Fn(&T) -> bool) -> usize {
        let mut removed = 0;
        self.items.retain(|_, item| {
            let matched = predicate(item);
            removed += usize::from(matched);
            !matched
        });
        removed
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

impl<T: UserOwned> InMemoryRepository<T> {
    pub fn find_by_user(&self, user_id: u64) -> Vec<T> {
        self.find_by(|item| item.user_id() == Some(user_id))
    }

    pub fn delete_by_user(&self, user_id: u64) -> usize {
        self.delete_by(|item| item.user_id() == Some(user_id))
    }
}

/// `?page=&size=` query. Paging applies only when both are given; pages
/// are zero-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl PageQuery {
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        match (self.page, self.size) {
            (Some(page), Some(size)) => {
                let start = page.saturating_mul(size);
                items.into_iter().skip(start).take(size).collect()
            }
            _ => items,
        }
    }
}
