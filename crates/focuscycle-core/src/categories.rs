//! User-defined categories and their accumulated focus time.
//!
//! The category list is stored as one JSON array in the key-value store and
//! rewritten in full after every change.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::notify::{Listeners, Subscription};
use crate::storage::{keys, KeyValueStore};

pub const NAME_MIN_CHARS: usize = 1;
pub const NAME_MAX_CHARS: usize = 30;
pub const DEFAULT_COLOR: &str = "#6C63FF";

/// Receives credit for completed focus intervals.
pub trait Accumulator: Send + Sync {
    /// Add `minutes` to the category `category_id`.
    ///
    /// # Errors
    /// `CoreError::NotFound` if no such category exists.
    fn credit_minutes(&self, category_id: &str, minutes: u32) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub total_minutes: u64,
    pub created_at: DateTime<Utc>,
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::InvalidName {
            len,
            min: NAME_MIN_CHARS,
            max: NAME_MAX_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Category list persisted in a key-value store.
pub struct CategoryStore {
    store: Arc<dyn KeyValueStore>,
    categories: Mutex<Vec<Category>>,
    listeners: Listeners<Vec<Category>>,
}

impl CategoryStore {
    /// Load the category list. A missing or unreadable list loads as empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let categories = match store.get(keys::CATEGORIES) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored categories unreadable, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Self {
            store,
            categories: Mutex::new(categories),
            listeners: Listeners::new(),
        }
    }

    pub fn list(&self) -> Vec<Category> {
        self.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<Category> {
        self.lock().iter().find(|c| c.id == id).cloned()
    }

    /// Create a category with zero accumulated time.
    pub fn add(&self, name: &str, color: &str) -> Result<Category> {
        let name = validate_name(name)?;
        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            color: color.to_string(),
            total_minutes: 0,
            created_at: Utc::now(),
        };
        let added = category.clone();
        self.modify(move |list| {
            list.push(category);
            Ok(())
        })?;
        tracing::debug!(id = %added.id, name = %added.name, "category added");
        Ok(added)
    }

    /// Rename and recolor a category.
    pub fn update(&self, id: &str, name: &str, color: &str) -> Result<Category> {
        let name = validate_name(name)?;
        let mut updated = None;
        self.modify(|list| {
            let category = list
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| CoreError::category_not_found(id))?;
            category.name = name;
            category.color = color.to_string();
            updated = Some(category.clone());
            Ok(())
        })?;
        updated.ok_or_else(|| CoreError::category_not_found(id))
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.modify(|list| {
            let index = list
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| CoreError::category_not_found(id))?;
            list.remove(index);
            Ok(())
        })
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Vec<Category>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Category>> {
        self.categories.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` to a copy of the list and keep it only once it has been
    /// written. A failed change or write leaves the list untouched.
    fn modify(&self, change: impl FnOnce(&mut Vec<Category>) -> Result<()>) -> Result<()> {
        let snapshot = {
            let mut list = self.lock();
            let mut draft = list.clone();
            change(&mut draft)?;
            self.store
                .set(keys::CATEGORIES, &serde_json::to_value(&draft)?)?;
            *list = draft.clone();
            draft
        };
        self.listeners.notify(&snapshot);
        Ok(())
    }
}

impl Accumulator for CategoryStore {
    fn credit_minutes(&self, category_id: &str, minutes: u32) -> Result<()> {
        self.modify(|list| {
            let category = list
                .iter_mut()
                .find(|c| c.id == category_id)
                .ok_or_else(|| CoreError::category_not_found(category_id))?;
            category.total_minutes += u64::from(minutes);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    fn store() -> (Arc<MemoryStore>, CategoryStore) {
        let kv = Arc::new(MemoryStore::new());
        let categories = CategoryStore::load(kv.clone());
        (kv, categories)
    }

    #[test]
    fn add_trims_and_persists() {
        let (kv, categories) = store();
        let math = categories.add("  Math  ", "#ff0000").unwrap();
        assert_eq!(math.name, "Math");
        assert_eq!(math.total_minutes, 0);

        let reloaded = CategoryStore::load(kv);
        assert_eq!(reloaded.list(), vec![math]);
    }

    #[test]
    fn add_rejects_bad_names() {
        let (_, categories) = store();
        assert!(categories.add("   ", DEFAULT_COLOR).is_err());
        assert!(categories.add(&"x".repeat(31), DEFAULT_COLOR).is_err());
        assert!(categories.add(&"x".repeat(30), DEFAULT_COLOR).is_ok());
        assert_eq!(categories.list().len(), 1);
    }

    #[test]
    fn update_and_delete() {
        let (_, categories) = store();
        let c = categories.add("Reading", DEFAULT_COLOR).unwrap();
        let updated = categories.update(&c.id, "Novels", "#00ff00").unwrap();
        assert_eq!(updated.name, "Novels");
        assert_eq!(updated.color, "#00ff00");

        categories.delete(&c.id).unwrap();
        assert!(categories.get(&c.id).is_none());
        assert!(matches!(
            categories.delete(&c.id),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn update_unknown_is_not_found() {
        let (_, categories) = store();
        assert!(matches!(
            categories.update("nope", "Name", DEFAULT_COLOR),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn credit_accumulates() {
        let (_, categories) = store();
        let c = categories.add("Math", DEFAULT_COLOR).unwrap();
        categories.credit_minutes(&c.id, 25).unwrap();
        categories.credit_minutes(&c.id, 25).unwrap();
        assert_eq!(categories.get(&c.id).unwrap().total_minutes, 50);
    }

    #[test]
    fn credit_unknown_category_fails_without_side_effects() {
        let (kv, categories) = store();
        let err = categories.credit_minutes("ghost", 25).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "category", .. }));
        assert!(kv.get(keys::CATEGORIES).is_none());
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<serde_json::Value> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_write_rolls_back_credit() {
        let kv = Arc::new(FlakyStore::default());
        let categories = CategoryStore::load(kv.clone());
        let c = categories.add("Math", DEFAULT_COLOR).unwrap();
        let notified = Arc::new(Mutex::new(0));
        let n = Arc::clone(&notified);
        let _sub = categories.subscribe(move |_| *n.lock().unwrap() += 1);

        kv.failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = categories.credit_minutes(&c.id, 25).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(categories.get(&c.id).unwrap().total_minutes, 0);
        assert!(categories.update(&c.id, "Algebra", DEFAULT_COLOR).is_err());
        assert_eq!(categories.get(&c.id).unwrap().name, "Math");
        assert_eq!(*notified.lock().unwrap(), 0);

        kv.failing.store(false, std::sync::atomic::Ordering::SeqCst);
        categories.credit_minutes(&c.id, 25).unwrap();
        assert_eq!(categories.get(&c.id).unwrap().total_minutes, 25);
        assert_eq!(*notified.lock().unwrap(), 1);
    }

    #[test]
    fn malformed_list_loads_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(keys::CATEGORIES, &serde_json::json!({"not": "a list"}))
            .unwrap();
        assert!(CategoryStore::load(kv).list().is_empty());
    }

    #[test]
    fn subscribers_see_new_totals() {
        let (_, categories) = store();
        let c = categories.add("Math", DEFAULT_COLOR).unwrap();
        let total = Arc::new(Mutex::new(0));
        let t = Arc::clone(&total);
        let _sub = categories.subscribe(move |list| *t.lock().unwrap() = list[0].total_minutes);
        categories.credit_minutes(&c.id, 30).unwrap();
        assert_eq!(*total.lock().unwrap(), 30);
    }
}
