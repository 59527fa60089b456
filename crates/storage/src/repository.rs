use async_trait::async_trait;
use lingo_core::model::{
    AnswerRecord, CategoryId, ItemId, LearningItem, ProgressUpdate, UserId, mastery_percent,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Request for the items of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRequest {
    pub category_id: CategoryId,
    pub desired_count: u32,
}

/// A course category with the number of items it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub id: CategoryId,
    pub name: String,
    pub item_count: u64,
}

/// Read side of the course content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Items of a category ordered by id, at most `desired_count` of them.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the category does not exist.
    async fn fetch_items(&self, request: ContentRequest) -> Result<Vec<LearningItem>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if categories cannot be read.
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>, StorageError>;
}

/// Write side of the course content, used by seeding and admin tooling.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the category cannot be stored.
    async fn upsert_category(&self, id: CategoryId, name: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the item's category is missing.
    async fn upsert_item(&self, item: &LearningItem) -> Result<(), StorageError>;
}

/// Durable per-user record of answers.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Persist one answer and return the learner's updated standing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    async fn record_answer(&self, record: &AnswerRecord) -> Result<ProgressUpdate, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn mastery(&self, user_id: UserId, category_id: CategoryId) -> Result<u8, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if progress cannot be read.
    async fn total_experience(&self, user_id: UserId) -> Result<u64, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    categories: BTreeMap<CategoryId, String>,
    items: BTreeMap<ItemId, LearningItem>,
    answers: Vec<AnswerRecord>,
}

impl MemoryState {
    fn mastery(&self, user_id: UserId, category_id: CategoryId) -> u8 {
        let total = self
            .items
            .values()
            .filter(|i| i.category_id() == category_id)
            .count();
        let mastered: HashSet<ItemId> = self
            .answers
            .iter()
            .filter(|a| a.user_id == user_id && a.category_id == category_id && a.correct)
            .filter(|a| {
                self.items
                    .get(&a.item_id)
                    .is_some_and(|i| i.category_id() == category_id)
            })
            .map(|a| a.item_id)
            .collect();
        mastery_percent(mastered.len() as u64, total as u64)
    }

    fn total_experience(&self, user_id: UserId) -> u64 {
        self.answers
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| u64::from(a.experience()))
            .sum()
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Every answer recorded so far, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn answers(&self) -> Result<Vec<AnswerRecord>, StorageError> {
        Ok(self.lock()?.answers.clone())
    }
}

#[async_trait]
impl ContentProvider for InMemoryRepository {
    async fn fetch_items(&self, request: ContentRequest) -> Result<Vec<LearningItem>, StorageError> {
        let guard = self.lock()?;
        if !guard.categories.contains_key(&request.category_id) {
            return Err(StorageError::NotFound);
        }
        let limit = usize::try_from(request.desired_count).unwrap_or(usize::MAX);
        Ok(guard
            .items
            .values()
            .filter(|i| i.category_id() == request.category_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<CategoryInfo>, StorageError> {
        let guard = self.lock()?;
        let mut counts: HashMap<CategoryId, u64> = HashMap::new();
        for item in guard.items.values() {
            *counts.entry(item.category_id()).or_default() += 1;
        }
        Ok(guard
            .categories
            .iter()
            .map(|(id, name)| CategoryInfo {
                id: *id,
                name: name.clone(),
                item_count: counts.get(id).copied().unwrap_or(0),
            })
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn upsert_category(&self, id: CategoryId, name: &str) -> Result<(), StorageError> {
        self.lock()?.categories.insert(id, name.to_owned());
        Ok(())
    }

    async fn upsert_item(&self, item: &LearningItem) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.categories.contains_key(&item.category_id()) {
            return Err(StorageError::NotFound);
        }
        guard.items.insert(item.id(), item.clone());
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn record_answer(&self, record: &AnswerRecord) -> Result<ProgressUpdate, StorageError> {
        let mut guard = self.lock()?;
        guard.answers.push(record.clone());
        Ok(ProgressUpdate {
            item_id: record.item_id,
            mastery_percent: guard.mastery(record.user_id, record.category_id),
            experience_delta: record.experience(),
            total_experience: guard.total_experience(record.user_id),
        })
    }

    async fn mastery(&self, user_id: UserId, category_id: CategoryId) -> Result<u8, StorageError> {
        Ok(self.lock()?.mastery(user_id, category_id))
    }

    async fn total_experience(&self, user_id: UserId) -> Result<u64, StorageError> {
        Ok(self.lock()?.total_experience(user_id))
    }
}

/// Aggregates the collaborator contracts behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub content: Arc<dyn ContentProvider>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub progress: Arc<dyn ProgressStore>,
}
