use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracker_core::model::{Topic, Unit, UnitId, ValidatedUnit};

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

/// Insert payload for a unit that has no id yet.
#[derive(Debug, Clone)]
pub struct NewUnitRecord {
    pub subject: String,
    pub unit_name: String,
    pub topics: Vec<Topic>,
    pub covered: u8,
    pub created_at: DateTime<Utc>,
}

impl NewUnitRecord {
    #[must_use]
    pub fn from_validated(unit: &ValidatedUnit) -> Self {
        Self {
            subject: unit.subject.clone(),
            unit_name: unit.name.clone(),
            topics: unit.topics.clone(),
            covered: unit.covered(),
            created_at: unit.created_at,
        }
    }
}

/// Repository contract for study units.
///
/// Listing order is newest first (`created_at` descending, then id descending).
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Persist a new unit and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the unit cannot be stored.
    async fn insert_new_unit(&self, unit: NewUnitRecord) -> Result<UnitId, StorageError>;

    /// Persist or replace a unit under its existing id. A stored
    /// `last_reminded` newer than the unit's is kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the unit cannot be stored.
    async fn upsert_unit(&self, unit: &Unit) -> Result<(), StorageError>;

    /// Fetch a unit by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on access or decoding failures.
    async fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StorageError>;

    /// Fetch every unit, newest first. Rows that cannot be decoded are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on access failures.
    async fn list_units(&self) -> Result<Vec<Unit>, StorageError>;

    /// Write a unit's topics and coverage after a toggle.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the unit is missing.
    async fn update_progress(&self, unit: &Unit) -> Result<(), StorageError>;

    /// Write subject, name, topics, coverage and `updated_at` after an edit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the unit is missing.
    async fn update_unit(&self, unit: &Unit) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the unit is missing.
    async fn delete_unit(&self, id: UnitId) -> Result<(), StorageError>;

    /// Record when a reminder last fired for a unit. A timestamp older than
    /// the stored one is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the unit is missing.
    async fn update_last_reminded(&self, id: UnitId, at: DateTime<Utc>)
    -> Result<(), StorageError>;
}

#[derive(Default)]
struct MemoryState {
    units: HashMap<UnitId, Unit>,
    next_id: u64,
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

    /// Reminder timestamps are owned by `update_last_reminded`; other writes keep them.
    fn replace_keeping_reminder(&self, unit: &Unit) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard.units.get_mut(&unit.id()).ok_or(StorageError::NotFound)?;
        let mut updated = unit.clone();
        if let Some(at) = slot.last_reminded() {
            updated.mark_reminded(at);
        }
        *slot = updated;
        Ok(())
    }
}

#[async_trait]
impl UnitRepository for InMemoryRepository {
    async fn insert_new_unit(&self, unit: NewUnitRecord) -> Result<UnitId, StorageError> {
        let mut guard = self.lock()?;
        let highest = guard.units.keys().map(UnitId::value).max().unwrap_or(0);
        guard.next_id = guard.next_id.max(highest) + 1;
        let id = UnitId::new(guard.next_id);
        let stored = Unit::from_persisted(
            id,
            unit.subject,
            unit.unit_name,
            unit.topics,
            None,
            unit.created_at,
            None,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.units.insert(id, stored);
        Ok(id)
    }

    async fn upsert_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let mut stored = unit.clone();
        if let Some(at) = guard.units.get(&unit.id()).and_then(Unit::last_reminded) {
            stored.mark_reminded(at);
        }
        guard.units.insert(unit.id(), stored);
        Ok(())
    }

    async fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.units.get(&id).cloned())
    }

    async fn list_units(&self) -> Result<Vec<Unit>, StorageError> {
        let guard = self.lock()?;
        let mut units: Vec<Unit> = guard.units.values().cloned().collect();
        units.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(units)
    }

    async fn update_progress(&self, unit: &Unit) -> Result<(), StorageError> {
        self.replace_keeping_reminder(unit)
    }

    async fn update_unit(&self, unit: &Unit) -> Result<(), StorageError> {
        self.replace_keeping_reminder(unit)
    }

    async fn delete_unit(&self, id: UnitId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .units
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn update_last_reminded(
        &self,
        id: UnitId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let unit = guard.units.get_mut(&id).ok_or(StorageError::NotFound)?;
        unit.mark_reminded(at);
        Ok(())
    }
}

/// Holds the unit repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub units: Arc<dyn UnitRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let units: Arc<dyn UnitRepository> = Arc::new(InMemoryRepository::new());
        Self { units }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tracker_core::model::UnitDraft;
    use tracker_core::time::fixed_now;

    fn new_record(name: &str, created_at: DateTime<Utc>) -> NewUnitRecord {
        let validated = UnitDraft::new("Math", name, ["X", "Y"])
            .validate(created_at)
            .unwrap();
        NewUnitRecord::from_validated(&validated)
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_lists_newest_first() {
        let repo = InMemoryRepository::new();
        let first = repo
            .insert_new_unit(new_record("Algebra", fixed_now()))
            .await
            .unwrap();
        let second = repo
            .insert_new_unit(new_record("Geometry", fixed_now() + Duration::hours(1)))
            .await
            .unwrap();
        assert_ne!(first, second);

        let listed = repo.list_units().await.unwrap();
        let names: Vec<_> = listed.iter().map(Unit::name).collect();
        assert_eq!(names, ["Geometry", "Algebra"]);
    }

    #[tokio::test]
    async fn update_progress_writes_done_flags() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_new_unit(new_record("Algebra", fixed_now()))
            .await
            .unwrap();

        let mut unit = repo.get_unit(id).await.unwrap().unwrap();
        unit.toggle_topic(1).unwrap();
        repo.update_progress(&unit).await.unwrap();

        let fetched = repo.get_unit(id).await.unwrap().unwrap();
        assert!(fetched.topics()[1].done());
        assert_eq!(fetched.covered(), 50);
    }

    #[tokio::test]
    async fn update_last_reminded_never_moves_back() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_new_unit(new_record("Algebra", fixed_now()))
            .await
            .unwrap();
        let now = fixed_now();
        repo.update_last_reminded(id, now).await.unwrap();
        repo.update_last_reminded(id, now - Duration::hours(2))
            .await
            .unwrap();

        let fetched = repo.get_unit(id).await.unwrap().unwrap();
        assert_eq!(fetched.last_reminded(), Some(now));
    }

    #[tokio::test]
    async fn upsert_keeps_newer_reminder() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_new_unit(new_record("Algebra", fixed_now()))
            .await
            .unwrap();
        let now = fixed_now();
        repo.update_last_reminded(id, now).await.unwrap();

        let stale = Unit::from_persisted(
            id,
            "Math",
            "Algebra",
            vec![Topic::new("X").unwrap()],
            Some(now - Duration::hours(3)),
            fixed_now(),
            None,
        )
        .unwrap();
        repo.upsert_unit(&stale).await.unwrap();

        let fetched = repo.get_unit(id).await.unwrap().unwrap();
        assert_eq!(fetched.last_reminded(), Some(now));
        assert_eq!(fetched.topics().len(), 1);
    }

    #[tokio::test]
    async fn writes_to_missing_unit_report_not_found() {
        let repo = InMemoryRepository::new();
        let missing = UnitId::new(404);
        assert!(matches!(
            repo.delete_unit(missing).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.update_last_reminded(missing, fixed_now()).await,
            Err(StorageError::NotFound)
        ));
    }
}
