use thiserror::Error;

use crate::model::{Unit, UnitDraft, UnitId};
use crate::progress::{self, Summary, UnitFilter};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),
}

/// In-memory view of the tracker, owned by the front end.
///
/// Holds the loaded units (newest first), the unit currently open in the edit
/// form, and the active filter. Nothing here touches storage.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    units: Vec<Unit>,
    editing: Option<UnitId>,
    filter: UnitFilter,
}

impl TrackerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every loaded unit, e.g. after a fresh fetch.
    ///
    /// Drops the edit target if it no longer exists.
    pub fn load(&mut self, units: Vec<Unit>) {
        self.units = units;
        if let Some(id) = self.editing {
            if self.unit(id).is_none() {
                self.editing = None;
            }
        }
    }

    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    /// # Errors
    ///
    /// Returns `StateError::UnitNotFound` if no unit has this id.
    pub fn require(&self, id: UnitId) -> Result<&Unit, StateError> {
        self.unit(id).ok_or(StateError::UnitNotFound(id))
    }

    /// Insert a new unit in front, or replace the loaded unit with the same id.
    pub fn upsert(&mut self, unit: Unit) {
        match self.units.iter_mut().find(|u| u.id() == unit.id()) {
            Some(slot) => *slot = unit,
            None => self.units.insert(0, unit),
        }
    }

    /// # Errors
    ///
    /// Returns `StateError::UnitNotFound` if no unit has this id.
    pub fn remove(&mut self, id: UnitId) -> Result<Unit, StateError> {
        let pos = self
            .units
            .iter()
            .position(|u| u.id() == id)
            .ok_or(StateError::UnitNotFound(id))?;
        if self.editing == Some(id) {
            self.editing = None;
        }
        Ok(self.units.remove(pos))
    }

    //
    // ─── EDIT FORM ─────────────────────────────────────────────────────────────
    //

    /// Open the add form: clears any edit target and returns a blank draft
    /// with one empty topic line.
    pub fn begin_add(&mut self) -> UnitDraft {
        self.editing = None;
        UnitDraft::new("", "", [""])
    }

    /// Open the edit form for `id`, returning its current values.
    ///
    /// # Errors
    ///
    /// Returns `StateError::UnitNotFound` if no unit has this id.
    pub fn begin_edit(&mut self, id: UnitId) -> Result<UnitDraft, StateError> {
        let draft = self.require(id)?.to_draft();
        self.editing = Some(id);
        Ok(draft)
    }

    pub fn close_form(&mut self) {
        self.editing = None;
    }

    /// Unit currently open in the edit form; `None` means add mode.
    #[must_use]
    pub fn editing(&self) -> Option<UnitId> {
        self.editing
    }

    //
    // ─── VIEW ──────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn filter(&self) -> &UnitFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: UnitFilter) {
        self.filter = filter;
    }

    #[must_use]
    pub fn visible(&self) -> Vec<&Unit> {
        self.filter.apply(&self.units).collect()
    }

    /// Summary over the visible units only.
    #[must_use]
    pub fn summary(&self) -> Summary {
        progress::compute_summary(self.filter.apply(&self.units))
    }

    /// Summary over every loaded unit, ignoring the filter.
    #[must_use]
    pub fn overall_summary(&self) -> Summary {
        progress::compute_summary(&self.units)
    }

    #[must_use]
    pub fn subjects(&self) -> Vec<&str> {
        progress::subjects(&self.units)
    }
}
