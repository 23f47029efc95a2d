use std::sync::Arc;

use storage::repository::{NewUnitRecord, UnitRepository};
use tracker_core::model::{UnitDraft, UnitId};
use tracker_core::state::TrackerState;

use crate::Clock;
use crate::error::TrackerError;

/// A user action against the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleTopic { unit_id: UnitId, topic_index: usize },
    CreateUnit(UnitDraft),
    EditUnit { unit_id: UnitId, draft: UnitDraft },
    DeleteUnit(UnitId),
}

/// What a successful [`Command`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    TopicToggled {
        unit_id: UnitId,
        topic_index: usize,
        done: bool,
        covered: u8,
    },
    UnitCreated(UnitId),
    UnitEdited(UnitId),
    UnitDeleted(UnitId),
}

/// Applies user actions to the repository and then to the in-memory state.
///
/// Every write goes to storage first. The state only changes once the write
/// succeeded, so a failed command leaves both sides as they were.
#[derive(Clone)]
pub struct TrackerService {
    clock: Clock,
    units: Arc<dyn UnitRepository>,
}

impl TrackerService {
    #[must_use]
    pub fn new(clock: Clock, units: Arc<dyn UnitRepository>) -> Self {
        Self { clock, units }
    }

    /// Reload every unit from storage into `state`.
    ///
    /// Returns the number of units loaded.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the units cannot be listed.
    pub async fn refresh(&self, state: &mut TrackerState) -> Result<usize, TrackerError> {
        let units = self.units.list_units().await?;
        let count = units.len();
        state.load(units);
        tracing::debug!(count, "units loaded");
        Ok(count)
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    pub async fn dispatch(
        &self,
        state: &mut TrackerState,
        command: Command,
    ) -> Result<CommandOutcome, TrackerError> {
        match command {
            Command::ToggleTopic {
                unit_id,
                topic_index,
            } => {
                let done = self.toggle_topic(state, unit_id, topic_index).await?;
                let covered = state.require(unit_id)?.covered();
                Ok(CommandOutcome::TopicToggled {
                    unit_id,
                    topic_index,
                    done,
                    covered,
                })
            }
            Command::CreateUnit(draft) => {
                let id = self.create_unit(state, draft).await?;
                Ok(CommandOutcome::UnitCreated(id))
            }
            Command::EditUnit { unit_id, draft } => {
                self.edit_unit(state, unit_id, draft).await?;
                Ok(CommandOutcome::UnitEdited(unit_id))
            }
            Command::DeleteUnit(unit_id) => {
                self.delete_unit(state, unit_id).await?;
                Ok(CommandOutcome::UnitDeleted(unit_id))
            }
        }
    }

    /// Flip one topic and persist the new progress. Returns the topic's new flag.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::State` if the unit is not loaded.
    /// Returns `TrackerError::Unit` if `topic_index` is out of range.
    /// Returns `TrackerError::Storage` if persistence fails.
    pub async fn toggle_topic(
        &self,
        state: &mut TrackerState,
        unit_id: UnitId,
        topic_index: usize,
    ) -> Result<bool, TrackerError> {
        let mut unit = state.require(unit_id)?.clone();
        let done = unit.toggle_topic(topic_index)?;

        if let Err(err) = self.units.update_progress(&unit).await {
            tracing::warn!(unit_id = %unit_id, error = %err, "progress write failed");
            return Err(err.into());
        }

        tracing::info!(
            unit_id = %unit_id,
            topic_index,
            done,
            covered = unit.covered(),
            "topic toggled"
        );
        state.upsert(unit);
        Ok(done)
    }

    /// Validate and store a new unit, placing it at the front of `state`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Unit` if the draft is invalid.
    /// Returns `TrackerError::Storage` if persistence fails.
    pub async fn create_unit(
        &self,
        state: &mut TrackerState,
        draft: UnitDraft,
    ) -> Result<UnitId, TrackerError> {
        let validated = draft.validate(self.clock.now())?;
        let id = self
            .units
            .insert_new_unit(NewUnitRecord::from_validated(&validated))
            .await?;

        let unit = validated.assign_id(id);
        tracing::info!(
            unit_id = %id,
            subject = unit.subject(),
            topics = unit.topics().len(),
            "unit created"
        );
        state.upsert(unit);
        state.close_form();
        Ok(id)
    }

    /// Replace a unit's subject, name and topics, keeping progress on topics
    /// whose name survives.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::State` if the unit is not loaded.
    /// Returns `TrackerError::Unit` if the draft is invalid.
    /// Returns `TrackerError::Storage` if persistence fails.
    pub async fn edit_unit(
        &self,
        state: &mut TrackerState,
        unit_id: UnitId,
        draft: UnitDraft,
    ) -> Result<(), TrackerError> {
        let mut unit = state.require(unit_id)?.clone();
        unit.apply_edit(draft, self.clock.now())?;
        self.units.update_unit(&unit).await?;

        tracing::info!(unit_id = %unit_id, covered = unit.covered(), "unit edited");
        state.upsert(unit);
        if state.editing() == Some(unit_id) {
            state.close_form();
        }
        Ok(())
    }

    /// Delete a unit from storage and from `state`.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Storage` if the unit does not exist or the
    /// delete fails.
    pub async fn delete_unit(
        &self,
        state: &mut TrackerState,
        unit_id: UnitId,
    ) -> Result<(), TrackerError> {
        self.units.delete_unit(unit_id).await?;
        if state.remove(unit_id).is_err() {
            tracing::debug!(unit_id = %unit_id, "deleted unit was not loaded");
        }
        tracing::info!(unit_id = %unit_id, "unit deleted");
        Ok(())
    }
}
