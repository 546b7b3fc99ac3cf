//! Whole-state snapshots mirrored into a single durable slot.

use std::sync::Arc;

use lesson_core::model::AppState;
use log::{debug, info, warn};

use crate::repository::{SlotRepository, StorageError};

/// Fixed key of the slot holding the serialized `AppState`.
pub const STATE_SLOT_KEY: &str = "codelearn_state";

/// Serializes `AppState` as JSON into one slot and restores it on startup.
#[derive(Clone)]
pub struct StateSnapshotStore {
    slots: Arc<dyn SlotRepository>,
    key: String,
}

impl StateSnapshotStore {
    #[must_use]
    pub fn new(slots: Arc<dyn SlotRepository>) -> Self {
        Self::with_key(slots, STATE_SLOT_KEY)
    }

    #[must_use]
    pub fn with_key(slots: Arc<dyn SlotRepository>, key: impl Into<String>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Restore the last saved state.
    ///
    /// An absent, unparsable, or inconsistent snapshot yields the default state;
    /// only backend failures are returned as errors.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read.
    pub async fn load(&self) -> Result<AppState, StorageError> {
        let Some(raw) = self.slots.read_slot(&self.key).await? else {
            info!("No saved state under '{}'; starting fresh", self.key);
            return Ok(AppState::default());
        };

        let state = match serde_json::from_str::<AppState>(&raw) {
            Ok(state) => state,
            Err(err) => {
                warn!("Discarding unparsable state in '{}': {err}", self.key);
                return Ok(AppState::default());
            }
        };

        if let Err(err) = state.check_consistency() {
            warn!("Discarding inconsistent state in '{}': {err}", self.key);
            return Ok(AppState::default());
        }

        info!(
            "Restored state: {} progress records, {} total XP",
            state.progress().len(),
            state.total_xp()
        );
        Ok(state)
    }

    /// Overwrite the slot with `state`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.slots.write_slot(&self.key, &raw).await?;
        debug!("Saved state to '{}' ({} bytes)", self.key, raw.len());
        Ok(())
    }

    /// Delete the slot entirely.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    pub async fn erase(&self) -> Result<(), StorageError> {
        self.slots.delete_slot(&self.key).await?;
        info!("Erased saved state '{}'", self.key);
        Ok(())
    }
}
