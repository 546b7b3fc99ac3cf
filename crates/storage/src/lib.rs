#![forbid(unsafe_code)]

pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{InMemorySlotRepository, SlotRepository, Storage, StorageError};
pub use snapshot::{STATE_SLOT_KEY, StateSnapshotStore};
