//! Persistence collaborator interface.

use std::error::Error as StdError;

use specter_defence_core::ProgressSnapshot;
use thiserror::Error;

/// Receives progress whenever a stage advances, a guardian is promoted or the run ends.
pub trait ProgressStore {
    /// Persists the latest progress snapshot.
    fn save(&mut self, progress: &ProgressSnapshot) -> Result<(), StoreError>;
}

/// Failure reported by a [`ProgressStore`]; the simulation logs it and keeps running.
#[derive(Debug, Error)]
#[error("failed to persist progress: {source}")]
pub struct StoreError {
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl StoreError {
    /// Wraps the backend failure.
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}
