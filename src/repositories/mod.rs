//! Card persistence.
//!
//! The service talks to storage only through [`CardRepository`]. Two
//! implementations ship with the crate:
//!
//! - [`memory::InMemoryCardRepository`]: process-local, used by default and
//!   in tests
//! - [`postgres::PostgresCardRepository`]: PostgreSQL through sqlx
//!
//! # Optimistic concurrency
//!
//! A card remembers the version it was loaded at. `save` only succeeds when
//! the stored version still matches, then bumps it. A writer holding a stale
//! copy gets `VersionConflict` instead of overwriting someone else's update.
//! A card that was never saved has version 0, which means "must not exist".

use async_trait::async_trait;

use crate::models::{CardNumber, PrepaidCard};

pub mod memory;
pub mod postgres;

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No card stored under this number.
    #[error("Card {0} not found")]
    NotFound(CardNumber),

    /// The stored card changed since this copy was loaded, or a new card
    /// reused a taken number.
    #[error("Card {number} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        number: CardNumber,
        expected: u64,
        found: u64,
    },

    /// Underlying database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a valid card.
    #[error("Stored card is corrupt: {0}")]
    Corrupt(String),
}

/// Load and store prepaid card aggregates.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Persist the whole card, transactions included.
    ///
    /// # Errors
    ///
    /// - `VersionConflict`: the stored version is not `card.version()`
    /// - `Database`: storage failure
    async fn save(&self, card: &PrepaidCard) -> Result<(), RepositoryError>;

    /// Load a card by number.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no such card
    /// - `Corrupt`: the stored data breaks a domain invariant
    async fn get_by_number(&self, number: CardNumber) -> Result<PrepaidCard, RepositoryError>;

    /// Connectivity check used by the health endpoint.
    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    /// Short backend name reported by the health endpoint.
    fn backend_name(&self) -> &'static str;
}
