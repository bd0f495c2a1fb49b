//! In-memory card repository.
//!
//! Cards are cloned in and out of a shared map, so callers never hold a
//! reference into storage. Data is lost when the process exits.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    models::{CardNumber, PrepaidCard},
    repositories::{CardRepository, RepositoryError},
};

/// Thread-safe map of card number to card.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCardRepository {
    cards: Arc<RwLock<HashMap<CardNumber, PrepaidCard>>>,
}

impl InMemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards.
    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn save(&self, card: &PrepaidCard) -> Result<(), RepositoryError> {
        let mut cards = self.cards.write().await;

        let stored_version = cards.get(&card.number()).map_or(0, PrepaidCard::version);
        if stored_version != card.version() {
            return Err(RepositoryError::VersionConflict {
                number: card.number(),
                expected: card.version(),
                found: stored_version,
            });
        }

        let mut stored = card.clone();
        stored.mark_persisted(stored_version + 1);
        cards.insert(card.number(), stored);
        Ok(())
    }

    async fn get_by_number(&self, number: CardNumber) -> Result<PrepaidCard, RepositoryError> {
        self.cards
            .read()
            .await
            .get(&number)
            .cloned()
            .ok_or(RepositoryError::NotFound(number))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
