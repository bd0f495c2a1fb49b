//! Card service - use cases over the prepaid card aggregate.
//!
//! Every operation follows the same sequence:
//!
//! 1. Turn primitive arguments into domain values
//! 2. Load the card from the repository
//! 3. Apply exactly one card operation
//! 4. Save the card
//!
//! If step 3 fails nothing is saved, so the stored card is unchanged. If the
//! card was saved by someone else between steps 2 and 4, the repository
//! rejects the save with a version conflict and the caller gets
//! `ConcurrentModification`. No step is retried automatically.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    error::AppError,
    models::{CardNumber, Currency, Money, PrepaidCard, Transaction, TransactionId},
    repositories::{CardRepository, RepositoryError},
};

/// How many card numbers to draw before giving up on emission.
const MAX_EMIT_ATTEMPTS: usize = 5;

/// Orchestrates card operations over a [`CardRepository`].
#[derive(Clone)]
pub struct CardService {
    repository: Arc<dyn CardRepository>,
}

impl CardService {
    pub fn new(repository: Arc<dyn CardRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &dyn CardRepository {
        self.repository.as_ref()
    }

    /// Issue a new card in `currency` and store it.
    ///
    /// Card numbers are drawn at random; a number already in use is
    /// reported by the repository as a conflict and a new one is drawn.
    ///
    /// # Errors
    ///
    /// - `Domain(InvalidCurrency)`: `currency` is not a three letter code
    /// - `ConcurrentModification`: no free number found after several draws
    pub async fn emit_card(&self, currency: &str) -> Result<PrepaidCard, AppError> {
        let currency = Currency::new(currency)?;

        let mut last_error = None;
        for _ in 0..MAX_EMIT_ATTEMPTS {
            let mut card = PrepaidCard::emit(currency.clone());
            match self.repository.save(&card).await {
                Ok(()) => {
                    card.mark_persisted(1);
                    tracing::info!(card_number = %card.number(), currency = %currency, "Card emitted");
                    return Ok(card);
                }
                Err(error @ RepositoryError::VersionConflict { .. }) => {
                    tracing::debug!(card_number = %card.number(), "Card number taken, drawing again");
                    last_error = Some(error);
                }
                Err(error) => return Err(error.into()),
            }
        }

        tracing::warn!("Could not find a free card number");
        Err(last_error
            .map(AppError::from)
            .unwrap_or_else(|| AppError::InvalidRequest("Card emission failed".to_string())))
    }

    pub async fn lock_card(&self, number: u32) -> Result<(), AppError> {
        self.apply(CardNumber::from_u32(number), "lock", |card| {
            card.lock().map_err(AppError::from)
        })
        .await
    }

    pub async fn unlock_card(&self, number: u32) -> Result<(), AppError> {
        self.apply(CardNumber::from_u32(number), "unlock", |card| {
            card.unlock().map_err(AppError::from)
        })
        .await
    }

    /// Load a card for display. Nothing is saved.
    pub async fn display_balance(&self, number: u32) -> Result<PrepaidCard, AppError> {
        let card = self
            .repository
            .get_by_number(CardNumber::from_u32(number))
            .await?;
        Ok(card)
    }

    /// Transactions of a card, oldest first.
    pub async fn list_transactions(&self, number: u32) -> Result<Vec<Transaction>, AppError> {
        let card = self.display_balance(number).await?;
        let mut transactions: Vec<Transaction> = card.transactions().cloned().collect();
        transactions.sort_by_key(|transaction| transaction.date());
        Ok(transactions)
    }

    /// Load `amount` minor units onto the card.
    pub async fn make_deposit(&self, number: u32, amount: i64) -> Result<(), AppError> {
        self.apply(CardNumber::from_u32(number), "deposit", |card| {
            let money = Money::new(amount, card.currency().clone())?;
            card.load(&money)?;
            Ok(())
        })
        .await
    }

    /// Place an authorization hold and return the new transaction's id.
    ///
    /// `date` accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`
    /// or a plain `YYYY-MM-DD` (taken as midnight).
    pub async fn make_authorization_request(
        &self,
        merchant: &str,
        number: u32,
        amount: i64,
        date: &str,
    ) -> Result<TransactionId, AppError> {
        let date = parse_date(date)?;
        self.apply(CardNumber::from_u32(number), "authorization", |card| {
            let money = Money::new(amount, card.currency().clone())?;
            Ok(card.authorization_request(merchant, money, date)?)
        })
        .await
    }

    pub async fn make_capture(
        &self,
        number: u32,
        transaction_id: &str,
        amount: i64,
    ) -> Result<(), AppError> {
        let id = parse_transaction_id(transaction_id)?;
        self.apply(CardNumber::from_u32(number), "capture", |card| {
            let money = Money::new(amount, card.currency().clone())?;
            Ok(card.capture(id, &money)?)
        })
        .await
    }

    pub async fn make_reverse(
        &self,
        number: u32,
        transaction_id: &str,
        amount: i64,
    ) -> Result<(), AppError> {
        let id = parse_transaction_id(transaction_id)?;
        self.apply(CardNumber::from_u32(number), "reverse", |card| {
            let money = Money::new(amount, card.currency().clone())?;
            Ok(card.reverse(id, &money)?)
        })
        .await
    }

    pub async fn make_refund(
        &self,
        number: u32,
        transaction_id: &str,
        amount: i64,
    ) -> Result<(), AppError> {
        let id = parse_transaction_id(transaction_id)?;
        self.apply(CardNumber::from_u32(number), "refund", |card| {
            let money = Money::new(amount, card.currency().clone())?;
            Ok(card.refund(id, &money)?)
        })
        .await
    }

    /// Load the card, run `operation` on it, and save it if it succeeded.
    async fn apply<T>(
        &self,
        number: CardNumber,
        name: &'static str,
        operation: impl FnOnce(&mut PrepaidCard) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut card = self.repository.get_by_number(number).await?;

        let outcome = match operation(&mut card) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(card_number = %number, operation = name, "Card operation rejected: {}", error);
                return Err(error);
            }
        };

        self.repository.save(&card).await?;

        tracing::info!(
            card_number = %number,
            operation = name,
            balance = card.balance(),
            available_balance = card.available_balance(),
            "Card operation applied"
        );
        Ok(outcome)
    }
}

fn parse_transaction_id(transaction_id: &str) -> Result<TransactionId, AppError> {
    transaction_id
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidRequest(format!("Invalid transaction id: {transaction_id}")))
}

/// Parse a calendar timestamp. Offsets are dropped: the wall-clock time as
/// written is what gets stored.
fn parse_date(date: &str) -> Result<NaiveDateTime, AppError> {
    let date = date.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(date) {
        return Ok(timestamp.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(date, format) {
            return Ok(timestamp);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }

    Err(AppError::InvalidRequest(format!("Invalid date: {date}")))
}
