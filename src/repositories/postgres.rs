//! PostgreSQL card repository.
//!
//! A card is stored across two tables (see `migrations/`):
//!
//! - `prepaid_cards`: one row per card, with the optimistic `version`
//! - `card_transactions`: one row per authorization hold
//!
//! `save` writes both inside a single database transaction, so either the
//! whole aggregate lands or nothing does.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
    db::DbPool,
    models::{
        CardNumber, CardStatus, Currency, Money, PrepaidCard, Transaction, TransactionId,
        TransactionStatus,
    },
    repositories::{CardRepository, RepositoryError},
};

/// Row of the `prepaid_cards` table.
#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    card_number: i64,
    status: String,
    balance: i64,
    available_balance: i64,
    currency: String,
    version: i64,
}

/// Row of the `card_transactions` table.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    merchant: String,
    authorized_amount: i64,
    captured_amount: i64,
    currency: String,
    transaction_date: NaiveDateTime,
    status: String,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction, RepositoryError> {
        let currency = Currency::new(&self.currency).map_err(corrupt)?;
        let status = self
            .status
            .parse::<TransactionStatus>()
            .map_err(corrupt)?;

        Transaction::restore(
            TransactionId::from_uuid(self.id),
            self.merchant,
            Money::new(self.authorized_amount, currency.clone()).map_err(corrupt)?,
            Money::new(self.captured_amount, currency).map_err(corrupt)?,
            self.transaction_date,
            status,
        )
        .map_err(corrupt)
    }
}

fn corrupt(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Corrupt(error.to_string())
}

/// sqlx-backed implementation of [`CardRepository`].
#[derive(Debug, Clone)]
pub struct PostgresCardRepository {
    pool: DbPool,
}

impl PostgresCardRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardRepository for PostgresCardRepository {
    async fn save(&self, card: &PrepaidCard) -> Result<(), RepositoryError> {
        let card_number = i64::from(card.number().value());
        let expected_version = i64::try_from(card.version()).map_err(corrupt)?;

        let mut tx = self.pool.begin().await?;

        // Version 0 means the card has never been stored: insert it, and let
        // the primary key reject a number that is already taken.
        let written = if card.version() == 0 {
            sqlx::query(
                r#"
                INSERT INTO prepaid_cards (
                    card_number,
                    status,
                    balance,
                    available_balance,
                    currency,
                    version
                )
                VALUES ($1, $2, $3, $4, $5, 1)
                ON CONFLICT (card_number) DO NOTHING
                "#,
            )
            .bind(card_number)
            .bind(card.status().as_str())
            .bind(card.balance())
            .bind(card.available_balance())
            .bind(card.currency().code())
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                r#"
                UPDATE prepaid_cards
                SET status = $2,
                    balance = $3,
                    available_balance = $4,
                    version = version + 1,
                    updated_at = NOW()
                WHERE card_number = $1 AND version = $5
                "#,
            )
            .bind(card_number)
            .bind(card.status().as_str())
            .bind(card.balance())
            .bind(card.available_balance())
            .bind(expected_version)
            .execute(&mut *tx)
            .await?
            .rows_affected()
        };

        if written == 0 {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT version FROM prepaid_cards WHERE card_number = $1")
                    .bind(card_number)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return Err(RepositoryError::VersionConflict {
                number: card.number(),
                expected: card.version(),
                found: found.map_or(0, |v| v.max(0) as u64),
            });
        }

        for transaction in card.transactions() {
            sqlx::query(
                r#"
                INSERT INTO card_transactions (
                    id,
                    card_number,
                    merchant,
                    authorized_amount,
                    captured_amount,
                    currency,
                    transaction_date,
                    status
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE
                SET authorized_amount = EXCLUDED.authorized_amount,
                    captured_amount = EXCLUDED.captured_amount,
                    status = EXCLUDED.status
                "#,
            )
            .bind(transaction.id().as_uuid())
            .bind(card_number)
            .bind(transaction.merchant())
            .bind(transaction.authorized_amount().amount())
            .bind(transaction.captured_amount().amount())
            .bind(transaction.authorized_amount().currency().code())
            .bind(transaction.date())
            .bind(transaction.status().as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(card_number = %card.number(), "Card saved");
        Ok(())
    }

    async fn get_by_number(&self, number: CardNumber) -> Result<PrepaidCard, RepositoryError> {
        let card_number = i64::from(number.value());

        let row = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT card_number, status, balance, available_balance, currency, version
            FROM prepaid_cards
            WHERE card_number = $1
            "#,
        )
        .bind(card_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound(number))?;

        let transactions = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, merchant, authorized_amount, captured_amount, currency, transaction_date, status
            FROM card_transactions
            WHERE card_number = $1
            ORDER BY transaction_date
            "#,
        )
        .bind(card_number)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TransactionRow::into_transaction)
        .collect::<Result<Vec<_>, _>>()?;

        let currency = Currency::new(&row.currency).map_err(corrupt)?;
        let stored_number = u32::try_from(row.card_number).map_err(corrupt)?;
        let version = u64::try_from(row.version).map_err(corrupt)?;

        PrepaidCard::restore(
            CardNumber::from_u32(stored_number),
            row.status.parse::<CardStatus>().map_err(corrupt)?,
            Money::new(row.balance, currency.clone()).map_err(corrupt)?,
            Money::new(row.available_balance, currency.clone()).map_err(corrupt)?,
            currency,
            transactions,
            version,
        )
        .map_err(corrupt)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
