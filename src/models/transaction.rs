//! Authorization holds and their settlement.
//!
//! A `Transaction` is created by a card when it accepts an authorization
//! request. From then on the hold can be:
//!
//! - captured, in one go or in several partial captures
//! - reversed, which shrinks the authorized amount for good
//! - refunded, which gives back captured money
//!
//! `captured_amount <= authorized_amount` holds after every call, and the
//! outstanding hold is always `authorized_amount - captured_amount`. A refund
//! lowers both amounts together, so refunded money never becomes capturable
//! again. Captured is terminal.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{
    error::{DomainError, TransactionFailure},
    identifiers::TransactionId,
    money::Money,
    status::TransactionStatus,
};

/// One authorization hold on a prepaid card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    id: TransactionId,
    merchant: String,
    authorized_amount: Money,
    captured_amount: Money,
    date: NaiveDateTime,
    status: TransactionStatus,
}

impl Transaction {
    /// Open a pending hold with nothing captured yet.
    pub fn new(merchant: impl Into<String>, amount: Money, date: NaiveDateTime) -> Self {
        let captured_amount = Money::zero(amount.currency().clone());
        Self {
            id: TransactionId::new(),
            merchant: merchant.into(),
            authorized_amount: amount,
            captured_amount,
            date,
            status: TransactionStatus::pending(),
        }
    }

    /// Rebuild a transaction from storage.
    ///
    /// # Errors
    ///
    /// - `CorruptState`: the two amounts disagree on currency, or more is
    ///   captured than authorized
    pub fn restore(
        id: TransactionId,
        merchant: String,
        authorized_amount: Money,
        captured_amount: Money,
        date: NaiveDateTime,
        status: TransactionStatus,
    ) -> Result<Self, DomainError> {
        let over_captured = captured_amount
            .is_more_than(&authorized_amount)
            .map_err(|e| DomainError::CorruptState(format!("transaction {id}: {e}")))?;
        if over_captured {
            return Err(DomainError::CorruptState(format!(
                "transaction {id}: captured {captured_amount} exceeds authorized {authorized_amount}"
            )));
        }
        Ok(Self {
            id,
            merchant,
            authorized_amount,
            captured_amount,
            date,
            status,
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn merchant(&self) -> &str {
        &self.merchant
    }

    pub fn authorized_amount(&self) -> &Money {
        &self.authorized_amount
    }

    pub fn captured_amount(&self) -> &Money {
        &self.captured_amount
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_captured(&self) -> bool {
        self.status.is_captured()
    }

    /// Portion of the hold that is neither captured nor reversed.
    pub fn remaining(&self) -> Result<Money, DomainError> {
        self.authorized_amount.deduct(&self.captured_amount)
    }

    pub fn authorize(&mut self) {
        self.status = TransactionStatus::authorized();
    }

    pub fn decline(&mut self) {
        self.status = TransactionStatus::declined();
    }

    /// Settle part or all of the remaining hold. Fails `InsufficientFunds`
    /// once the transaction is Captured.
    pub fn capture(&mut self, money: &Money) -> Result<(), DomainError> {
        if self.is_captured() || self.remaining()?.is_less_than(money)? {
            return Err(DomainError::InsufficientFunds);
        }

        let captured = self.captured_amount.add(money)?;
        if self.authorized_amount.is_equal(&captured)? {
            self.status = TransactionStatus::captured();
        }
        self.captured_amount = captured;
        Ok(())
    }

    /// Release part of the uncaptured hold.
    pub fn reverse(&mut self, money: &Money) -> Result<(), DomainError> {
        if self.remaining()?.is_less_than(money)? {
            return Err(DomainError::Transaction(TransactionFailure::Captured));
        }

        self.authorized_amount = self.authorized_amount.deduct(money)?;
        Ok(())
    }

    /// Give back previously captured money.
    ///
    /// The refunded part leaves the authorized amount too, so the
    /// outstanding hold stays where it was.
    pub fn refund(&mut self, money: &Money) -> Result<(), DomainError> {
        if self.captured_amount.is_less_than(money)? {
            return Err(DomainError::Transaction(TransactionFailure::CannotRefund));
        }

        let captured_amount = self.captured_amount.deduct(money)?;
        let authorized_amount = self.authorized_amount.deduct(money)?;

        self.captured_amount = captured_amount;
        self.authorized_amount = authorized_amount;
        Ok(())
    }
}
