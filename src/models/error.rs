//! Business rule violations raised by the card domain.
//!
//! Every fallible operation on `Money`, `Transaction` and `PrepaidCard`
//! returns one of these. They are raised at the point of violation and the
//! operation that raised them leaves its receiver untouched.

use std::fmt;

use crate::models::money::Currency;

/// Error kinds raised by the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Money was constructed (or derived) with an amount below zero.
    #[error("You can't have negative funds")]
    NegativeAmount,

    /// Arithmetic or comparison across two different currencies.
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    /// Currency code is not three ASCII letters.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// An addition would not fit in the minor-unit range.
    #[error("Amount overflow")]
    AmountOverflow,

    /// Operation forbidden on a locked card, or a lock/unlock that would not
    /// change the card's state.
    #[error("The card is locked")]
    CardLocked,

    /// Requested amount exceeds the available funds or the uncaptured hold.
    #[error("The card has insufficient funds")]
    InsufficientFunds,

    /// Transaction lookup or settlement failure.
    #[error("Transaction error: {0}")]
    Transaction(TransactionFailure),

    /// Stored state that no sequence of operations could have produced.
    #[error("Inconsistent card state: {0}")]
    CorruptState(String),
}

/// Reason attached to [`DomainError::Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionFailure {
    /// No transaction with the given id exists on the card.
    NotFound,
    /// Reverse requested on a captured hold, or for more than is uncaptured.
    Captured,
    /// Refund requested for more than has been captured.
    CannotRefund,
}

impl fmt::Display for TransactionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TransactionFailure::NotFound => "not found",
            TransactionFailure::Captured => "captured",
            TransactionFailure::CannotRefund => "cannot refund",
        };
        f.write_str(reason)
    }
}

impl DomainError {
    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NegativeAmount => "negative_amount",
            DomainError::CurrencyMismatch { .. } => "currency_mismatch",
            DomainError::InvalidCurrency(_) => "invalid_currency",
            DomainError::AmountOverflow => "amount_overflow",
            DomainError::CardLocked => "card_locked",
            DomainError::InsufficientFunds => "insufficient_funds",
            DomainError::Transaction(_) => "transaction_error",
            DomainError::CorruptState(_) => "corrupt_state",
        }
    }
}
