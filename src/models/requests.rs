//! Request and response bodies of the card API.
//!
//! Amounts are always integers in the card currency's minor unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{
    identifiers::{CardNumber, TransactionId},
    prepaid_card::PrepaidCard,
    status::{CardStatus, TransactionStatus},
    transaction::Transaction,
};

/// Request body for emitting a card.
///
/// # JSON Example
///
/// ```json
/// { "currency": "GBP" }
/// ```
///
/// `currency` is optional; the configured default is used when absent.
#[derive(Debug, Default, Deserialize)]
pub struct EmitCardRequest {
    pub currency: Option<String>,
}

/// Request body naming a card only (lock, unlock).
#[derive(Debug, Deserialize)]
pub struct CardNumberRequest {
    pub card_number: u32,
}

/// Request body for loading funds.
///
/// # JSON Example
///
/// ```json
/// { "card_number": 123456, "amount": 10000 }
/// ```
#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub card_number: u32,
    pub amount: i64,
}

/// Request body for an authorization hold.
///
/// # JSON Example
///
/// ```json
/// {
///   "card_number": 123456,
///   "merchant": "Coffee shop",
///   "amount": 350,
///   "date": "2018-01-01"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub card_number: u32,
    pub merchant: String,
    pub amount: i64,
    pub date: String,
}

/// Request body for capture, reverse and refund.
///
/// # JSON Example
///
/// ```json
/// {
///   "card_number": 123456,
///   "transaction_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount": 350
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct SettlementRequest {
    pub card_number: u32,
    pub transaction_id: String,
    pub amount: i64,
}

/// Balance view of a card.
///
/// # JSON Example
///
/// ```json
/// {
///   "card_number": 123456,
///   "currency": "GBP",
///   "status": "active",
///   "balance": 10000,
///   "available_balance": 6500,
///   "summary": "Balance: GBP 100.00 Available balance: GBP 65.00"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct CardResponse {
    pub card_number: CardNumber,
    pub currency: String,
    pub status: CardStatus,
    pub balance: i64,
    pub available_balance: i64,
    pub summary: String,
}

impl From<&PrepaidCard> for CardResponse {
    fn from(card: &PrepaidCard) -> Self {
        Self {
            card_number: card.number(),
            currency: card.currency().to_string(),
            status: card.status(),
            balance: card.balance(),
            available_balance: card.available_balance(),
            summary: card.balance_summary(),
        }
    }
}

/// Response for deposits.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepositResponse {
    pub card_number: CardNumber,
    pub amount: i64,
}

/// Response for lock and unlock.
#[derive(Debug, Serialize, Deserialize)]
pub struct CardStatusResponse {
    pub card_number: CardNumber,
    pub status: CardStatus,
}

/// Response for an accepted authorization.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub card_number: CardNumber,
    pub merchant: String,
    pub transaction_amount: i64,
    pub transaction_id: TransactionId,
}

/// Response for capture, reverse and refund.
#[derive(Debug, Serialize, Deserialize)]
pub struct SettlementResponse {
    pub card_number: CardNumber,
    pub transaction_id: TransactionId,
    pub transaction_amount: i64,
}

/// One transaction as listed for a card.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub merchant: String,
    pub authorized_amount: i64,
    pub captured_amount: i64,
    pub currency: String,
    pub date: NaiveDateTime,
    pub status: TransactionStatus,
}

impl From<&Transaction> for TransactionResponse {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id(),
            merchant: transaction.merchant().to_string(),
            authorized_amount: transaction.authorized_amount().amount(),
            captured_amount: transaction.captured_amount().amount(),
            currency: transaction.authorized_amount().currency().to_string(),
            date: transaction.date(),
            status: transaction.status(),
        }
    }
}
