//! Domain model: money, statuses, transactions and the prepaid card
//! aggregate, plus the request/response bodies of the HTTP API.

/// Domain error kinds
pub mod error;
/// Card numbers and transaction ids
pub mod identifiers;
/// Currency-safe integer amounts
pub mod money;
/// Prepaid card aggregate root
pub mod prepaid_card;
/// API request and response bodies
pub mod requests;
/// Card and transaction status tags
pub mod status;
/// Authorization holds
pub mod transaction;

pub use error::{DomainError, TransactionFailure};
pub use identifiers::{CardNumber, TransactionId};
pub use money::{Currency, Money};
pub use prepaid_card::PrepaidCard;
pub use status::{CardStatus, TransactionStatus};
pub use transaction::Transaction;
